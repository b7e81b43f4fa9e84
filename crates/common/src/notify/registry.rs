use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::{LiveEvent, LiveNotifier, NotifyError};

/// Identifies one live connection of a principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// The receiving half handed to the transport for one connection.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub principal_id: Uuid,
    pub events: flume::Receiver<LiveEvent>,
}

/// Process-wide map of principal -> open live connections.
///
/// Created at process start and torn down with [`shutdown`](Self::shutdown).
///  Nothing is persisted; a principal with no entry simply misses live
///  events.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    connections: HashMap<Uuid, HashMap<ConnectionId, flume::Sender<LiveEvent>>>,
    next_id: u64,
    closed: bool,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection for an authenticated principal
    pub fn connect(&self, principal_id: Uuid) -> Result<Connection, NotifyError> {
        let mut inner = self.inner.write();
        if inner.closed {
            return Err(NotifyError::Closed);
        }

        let id = ConnectionId(inner.next_id);
        inner.next_id += 1;

        let (tx, rx) = flume::unbounded();
        inner
            .connections
            .entry(principal_id)
            .or_default()
            .insert(id, tx);

        tracing::debug!(principal = %principal_id, connection = %id, "live connection opened");
        Ok(Connection {
            id,
            principal_id,
            events: rx,
        })
    }

    /// Drop a connection. Returns whether it was registered.
    pub fn disconnect(&self, principal_id: Uuid, id: ConnectionId) -> bool {
        let mut inner = self.inner.write();
        let Some(sockets) = inner.connections.get_mut(&principal_id) else {
            return false;
        };
        let removed = sockets.remove(&id).is_some();
        if sockets.is_empty() {
            inner.connections.remove(&principal_id);
        }
        if removed {
            tracing::debug!(principal = %principal_id, connection = %id, "live connection closed");
        }
        removed
    }

    pub fn is_connected(&self, principal_id: Uuid) -> bool {
        self.connection_count(principal_id) > 0
    }

    pub fn connection_count(&self, principal_id: Uuid) -> usize {
        self.inner
            .read()
            .connections
            .get(&principal_id)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    /// Close every connection and refuse new ones
    pub fn shutdown(&self) {
        let mut inner = self.inner.write();
        inner.closed = true;
        let dropped: usize = inner.connections.values().map(HashMap::len).sum();
        inner.connections.clear();
        tracing::info!(connections = dropped, "connection registry shut down");
    }
}

impl LiveNotifier for ConnectionRegistry {
    fn notify(&self, principal_id: Uuid, event: LiveEvent) -> Result<usize, NotifyError> {
        let (delivered, dead) = {
            let inner = self.inner.read();
            if inner.closed {
                return Err(NotifyError::Closed);
            }
            let Some(sockets) = inner.connections.get(&principal_id) else {
                tracing::debug!(principal = %principal_id, event = event.name(), "principal offline, dropping live event");
                return Ok(0);
            };

            let mut delivered = 0;
            let mut dead = Vec::new();
            for (id, tx) in sockets {
                match tx.send(event.clone()) {
                    Ok(()) => delivered += 1,
                    Err(_) => dead.push(*id),
                }
            }
            (delivered, dead)
        };

        // receivers dropped without a disconnect
        for id in dead {
            self.disconnect(principal_id, id);
        }

        tracing::debug!(principal = %principal_id, event = event.name(), delivered, "live event dispatched");
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceKind;

    fn event() -> LiveEvent {
        LiveEvent::PermissionRevoked {
            resource_id: Uuid::new_v4(),
            resource_type: ResourceKind::File,
        }
    }

    #[test]
    fn test_fan_out_to_every_connection() {
        let registry = ConnectionRegistry::new();
        let bob = Uuid::new_v4();
        let laptop = registry.connect(bob).unwrap();
        let phone = registry.connect(bob).unwrap();
        assert_ne!(laptop.id, phone.id);
        assert_eq!(registry.connection_count(bob), 2);

        let sent = event();
        assert_eq!(registry.notify(bob, sent.clone()).unwrap(), 2);
        assert_eq!(laptop.events.try_recv().unwrap(), sent);
        assert_eq!(phone.events.try_recv().unwrap(), sent);
    }

    #[test]
    fn test_offline_principal_gets_nothing() {
        let registry = ConnectionRegistry::new();
        assert_eq!(registry.notify(Uuid::new_v4(), event()).unwrap(), 0);
    }

    #[test]
    fn test_disconnect() {
        let registry = ConnectionRegistry::new();
        let bob = Uuid::new_v4();
        let conn = registry.connect(bob).unwrap();

        assert!(registry.disconnect(bob, conn.id));
        assert!(!registry.disconnect(bob, conn.id));
        assert!(!registry.is_connected(bob));
        assert_eq!(registry.notify(bob, event()).unwrap(), 0);
    }

    #[test]
    fn test_dropped_receivers_are_pruned() {
        let registry = ConnectionRegistry::new();
        let bob = Uuid::new_v4();
        let kept = registry.connect(bob).unwrap();
        let dropped = registry.connect(bob).unwrap();
        drop(dropped);

        assert_eq!(registry.notify(bob, event()).unwrap(), 1);
        assert_eq!(registry.connection_count(bob), 1);
        assert!(kept.events.try_recv().is_ok());
    }

    #[test]
    fn test_shutdown() {
        let registry = ConnectionRegistry::new();
        let bob = Uuid::new_v4();
        let conn = registry.connect(bob).unwrap();

        registry.shutdown();

        assert!(!registry.is_connected(bob));
        assert!(conn.events.recv().is_err());
        assert!(matches!(registry.connect(bob), Err(NotifyError::Closed)));
        assert!(matches!(registry.notify(bob, event()), Err(NotifyError::Closed)));
    }

    #[tokio::test]
    async fn test_concurrent_connect_notify_disconnect() {
        let registry = ConnectionRegistry::new();
        let bob = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..50 {
                    let conn = registry.connect(bob).unwrap();
                    registry.notify(bob, event()).unwrap();
                    assert!(conn.events.try_recv().is_ok());
                    registry.disconnect(bob, conn.id);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.connection_count(bob), 0);
    }
}
