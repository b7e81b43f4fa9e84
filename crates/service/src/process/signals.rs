use std::future::Future;

use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::watch;

/// The OS stop requests the service reacts to
#[derive(Debug)]
pub struct StopSignals {
    interrupt: Signal,
    terminate: Signal,
}

impl StopSignals {
    /// Register both handlers. Must be called inside a tokio runtime.
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for the first stop request and name it
    pub async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}

/// Forward the first stop request onto the shutdown channel. Live
///  connections are closed by whoever holds the receiving end.
pub async fn relay_stop<F>(stop: F, shutdown: watch::Sender<()>)
where
    F: Future<Output = &'static str>,
{
    let signal = stop.await;
    tracing::info!(signal, "stop requested");
    if shutdown.send(()).is_err() {
        tracing::debug!("service already stopped");
    }
}

/// Log panics through tracing, then hand them to the previous hook
pub fn log_panics() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()));
        tracing::error!(
            location = location.as_deref().unwrap_or("unknown"),
            "panic: {}",
            info
        );
        previous(info);
    }));
}
