use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::grant::Grant;
use crate::permission::Permission;
use crate::resource::{Resource, ResourceKind};

/// The grant as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantPayload {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub permission: Permission,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&Grant> for GrantPayload {
    fn from(grant: &Grant) -> Self {
        let (file_id, folder_id) = match grant.resource.kind {
            ResourceKind::File => (Some(grant.resource.id), None),
            ResourceKind::Folder => (None, Some(grant.resource.id)),
        };
        Self {
            id: grant.id,
            file_id,
            folder_id,
            user_id: grant.principal_id(),
            email: grant.email().map(str::to_string),
            permission: grant.level,
            created_at: grant.created_at,
        }
    }
}

/// Just enough of a resource for a client to render a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub name: String,
    pub owner_id: Uuid,
    pub is_public: bool,
}

impl From<&Resource> for ResourceSummary {
    fn from(resource: &Resource) -> Self {
        Self {
            id: resource.id,
            kind: resource.kind,
            name: resource.name.clone(),
            owner_id: resource.owner_id,
            is_public: resource.is_public,
        }
    }
}

/// Events pushed over live connections. The serialized `event` names
///  are part of the client contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum LiveEvent {
    /// Sent to a recipient when a new grant reaches them
    #[serde(rename = "permission:granted")]
    PermissionGranted {
        #[serde(rename = "resourceRef")]
        resource_ref: ResourceSummary,
        permission: GrantPayload,
    },
    /// Sent to a recipient whose existing grant changed level
    #[serde(rename = "permission:updated")]
    PermissionUpdated { permission: GrantPayload },
    /// Sent to a recipient whose grant was removed
    #[serde(rename = "permission:revoked")]
    PermissionRevoked {
        #[serde(rename = "resourceId")]
        resource_id: Uuid,
        #[serde(rename = "resourceType")]
        resource_type: ResourceKind,
    },
    /// Sent to the owner after sharing one of their files
    #[serde(rename = "file:shared")]
    FileShared {
        file: ResourceSummary,
        #[serde(rename = "sharedWith")]
        shared_with: Uuid,
        permission: GrantPayload,
    },
    /// Sent to the owner after sharing one of their folders
    #[serde(rename = "folder:shared")]
    FolderShared {
        folder: ResourceSummary,
        #[serde(rename = "sharedWith")]
        shared_with: Uuid,
        permission: GrantPayload,
    },
}

impl LiveEvent {
    pub fn granted(resource: &Resource, grant: &Grant) -> Self {
        LiveEvent::PermissionGranted {
            resource_ref: resource.into(),
            permission: grant.into(),
        }
    }

    pub fn updated(grant: &Grant) -> Self {
        LiveEvent::PermissionUpdated {
            permission: grant.into(),
        }
    }

    pub fn revoked(grant: &Grant) -> Self {
        LiveEvent::PermissionRevoked {
            resource_id: grant.resource.id,
            resource_type: grant.resource.kind,
        }
    }

    pub fn shared(resource: &Resource, shared_with: Uuid, grant: &Grant) -> Self {
        match resource.kind {
            ResourceKind::File => LiveEvent::FileShared {
                file: resource.into(),
                shared_with,
                permission: grant.into(),
            },
            ResourceKind::Folder => LiveEvent::FolderShared {
                folder: resource.into(),
                shared_with,
                permission: grant.into(),
            },
        }
    }

    /// The wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            LiveEvent::PermissionGranted { .. } => "permission:granted",
            LiveEvent::PermissionUpdated { .. } => "permission:updated",
            LiveEvent::PermissionRevoked { .. } => "permission:revoked",
            LiveEvent::FileShared { .. } => "file:shared",
            LiveEvent::FolderShared { .. } => "folder:shared",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::Recipient;
    use serde_json::json;

    #[test]
    fn test_revoked_wire_shape() {
        let grant = Grant::new(
            crate::resource::ResourceRef::folder(Uuid::nil()),
            Recipient::Principal(Uuid::nil()),
            Permission::View,
        );
        let value = serde_json::to_value(LiveEvent::revoked(&grant)).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "permission:revoked",
                "data": {
                    "resourceId": Uuid::nil(),
                    "resourceType": "folder",
                }
            })
        );
    }

    #[test]
    fn test_granted_wire_shape() {
        let owner = Uuid::new_v4();
        let file = Resource::file(owner, "notes.md");
        let grant = Grant::new(
            file.reference(),
            Recipient::Email("x@example.com".to_string()),
            Permission::Edit,
        );
        let event = LiveEvent::granted(&file, &grant);
        assert_eq!(event.name(), "permission:granted");

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "permission:granted");
        assert_eq!(value["data"]["resourceRef"]["type"], "file");
        assert_eq!(value["data"]["resourceRef"]["name"], "notes.md");
        assert_eq!(value["data"]["permission"]["permission"], "edit");
        assert_eq!(value["data"]["permission"]["fileId"], json!(file.id));
        assert_eq!(value["data"]["permission"]["email"], "x@example.com");
        assert!(value["data"]["permission"].get("folderId").is_none());
        assert!(value["data"]["permission"].get("userId").is_none());
    }

    #[test]
    fn test_shared_event_follows_kind() {
        let owner = Uuid::new_v4();
        let folder = Resource::folder(owner, "photos");
        let grant = Grant::new(
            folder.reference(),
            Recipient::Principal(Uuid::new_v4()),
            Permission::View,
        );
        let event = LiveEvent::shared(&folder, Uuid::nil(), &grant);
        assert_eq!(event.name(), "folder:shared");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["data"]["folder"]["name"], "photos");
        assert_eq!(value["data"]["sharedWith"], json!(Uuid::nil()));
    }
}
