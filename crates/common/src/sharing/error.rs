use crate::public_link::PublicLinkError;
use crate::resource::StoreError;
use crate::tree::TreeError;

/// Why a sharing operation was refused or failed.
///
/// Notification failures never show up here: once the grant mutation
///  went through, the operation succeeded.
#[derive(Debug, thiserror::Error)]
pub enum SharingError {
    /// The request itself is malformed
    #[error("bad request: {0}")]
    BadRequest(String),
    /// A resource, grant or principal does not exist
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),
    /// The requester lacks authority for the mutation
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// A store call ran past its deadline; nothing after it was applied
    #[error("store call exceeded its deadline")]
    Timeout,
    #[error("store error: {0}")]
    Store(StoreError),
}

impl SharingError {
    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, SharingError::Timeout | SharingError::Store(_))
    }
}

impl From<StoreError> for SharingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, id } => SharingError::NotFound(entity, id),
            other => SharingError::Store(other),
        }
    }
}

impl From<TreeError> for SharingError {
    fn from(e: TreeError) -> Self {
        match e {
            TreeError::SelfParent(_) | TreeError::Cycle { .. } => {
                SharingError::BadRequest(e.to_string())
            }
            TreeError::NotFound(id) => SharingError::NotFound("folder", id.to_string()),
            TreeError::Forbidden => SharingError::Forbidden(e.to_string()),
            TreeError::Timeout => SharingError::Timeout,
            TreeError::Store(e) => e.into(),
        }
    }
}

impl From<PublicLinkError> for SharingError {
    fn from(e: PublicLinkError) -> Self {
        match e {
            PublicLinkError::NotFound { kind, token } => {
                SharingError::NotFound(kind.as_str(), format!("public link {}", token))
            }
            PublicLinkError::TokensExhausted => {
                SharingError::Store(StoreError::Provider(anyhow::anyhow!(e.to_string())))
            }
            PublicLinkError::Store(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceKind;
    use uuid::Uuid;

    #[test]
    fn test_cycle_is_a_bad_request() {
        let err: SharingError = TreeError::Cycle {
            folder: Uuid::new_v4(),
            parent: Uuid::new_v4(),
        }
        .into();
        assert!(matches!(err, SharingError::BadRequest(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_store_not_found_keeps_its_entity() {
        let err: SharingError = StoreError::not_found("grant", "g-1").into();
        assert!(matches!(err, SharingError::NotFound("grant", ref id) if id == "g-1"));
    }

    #[test]
    fn test_retryable() {
        assert!(SharingError::Timeout.is_retryable());
        assert!(SharingError::Store(StoreError::Provider(anyhow::anyhow!("disk"))).is_retryable());
        assert!(!SharingError::Forbidden("no".to_string()).is_retryable());
    }

    #[test]
    fn test_unresolved_link_names_the_token() {
        let err: SharingError = PublicLinkError::NotFound {
            kind: ResourceKind::Folder,
            token: "abc123".to_string(),
        }
        .into();
        assert!(matches!(err, SharingError::NotFound("folder", ref id) if id == "public link abc123"));
        assert_eq!(err.to_string(), "folder not found: public link abc123");
    }
}
