//! Public links
//!
//! Publishing a resource marks it public and gives it an opaque token. The
//! token is minted once and reused on every later publish, so a link handed
//! out stays valid. Resolution only succeeds while the resource is still
//! public.
//!
//! Tokens are 18 random bytes encoded as unpadded URL-safe base64, giving a
//! fixed 24-character string with 144 bits of entropy.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::Serialize;
use url::Url;

use crate::resource::{Resource, ResourceKind, ResourceRef, ResourceStore, StoreError};

/// Number of random bytes behind each token
pub const TOKEN_BYTES: usize = 18;
/// Length of an encoded token
pub const TOKEN_LEN: usize = 24;
/// Mint attempts before giving up on an (astronomically unlikely) collision
const MAX_MINT_ATTEMPTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum PublicLinkError {
    #[error("no public {kind} behind link '{token}'")]
    NotFound { kind: ResourceKind, token: String },
    #[error("could not mint an unused public link token")]
    TokensExhausted,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// A published resource's link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicLink {
    pub token: String,
    pub url: String,
    pub resource: ResourceRef,
    pub name: String,
}

/// Generate a fresh public link token
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `{base}/public/{token}?type={file|folder}`
pub fn public_url(base_url: &Url, token: &str, kind: ResourceKind) -> String {
    format!(
        "{}/public/{}?type={}",
        base_url.as_str().trim_end_matches('/'),
        token,
        kind
    )
}

#[derive(Debug, Clone)]
pub struct PublicLinkIssuer<R> {
    store: R,
    base_url: Url,
}

impl<R: ResourceStore> PublicLinkIssuer<R> {
    pub fn new(store: R, base_url: Url) -> Self {
        Self { store, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Make `resource` public, reusing its token if it already has one.
    ///
    /// `resource` may be stale. The returned link always carries the token
    ///  the store ended up holding, so concurrent first publishes hand out
    ///  the same link even though each of them minted a candidate.
    pub async fn publish(&self, resource: &Resource) -> Result<PublicLink, PublicLinkError> {
        let candidate = match &resource.public_link {
            Some(token) => token.clone(),
            None => self.mint(resource.kind).await?,
        };

        let published = self.store.set_public(resource.reference(), &candidate).await?;
        let token = published.public_link.clone().ok_or_else(|| {
            StoreError::Provider(anyhow::anyhow!(
                "{} was published without a link token",
                published.reference()
            ))
        })?;
        if token != candidate {
            tracing::debug!(resource = %published.reference(), "kept the token of a concurrent publish");
        }
        tracing::info!(resource = %published.reference(), "resource published");

        Ok(PublicLink {
            url: public_url(&self.base_url, &token, published.kind),
            token,
            resource: published.reference(),
            name: published.name,
        })
    }

    /// Find the public resource of `kind` behind `token`.
    ///
    /// A token whose resource has since stopped being public does not
    ///  resolve.
    pub async fn resolve(&self, token: &str, kind: ResourceKind) -> Result<Resource, PublicLinkError> {
        self.store
            .find_by_public_link(kind, token)
            .await?
            .filter(|resource| resource.is_public)
            .ok_or_else(|| PublicLinkError::NotFound {
                kind,
                token: token.to_string(),
            })
    }

    async fn mint(&self, kind: ResourceKind) -> Result<String, PublicLinkError> {
        for _ in 0..MAX_MINT_ATTEMPTS {
            let token = generate_token();
            if self.store.find_by_public_link(kind, &token).await?.is_none() {
                return Ok(token);
            }
            tracing::warn!(%kind, "public link token collision, retrying");
        }
        Err(PublicLinkError::TokensExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemoryResourceStore;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use uuid::Uuid;

    /// Suspends inside every call, the way an I/O-backed store would
    #[derive(Debug, Clone, Default)]
    struct YieldingStore {
        inner: MemoryResourceStore,
    }

    #[async_trait]
    impl ResourceStore for YieldingStore {
        async fn get(&self, reference: ResourceRef) -> Result<Option<Resource>, StoreError> {
            tokio::task::yield_now().await;
            self.inner.get(reference).await
        }

        async fn insert(&self, resource: Resource) -> Result<(), StoreError> {
            self.inner.insert(resource).await
        }

        async fn remove(&self, reference: ResourceRef) -> Result<Option<Resource>, StoreError> {
            self.inner.remove(reference).await
        }

        async fn set_parent(&self, folder_id: Uuid, parent_id: Option<Uuid>) -> Result<(), StoreError> {
            self.inner.set_parent(folder_id, parent_id).await
        }

        async fn set_public(&self, reference: ResourceRef, token: &str) -> Result<Resource, StoreError> {
            tokio::task::yield_now().await;
            self.inner.set_public(reference, token).await
        }

        async fn find_by_public_link(
            &self,
            kind: ResourceKind,
            token: &str,
        ) -> Result<Option<Resource>, StoreError> {
            tokio::task::yield_now().await;
            self.inner.find_by_public_link(kind, token).await
        }

        async fn children(&self, folder_id: Uuid) -> Result<Vec<Resource>, StoreError> {
            self.inner.children(folder_id).await
        }
    }

    fn issuer(store: &MemoryResourceStore) -> PublicLinkIssuer<MemoryResourceStore> {
        PublicLinkIssuer::new(store.clone(), Url::parse("https://vault.example.com/").unwrap())
    }

    #[test]
    fn test_token_shape() {
        let mut seen = HashSet::new();
        for _ in 0..256 {
            let token = generate_token();
            assert_eq!(token.len(), TOKEN_LEN);
            assert!(token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
            assert!(seen.insert(token));
        }
    }

    #[test]
    fn test_public_url_shape() {
        let base = Url::parse("http://localhost:5173").unwrap();
        assert_eq!(
            public_url(&base, "abc", ResourceKind::Folder),
            "http://localhost:5173/public/abc?type=folder"
        );
    }

    #[tokio::test]
    async fn test_publish_is_idempotent() {
        let store = MemoryResourceStore::new();
        let file = Resource::file(Uuid::new_v4(), "a.txt");
        store.insert(file.clone()).await.unwrap();
        let issuer = issuer(&store);

        let first = issuer.publish(&file).await.unwrap();
        let reloaded = store.get(file.reference()).await.unwrap().unwrap();
        assert!(reloaded.is_public);
        assert_eq!(reloaded.public_link.as_deref(), Some(first.token.as_str()));

        let second = issuer.publish(&reloaded).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.url,
            format!("https://vault.example.com/public/{}?type=file", first.token)
        );
    }

    #[tokio::test]
    async fn test_resolve() {
        let store = MemoryResourceStore::new();
        let folder = Resource::folder(Uuid::new_v4(), "photos");
        store.insert(folder.clone()).await.unwrap();
        let issuer = issuer(&store);

        let link = issuer.publish(&folder).await.unwrap();
        let resolved = issuer.resolve(&link.token, ResourceKind::Folder).await.unwrap();
        assert_eq!(resolved.id, folder.id);

        // kind is part of the lookup
        assert!(matches!(
            issuer.resolve(&link.token, ResourceKind::File).await,
            Err(PublicLinkError::NotFound { kind: ResourceKind::File, .. })
        ));
        assert!(issuer.resolve("nope", ResourceKind::Folder).await.is_err());
    }

    #[tokio::test]
    async fn test_stale_token_does_not_resolve() {
        let store = MemoryResourceStore::new();
        let file = Resource::file(Uuid::new_v4(), "a.txt");
        store.insert(file.clone()).await.unwrap();
        let issuer = issuer(&store);

        let link = issuer.publish(&file).await.unwrap();
        store.unpublish(file.reference()).unwrap();

        assert!(matches!(
            issuer.resolve(&link.token, ResourceKind::File).await,
            Err(PublicLinkError::NotFound { .. })
        ));

        // republishing restores the same link
        let reloaded = store.get(file.reference()).await.unwrap().unwrap();
        let again = issuer.publish(&reloaded).await.unwrap();
        assert_eq!(again.token, link.token);
        assert!(issuer.resolve(&link.token, ResourceKind::File).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_publishes_agree() {
        for _ in 0..100 {
            let store = YieldingStore::default();
            let folder = Resource::folder(Uuid::new_v4(), "photos");
            store.insert(folder.clone()).await.unwrap();
            let issuer = PublicLinkIssuer::new(store.clone(), Url::parse("http://localhost:5173").unwrap());

            // both callers start from the same unpublished snapshot
            let first = {
                let (issuer, folder) = (issuer.clone(), folder.clone());
                tokio::spawn(async move { issuer.publish(&folder).await })
            };
            let second = {
                let (issuer, folder) = (issuer.clone(), folder.clone());
                tokio::spawn(async move { issuer.publish(&folder).await })
            };
            let first = first.await.unwrap().unwrap();
            let second = second.await.unwrap().unwrap();

            assert_eq!(first, second);
            let resolved = issuer.resolve(&first.token, ResourceKind::Folder).await.unwrap();
            assert_eq!(resolved.id, folder.id);
        }
    }
}
