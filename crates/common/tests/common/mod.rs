//! Shared test utilities for sharing integration tests
#![allow(dead_code)]

use std::sync::Arc;

use ::common::prelude::*;
use ::common::testkit::RecordingMailer;

/// A sharing engine wired to in-memory stores, a live connection registry
///  and a recording mailer, plus two registered accounts.
pub struct TestEnv {
    pub sharing: Sharing<MemoryGrantStore, MemoryResourceStore>,
    pub tree: ResourceTree<MemoryResourceStore>,
    pub resources: MemoryResourceStore,
    pub directory: MemoryPrincipalDirectory,
    pub registry: ConnectionRegistry,
    pub mailer: RecordingMailer,
    pub alice: Principal,
    pub bob: Principal,
}

/// Route engine logs to the test harness; set RUST_LOG to see them
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Set up a test environment with alice and bob registered
pub fn setup_test_env() -> TestEnv {
    init_tracing();

    let resources = MemoryResourceStore::new();
    let directory = MemoryPrincipalDirectory::new();
    let registry = ConnectionRegistry::new();
    let mailer = RecordingMailer::default();

    let alice = Principal::new("alice@example.com");
    let bob = Principal::new("bob@example.com");
    directory.register(alice.clone());
    directory.register(bob.clone());

    let sharing = Sharing::new(
        MemoryGrantStore::new(),
        resources.clone(),
        Arc::new(directory.clone()),
        Arc::new(registry.clone()),
        Arc::new(mailer.clone()),
        SharingConfig::default(),
    );

    TestEnv {
        sharing,
        tree: ResourceTree::new(resources.clone()),
        resources,
        directory,
        registry,
        mailer,
        alice,
        bob,
    }
}

impl TestEnv {
    pub async fn file(&self, owner: &Principal, name: &str) -> Resource {
        let file = Resource::file(owner.id, name);
        self.resources.insert(file.clone()).await.unwrap();
        file
    }

    pub async fn folder(&self, owner: &Principal, name: &str) -> Resource {
        let folder = Resource::folder(owner.id, name);
        self.resources.insert(folder.clone()).await.unwrap();
        folder
    }

    pub async fn share(&self, resource: &Resource, email: &str, level: Permission) -> Grant {
        self.sharing
            .share(&ShareRequest::new(resource.reference(), email, level), &self.alice)
            .await
            .unwrap()
    }

    pub async fn can(&self, principal: Option<&Principal>, action: Action, resource: &Resource) -> bool {
        self.sharing
            .authorize(principal, action, resource.reference())
            .await
            .unwrap()
            .is_allowed()
    }

    pub async fn parent_of(&self, folder: &Resource) -> Option<uuid::Uuid> {
        self.resources
            .get(folder.reference())
            .await
            .unwrap()
            .unwrap()
            .parent_id
    }
}
