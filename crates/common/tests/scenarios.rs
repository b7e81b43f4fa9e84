//! End-to-end sharing scenarios
mod common;

use ::common::prelude::*;
use ::common::testkit::SentMail;

use crate::common::setup_test_env;

#[tokio::test]
async fn test_reparenting_under_own_child_fails() {
    let env = setup_test_env();
    let f1 = env.folder(&env.alice, "f1").await;
    let f2 = env.folder(&env.alice, "f2").await;
    env.tree.set_parent(f2.id, Some(f1.id)).await.unwrap();

    let result = env.tree.set_parent(f1.id, Some(f2.id)).await;
    assert!(matches!(result, Err(TreeError::Cycle { .. })));

    // tree unchanged
    assert_eq!(env.parent_of(&f1).await, None);
    assert_eq!(env.parent_of(&f2).await, Some(f1.id));

    let err: SharingError = result.unwrap_err().into();
    assert!(matches!(err, SharingError::BadRequest(_)));
}

#[tokio::test]
async fn test_edit_grant_allows_read_and_update_only() {
    let env = setup_test_env();
    let x = env.file(&env.alice, "x.txt").await;

    env.share(&x, "bob@example.com", Permission::Edit).await;

    assert!(env.can(Some(&env.bob), Action::Read, &x).await);
    assert!(env.can(Some(&env.bob), Action::Update, &x).await);
    assert!(!env.can(Some(&env.bob), Action::Delete, &x).await);
    assert!(!env.can(Some(&env.bob), Action::Share, &x).await);
}

#[tokio::test]
async fn test_unknown_email_only_gets_an_invite() {
    let env = setup_test_env();
    let x = env.file(&env.alice, "x.txt").await;
    let alice_conn = env.registry.connect(env.alice.id).unwrap();
    let bob_conn = env.registry.connect(env.bob.id).unwrap();

    let grant = env.share(&x, "nobody@example.com", Permission::View).await;
    assert_eq!(grant.email(), Some("nobody@example.com"));

    let sent = env.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(matches!(&sent[0], SentMail::Invite(notice) if notice.recipient_email == "nobody@example.com"));

    assert!(alice_conn.events.try_recv().is_err());
    assert!(bob_conn.events.try_recv().is_err());
}

#[tokio::test]
async fn test_revoke_removes_access_but_not_ownership() {
    let env = setup_test_env();
    let x = env.file(&env.alice, "x.txt").await;
    let grant = env.share(&x, "bob@example.com", Permission::Edit).await;
    assert!(env.can(Some(&env.bob), Action::Update, &x).await);

    env.sharing.revoke(grant.id, &env.alice).await.unwrap();

    assert!(!env.can(Some(&env.bob), Action::Update, &x).await);
    assert!(!env.can(Some(&env.bob), Action::Read, &x).await);
    assert!(env.can(Some(&env.alice), Action::Update, &x).await);
}

#[tokio::test]
async fn test_publish_twice_returns_the_same_link() {
    let env = setup_test_env();
    let d = env.folder(&env.alice, "d").await;

    let first = env.sharing.publish(d.reference(), &env.alice).await.unwrap();
    let stored = env.resources.get(d.reference()).await.unwrap().unwrap();
    assert!(stored.is_public);

    let second = env.sharing.publish(d.reference(), &env.alice).await.unwrap();
    let stored = env.resources.get(d.reference()).await.unwrap().unwrap();
    assert!(stored.is_public);

    assert_eq!(first.token, second.token);
    assert_eq!(first.url, second.url);
    assert_eq!(
        first.url,
        format!("http://localhost:5173/public/{}?type=folder", first.token)
    );

    let resolved = env
        .sharing
        .resolve_public(&first.token, ResourceKind::Folder)
        .await
        .unwrap();
    assert_eq!(resolved.id, d.id);
}

#[tokio::test]
async fn test_live_events_reach_connected_principals() {
    let env = setup_test_env();
    let x = env.file(&env.alice, "x.txt").await;
    let alice_conn = env.registry.connect(env.alice.id).unwrap();
    let bob_conn = env.registry.connect(env.bob.id).unwrap();

    let grant = env.share(&x, "bob@example.com", Permission::View).await;
    assert_eq!(bob_conn.events.try_recv().unwrap().name(), "permission:granted");
    assert_eq!(alice_conn.events.try_recv().unwrap().name(), "file:shared");

    env.sharing
        .update_level(grant.id, Permission::Edit, &env.alice)
        .await
        .unwrap();
    assert_eq!(bob_conn.events.try_recv().unwrap().name(), "permission:updated");

    env.sharing.revoke(grant.id, &env.alice).await.unwrap();
    let revoked = bob_conn.events.try_recv().unwrap();
    assert_eq!(revoked, LiveEvent::revoked(&grant));

    assert!(bob_conn.events.try_recv().is_err());
    assert!(alice_conn.events.try_recv().is_err());
}

#[tokio::test]
async fn test_email_grant_follows_the_account_once_registered() {
    let env = setup_test_env();
    let x = env.file(&env.alice, "x.txt").await;
    env.share(&x, "carol@example.com", Permission::Delete).await;

    let carol = Principal::new("carol@example.com");
    assert!(env.can(Some(&carol), Action::Delete, &x).await);

    env.directory.register(carol.clone());
    let shared = env.sharing.list_shared_with(carol.id).await.unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].resource, x.reference());
}
