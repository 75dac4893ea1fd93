//! Users and messages stores behind a running server.

mod common;

use common::TestServer;
use yaga_server::{ChaoticStore, MemoryStore, Store};

#[tokio::test]
async fn joins_are_recorded_with_sequence_numbers() {
    let server = TestServer::start(|_| {}).await;
    let _alice = server.join("alice").await;
    let _bob = server.join("bob").await;

    assert_eq!(server.lines(server.users_path()).await, vec!["1:alice", "2:bob"]);
}

#[tokio::test]
async fn sequence_continues_from_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let users = dir.path().join("existing-users.txt");
    std::fs::write(&users, "1:old\n2:older\n").unwrap();

    let path = users.clone();
    let server = TestServer::start(move |config| config.users_path = path).await;
    let _alice = server.join("alice").await;

    assert_eq!(server.lines(users).await, vec!["1:old", "2:older", "3:alice"]);
}

#[tokio::test]
async fn accepted_messages_are_appended_raw() {
    let server = TestServer::start(|_| {}).await;
    let mut alice = server.join("alice").await;

    alice.send("first").await;
    alice.send("second: with colon").await;
    assert_eq!(alice.recv().await, "first");
    assert_eq!(alice.recv().await, "second: with colon");

    assert_eq!(server.lines(server.messages_path()).await, vec!["first", "second: with colon"]);
}

#[tokio::test]
async fn storage_failures_never_affect_delivery() {
    let store = ChaoticStore::with_seed(MemoryStore::new(), 1.0, 7);
    let server = TestServer::start_with_store(store.clone(), |_| {}).await;

    let mut alice = server.join("alice").await;
    let mut bob = server.join("bob").await;

    for i in 0..10 {
        alice.send(&format!("m{i}")).await;
        assert_eq!(bob.recv().await, format!("m{i}"));
    }

    server.persistence.flush().await;
    assert!(store.injected_failures() >= 12);
    assert!(store.inner().messages().unwrap().is_empty());
    assert!(store.inner().users().unwrap().is_empty());
}

#[tokio::test]
async fn prune_removes_user_on_leave() {
    let server = TestServer::start(|config| config.prune_users_on_leave = true).await;
    let alice = server.join("alice").await;
    let _bob = server.join("bob").await;

    assert_eq!(server.lines(server.users_path()).await, vec!["1:alice", "2:bob"]);

    drop(alice);
    server.wait_for_sessions(1).await;

    assert_eq!(server.lines(server.users_path()).await, vec!["2:bob"]);
}

#[tokio::test]
async fn users_are_kept_on_leave_by_default() {
    let server = TestServer::start(|_| {}).await;
    let alice = server.join("alice").await;

    drop(alice);
    server.wait_for_sessions(0).await;

    assert_eq!(server.lines(server.users_path()).await, vec!["1:alice"]);
}
