//! `PRIVATE_MESSAGE:<target>:<sender>:<body>` routing.

mod common;

use common::TestServer;
use yaga_server::SELF_ADDRESSED_WARNING;

#[tokio::test]
async fn private_message_reaches_only_target() {
    let server = TestServer::start(|_| {}).await;
    let mut alice = server.join("alice").await;
    let mut bob = server.join("bob").await;
    let mut carol = server.join("carol").await;

    alice.send("PRIVATE_MESSAGE:bob:alice:secret").await;

    assert_eq!(bob.recv().await, "alice:secret");
    alice.expect_silent().await;
    carol.expect_silent().await;
}

#[tokio::test]
async fn body_keeps_its_colons() {
    let server = TestServer::start(|_| {}).await;
    let mut alice = server.join("alice").await;
    let mut bob = server.join("bob").await;

    alice.send("PRIVATE_MESSAGE:bob:alice:meet at 10:30:00").await;

    assert_eq!(bob.recv().await, "alice:meet at 10:30:00");
    alice.expect_silent().await;
}

#[tokio::test]
async fn self_addressed_message_warns_sender_instead() {
    let server = TestServer::start(|_| {}).await;
    let mut alice = server.join("alice").await;
    let mut bob = server.join("bob").await;

    alice.send("PRIVATE_MESSAGE:alice:alice:note to self").await;

    assert_eq!(alice.recv().await, SELF_ADDRESSED_WARNING);
    alice.expect_silent().await;
    bob.expect_silent().await;
}

#[tokio::test]
async fn claimed_sender_name_does_not_bypass_self_check() {
    let server = TestServer::start(|_| {}).await;
    let mut alice = server.join("alice").await;
    let mut bob = server.join("bob").await;

    alice.send("PRIVATE_MESSAGE:alice:bob:hi").await;

    assert_eq!(alice.recv().await, SELF_ADDRESSED_WARNING);
    alice.expect_silent().await;
    bob.expect_silent().await;
}

#[tokio::test]
async fn unknown_target_and_malformed_commands_are_dropped() {
    let server = TestServer::start(|_| {}).await;
    let mut alice = server.join("alice").await;
    let mut bob = server.join("bob").await;

    alice.send("PRIVATE_MESSAGE:ghost:alice:boo").await;
    alice.send("PRIVATE_MESSAGE:bob").await;
    alice.send("PRIVATE_MESSAGE:bob:alice").await;

    alice.expect_silent().await;
    bob.expect_silent().await;

    // Connection still usable afterwards
    alice.send("PRIVATE_MESSAGE:bob:alice:still here").await;
    assert_eq!(bob.recv().await, "alice:still here");
}

#[tokio::test]
async fn private_messages_are_persisted_verbatim() {
    let server = TestServer::start(|_| {}).await;
    let mut alice = server.join("alice").await;
    let mut bob = server.join("bob").await;

    alice.send("PRIVATE_MESSAGE:bob:alice:secret").await;
    assert_eq!(bob.recv().await, "alice:secret");

    let messages = server.lines(server.messages_path()).await;
    assert_eq!(messages, vec!["PRIVATE_MESSAGE:bob:alice:secret"]);
}
