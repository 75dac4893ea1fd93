//! Shared helpers for end-to-end tests over real TCP.

#![allow(dead_code)]

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use tempfile::TempDir;
use tokio::{io::AsyncReadExt, net::TcpStream};
use yaga_proto::{Frame, ProtocolError, read_frame, write_frame};
use yaga_server::{PersistenceLog, Registry, Server, ServerConfig, Store};

/// How long a client waits before concluding nothing is coming.
pub const QUIET: Duration = Duration::from_millis(150);

/// Upper bound for anything that should happen promptly.
pub const PROMPT: Duration = Duration::from_secs(5);

/// A running server plus the state tests inspect.
pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: Arc<Registry>,
    pub persistence: PersistenceLog,
    pub dir: TempDir,
}

impl TestServer {
    /// Start a file-backed server on an ephemeral port.
    pub async fn start(configure: impl FnOnce(&mut ServerConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        configure(&mut config);

        let server = Server::bind(config).await.unwrap();
        Self::spawn(server, dir)
    }

    /// Start a server persisting to `store`.
    pub async fn start_with_store<S: Store>(
        store: S,
        configure: impl FnOnce(&mut ServerConfig),
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        configure(&mut config);

        let server = Server::bind_with_store(config, store).await.unwrap();
        Self::spawn(server, dir)
    }

    fn spawn(server: Server, dir: TempDir) -> Self {
        let addr = server.local_addr().unwrap();
        let registry = server.registry();
        let persistence = server.persistence();
        tokio::spawn(server.run());
        Self { addr, registry, persistence, dir }
    }

    pub fn users_path(&self) -> PathBuf {
        self.dir.path().join("users.txt")
    }

    pub fn messages_path(&self) -> PathBuf {
        self.dir.path().join("messages.txt")
    }

    pub fn forbidden_words_path(&self) -> PathBuf {
        self.dir.path().join("forbidden_words.txt")
    }

    /// Connect and complete the handshake, then wait until registered.
    pub async fn join(&self, name: &str) -> TestClient {
        let before = self.registry.len().await;
        let client = TestClient::handshake(self.addr, name).await;
        self.wait_for_sessions(before + 1).await;
        client
    }

    /// Poll until exactly `n` sessions are registered.
    pub async fn wait_for_sessions(&self, n: usize) {
        wait_until(|| async move { self.registry.len().await == n }).await;
        assert_eq!(self.registry.len().await, n);
    }

    /// Poll until exactly `n` admission slots are taken.
    pub async fn wait_for_admitted(&self, n: usize) {
        wait_until(|| async move { self.registry.admitted() == n }).await;
        assert_eq!(self.registry.admitted(), n);
    }

    /// Lines currently in a store file.
    pub async fn lines(&self, path: PathBuf) -> Vec<String> {
        self.persistence.flush().await;
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn config_in(dir: &TempDir) -> ServerConfig {
    ServerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        users_path: dir.path().join("users.txt"),
        messages_path: dir.path().join("messages.txt"),
        forbidden_words_path: dir.path().join("forbidden_words.txt"),
        ..Default::default()
    }
}

async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + PROMPT;
    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Client side of one chat connection.
pub struct TestClient {
    stream: TcpStream,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        Self { stream: TcpStream::connect(addr).await.unwrap() }
    }

    pub async fn handshake(addr: SocketAddr, name: &str) -> Self {
        let mut client = Self::connect(addr).await;
        client.send(name).await;
        client
    }

    pub async fn send(&mut self, text: &str) {
        write_frame(&mut self.stream, &Frame::new(text)).await.unwrap();
    }

    /// Next frame, failing the test if none arrives promptly.
    pub async fn recv(&mut self) -> String {
        tokio::time::timeout(PROMPT, read_frame(&mut self.stream))
            .await
            .expect("timed out waiting for a frame")
            .unwrap()
            .into_string()
    }

    /// Assert nothing arrives within [`QUIET`].
    pub async fn expect_silent(&mut self) {
        let mut byte = [0u8; 1];
        let read = tokio::time::timeout(QUIET, self.stream.read(&mut byte)).await;
        assert!(read.is_err(), "expected silence, got {read:?}");
    }

    /// Assert the server closes this connection.
    pub async fn expect_closed(&mut self) {
        let result = tokio::time::timeout(PROMPT, read_frame(&mut self.stream))
            .await
            .expect("connection was not closed");
        match result {
            Err(e) => assert!(e.is_disconnect(), "unexpected error: {e}"),
            Ok(frame) => panic!("expected close, got frame {:?}", frame.as_str()),
        }
    }

    /// Read until the connection closes, returning the frames seen.
    pub async fn drain_until_closed(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        loop {
            match tokio::time::timeout(PROMPT, read_frame(&mut self.stream)).await {
                Ok(Ok(frame)) => frames.push(frame.into_string()),
                Ok(Err(ProtocolError::ConnectionClosed)) | Ok(Err(ProtocolError::Io(_))) => {
                    return frames;
                },
                Ok(Err(e)) => panic!("unexpected error: {e}"),
                Err(_) => panic!("connection was not closed"),
            }
        }
    }
}
