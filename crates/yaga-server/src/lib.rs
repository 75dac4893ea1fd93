//! Yaga chat server.
//!
//! Multi-client text chat over TCP using the length-prefixed framing from
//! [`yaga_proto`]. Each connection runs as its own task; all sessions share a
//! [`Registry`], a [`Broadcaster`], a [`Moderator`] and a [`PersistenceLog`].
//!
//! # Components
//!
//! - [`Server`]: listener and admission control
//! - [`Session`]: per-connection handshake, receive loop and teardown
//! - [`Registry`]: live sessions, name lookup and the admission counter
//! - [`Broadcaster`]: public fan-out and `PRIVATE_MESSAGE` routing
//! - [`Moderator`]: forbidden-word check, re-read from disk on every message
//! - [`PersistenceLog`]: best-effort append of joins and messages to a [`Store`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod broadcaster;
mod config;
mod error;
mod moderator;
mod persistence;
mod registry;
mod session;
pub mod storage;

use std::{net::SocketAddr, sync::Arc};

pub use broadcaster::{Broadcaster, Dispatch, SELF_ADDRESSED_WARNING};
pub use config::{DuplicateNamePolicy, ServerConfig};
pub use error::ServerError;
pub use moderator::{ForbiddenWords, Moderator};
pub use persistence::PersistenceLog;
pub use registry::{Admission, Registry, RegistryError, SessionId};
pub use session::{CloseReason, Session, SessionContext, SessionHandle, SessionState};
pub use storage::{ChaoticStore, FileStore, MemoryStore, StorageError, Store};
use tokio::net::TcpListener;

/// Production chat server.
pub struct Server {
    listener: TcpListener,
    ctx: SessionContext,
}

impl Server {
    /// Create and bind a new server backed by the files named in `config`.
    ///
    /// # Errors
    ///
    /// - `ServerError::Config` if the configuration is invalid
    /// - `ServerError::Storage` if the store files cannot be opened
    /// - `ServerError::Transport` if the address cannot be bound
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let store = FileStore::open(&config.users_path, &config.messages_path)?;
        Self::bind_with_store(config, store).await
    }

    /// Create and bind a new server persisting to `store`.
    ///
    /// # Errors
    ///
    /// Same as [`bind`](Self::bind), minus store opening.
    pub async fn bind_with_store<S: Store>(
        config: ServerConfig,
        store: S,
    ) -> Result<Self, ServerError> {
        let addr = config.validate()?;

        let persistence = PersistenceLog::spawn(store).map_err(|e| {
            ServerError::Config(format!("failed to start persistence writer: {e}"))
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Transport(format!("failed to bind {addr}: {e}")))?;

        let registry = Arc::new(Registry::new(config.max_sessions));
        let ctx = SessionContext {
            broadcaster: Broadcaster::new(Arc::clone(&registry), persistence.clone()),
            registry,
            moderator: Moderator::new(config.forbidden_words_path),
            persistence,
            duplicate_names: config.duplicate_names,
            prune_users_on_leave: config.prune_users_on_leave,
        };

        Ok(Self { listener, ctx })
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared session registry.
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.ctx.registry)
    }

    /// Persistence handle the server writes through.
    pub fn persistence(&self) -> PersistenceLog {
        self.ctx.persistence.clone()
    }

    /// Run the accept loop.
    ///
    /// Connections beyond `max_sessions` are closed immediately without a
    /// handshake. Accept errors are logged and the loop continues; it only
    /// ends when the task is dropped.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(
            "Server accepting on {} (max {} sessions)",
            self.local_addr()?,
            self.ctx.registry.max_sessions()
        );
        tracing::info!(
            "Forbidden words read from {}",
            self.ctx.moderator.words_path().display()
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let Some(admission) = self.ctx.registry.try_admit() else {
                        tracing::info!("Connection from {} refused: server full", peer);
                        drop(stream);
                        continue;
                    };

                    tracing::debug!("Accepted connection from {}", peer);

                    let session = Session::from_tcp(stream, self.ctx.clone(), admission);
                    let id = session.id();
                    tokio::spawn(async move {
                        let reason = session.run().await;
                        tracing::debug!(session = %id, "Session task finished: {}", reason);
                    });
                },
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                },
            }
        }
    }
}
