//! Server configuration.

use std::{net::SocketAddr, path::PathBuf};

use crate::error::ServerError;

/// What to do when a second live session announces a name already in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DuplicateNamePolicy {
    /// Register both. Private messages to that name reach the session that
    /// connected first.
    #[default]
    Allow,
    /// Refuse the later join and close its connection.
    Reject,
}

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (e.g., "0.0.0.0:8082")
    pub bind_address: String,
    /// Maximum concurrently admitted connections
    pub max_sessions: usize,
    /// Users store (`<seq>:<name>` per line)
    pub users_path: PathBuf,
    /// Messages store (raw accepted message per line)
    pub messages_path: PathBuf,
    /// Forbidden-word list, re-read on every message
    pub forbidden_words_path: PathBuf,
    /// Name collision handling
    pub duplicate_names: DuplicateNamePolicy,
    /// Remove a user's records from the users store when their session ends
    pub prune_users_on_leave: bool,
}

impl ServerConfig {
    /// Port the chat service listens on by default.
    pub const DEFAULT_PORT: u16 = 8082;

    /// Default cap on concurrent sessions.
    pub const DEFAULT_MAX_SESSIONS: usize = 5;

    /// Check the configuration and resolve the bind address.
    pub fn validate(&self) -> Result<SocketAddr, ServerError> {
        if self.max_sessions == 0 {
            return Err(ServerError::Config("max_sessions must be at least 1".to_string()));
        }

        self.bind_address.parse().map_err(|e| {
            ServerError::Config(format!("invalid bind address '{}': {e}", self.bind_address))
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: format!("0.0.0.0:{}", Self::DEFAULT_PORT),
            max_sessions: Self::DEFAULT_MAX_SESSIONS,
            users_path: PathBuf::from("users.txt"),
            messages_path: PathBuf::from("messages.txt"),
            forbidden_words_path: PathBuf::from("forbidden_words.txt"),
            duplicate_names: DuplicateNamePolicy::default(),
            prune_users_on_leave: false,
        }
    }
}
