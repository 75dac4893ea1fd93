//! Server error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that prevent the server from starting or keep it from running.
///
/// Errors local to one session never surface here: they end that session and
/// are logged.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error (invalid bind address, zero capacity, etc.).
    ///
    /// Fatal at startup. Fix configuration and restart.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport/network error (bind failure, address lookup, etc.).
    #[error("transport error: {0}")]
    Transport(String),

    /// Store could not be opened at startup.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
