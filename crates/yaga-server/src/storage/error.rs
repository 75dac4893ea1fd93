//! Storage error types.
//!
//! Defines errors that can occur during storage operations:
//! - `Io`: Underlying file system errors
//! - `Poisoned`: An in-memory store's lock was poisoned by a panicking thread
//! - `Injected`: Deliberate failure from the chaos wrapper

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// I/O error (file system)
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal lock poisoned
    #[error("storage lock poisoned")]
    Poisoned,

    /// Failure injected for testing
    #[error("injected failure: {operation}")]
    Injected {
        /// Operation that was failed on purpose
        operation: &'static str,
    },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}
