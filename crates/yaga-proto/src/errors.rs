//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while framing or unframing messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Fewer bytes than the length prefix itself.
    #[error("frame too short: need {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum number of bytes required
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// Payload shorter than the length prefix claims.
    #[error("frame truncated: expected {expected} payload bytes, got {actual}")]
    FrameTruncated {
        /// Payload size announced by the prefix
        expected: usize,
        /// Payload bytes actually available
        actual: usize,
    },

    /// Payload does not fit in the length prefix.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Payload size in bytes
        size: usize,
        /// Largest encodable payload
        max: usize,
    },

    /// Payload bytes are not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    /// Peer closed the stream on a frame boundary.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// Underlying stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Whether this error is an orderly disconnect rather than a failure.
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::ConnectionClosed => true,
            Self::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
