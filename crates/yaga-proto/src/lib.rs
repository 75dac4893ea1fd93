//! Yaga chat wire protocol.
//!
//! Every application message travels as one length-prefixed UTF-8 frame. The
//! first frame a client sends is its display name; every later frame is either
//! a public chat line or a private-message command.
//!
//! # Components
//!
//! - [`Frame`]: one framed string, `[u16 BE length][UTF-8 payload]`
//! - [`read_frame`] / [`write_frame`]: async framing over any tokio stream
//! - [`Message`]: how the server interprets a frame's text

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod errors;
pub mod frame;

pub use envelope::{Message, PRIVATE_MARKER, PrivateMessage};
pub use errors::{ProtocolError, Result};
pub use frame::{Frame, read_frame, write_frame};
