//! Message envelopes.
//!
//! The server treats a frame's text as one of:
//!
//! - a public chat line, opaque to the server (clients conventionally send
//!   `<timestamp> <username>: <body>`), or
//! - a private-message command
//!   `PRIVATE_MESSAGE:<target>:<sender>:<body>`.
//!
//! Private commands split into at most four colon-separated fields, so the
//! body is free to contain colons. A command with fewer than four fields is
//! malformed and routed nowhere.

/// Leading marker that tags a frame as a private-message command.
pub const PRIVATE_MARKER: &str = "PRIVATE_MESSAGE";

/// Interpretation of one client frame after the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Free-form text delivered to every session as-is.
    Public(String),
    /// Text addressed to one named session.
    Private(PrivateMessage),
    /// Carries the private marker but not the four required fields.
    Malformed(String),
}

impl Message {
    /// Classify a frame's text.
    pub fn parse(text: &str) -> Self {
        let Some(rest) = text.strip_prefix(PRIVATE_MARKER).and_then(|r| r.strip_prefix(':'))
        else {
            return Self::Public(text.to_string());
        };

        let mut fields = rest.splitn(3, ':');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(target), Some(sender), Some(body)) => Self::Private(PrivateMessage {
                target: target.to_string(),
                sender: sender.to_string(),
                body: body.to_string(),
            }),
            _ => Self::Malformed(text.to_string()),
        }
    }

    /// Whether this message goes to a single recipient.
    pub fn is_private(&self) -> bool {
        matches!(self, Self::Private(_))
    }
}

/// A parsed private-message command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateMessage {
    /// Display name of the intended recipient
    pub target: String,
    /// Display name the sender claims
    pub sender: String,
    /// Message body, may contain colons
    pub body: String,
}

impl PrivateMessage {
    /// Create a private message.
    pub fn new(
        target: impl Into<String>,
        sender: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self { target: target.into(), sender: sender.into(), body: body.into() }
    }

    /// Wire form of this command.
    pub fn to_wire(&self) -> String {
        format!("{PRIVATE_MARKER}:{}:{}:{}", self.target, self.sender, self.body)
    }

    /// Text the recipient receives: `<sender>:<body>`.
    pub fn delivery_payload(&self) -> String {
        format!("{}:{}", self.sender, self.body)
    }

    /// Sender and target name the same session.
    pub fn is_self_addressed(&self) -> bool {
        self.target == self.sender
    }
}
