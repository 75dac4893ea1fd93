//! Storage abstraction for joined users and accepted messages.
//!
//! Two append-only, line-oriented stores: `users` holds one
//! `<sequence>:<username>` record per successful join, `messages` holds the raw
//! text of every accepted message. The trait is synchronous; all mutations are
//! funnelled through [`PersistenceLog`](crate::PersistenceLog), which owns the
//! store on a dedicated writer thread.

mod chaotic;
mod error;
mod file;
mod memory;

pub use chaotic::ChaoticStore;
pub use error::StorageError;
pub use file::FileStore;
pub use memory::MemoryStore;

/// One line of the users store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Sequence number assigned at join time (1-based store position)
    pub seq: u64,
    /// Display name as sent in the handshake
    pub name: String,
}

impl UserRecord {
    /// Line form: `<seq>:<name>`.
    pub fn to_line(&self) -> String {
        format!("{}:{}", self.seq, self.name)
    }

    /// Parse a `<seq>:<name>` line. The name may itself contain colons.
    pub fn parse(line: &str) -> Option<Self> {
        let (seq, name) = line.split_once(':')?;
        let seq = seq.trim().parse().ok()?;
        Some(Self { seq, name: name.to_string() })
    }
}

/// Replace line breaks so one stored value stays one line.
pub(crate) fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// Storage for the users and messages logs.
///
/// Must be Clone (tests keep a handle while the writer owns another), Send +
/// Sync, and synchronous. Implementations share state through Arc or through
/// the file system, so clones observe the same records.
pub trait Store: Clone + Send + Sync + 'static {
    /// Append a user record and return its sequence number.
    ///
    /// The sequence number is the store length after the append, so it is
    /// only unique while appends are serialised through one writer and the
    /// store is not rewritten externally.
    fn append_user(&self, name: &str) -> Result<u64, StorageError>;

    /// Append one accepted message.
    fn append_message(&self, line: &str) -> Result<(), StorageError>;

    /// Remove every user record with this exact name. Returns how many lines
    /// were removed. Remaining sequence numbers are left untouched.
    fn remove_user(&self, name: &str) -> Result<usize, StorageError>;

    /// All user records in store order.
    fn users(&self) -> Result<Vec<UserRecord>, StorageError>;

    /// All stored messages in store order.
    fn messages(&self) -> Result<Vec<String>, StorageError>;
}
