#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::sync::{Arc, Mutex, MutexGuard};

use super::{Store, StorageError, UserRecord, single_line};

/// In-memory storage implementation for testing.
///
/// All state is wrapped in `Arc<Mutex<>>` so clones share one log. Applies the
/// same numbering and single-line rules as [`FileStore`](super::FileStore).
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    users: Vec<UserRecord>,
    messages: Vec<String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryStoreInner>, StorageError> {
        self.inner.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl Store for MemoryStore {
    fn append_user(&self, name: &str) -> Result<u64, StorageError> {
        let mut inner = self.lock()?;
        let seq = inner.users.len() as u64 + 1;
        inner.users.push(UserRecord { seq, name: single_line(name) });
        Ok(seq)
    }

    fn append_message(&self, line: &str) -> Result<(), StorageError> {
        self.lock()?.messages.push(single_line(line));
        Ok(())
    }

    fn remove_user(&self, name: &str) -> Result<usize, StorageError> {
        let name = single_line(name);
        let mut inner = self.lock()?;
        let before = inner.users.len();
        inner.users.retain(|r| r.name != name);
        Ok(before - inner.users.len())
    }

    fn users(&self) -> Result<Vec<UserRecord>, StorageError> {
        Ok(self.lock()?.users.clone())
    }

    fn messages(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.lock()?.messages.clone())
    }
}
