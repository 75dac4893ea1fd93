//! Registry of live sessions and admission control.
//!
//! The registry owns two pieces of shared state:
//!
//! - the set of registered sessions, behind an async `RwLock`, used for join,
//!   leave, broadcast snapshots and private-message lookup;
//! - the admission counter, an atomic bounded by `max_sessions`. A slot is
//!   taken when a connection is accepted (before its handshake) and returned
//!   when the [`Admission`] guard drops, so release happens exactly once.
//!
//! Callers never see the lock. Broadcast iterates over a snapshot of `Arc`
//! handles, so writes to recipients happen outside the registry lock.

use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};

use thiserror::Error;
use tokio::sync::RwLock;

use crate::{config::DuplicateNamePolicy, session::SessionHandle};

/// Server-assigned session identifier. Monotonic, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registration failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Another live session already uses this name.
    #[error("name already in use: {0}")]
    DuplicateName(String),

    /// This session ID is already registered.
    #[error("session already registered: {0}")]
    AlreadyRegistered(SessionId),
}

/// Shared collection of live sessions.
pub struct Registry {
    /// Session ID → session. Ordered so iteration and lookup are
    /// deterministic (earliest accepted connection first).
    sessions: RwLock<BTreeMap<SessionId, Arc<SessionHandle>>>,
    /// Connections currently holding an admission slot
    admitted: AtomicUsize,
    max_sessions: usize,
    next_id: AtomicU64,
}

impl Registry {
    /// Create an empty registry admitting at most `max_sessions` connections.
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
            admitted: AtomicUsize::new(0),
            max_sessions,
            next_id: AtomicU64::new(1),
        }
    }

    /// Take an admission slot if one is free.
    ///
    /// The check and the increment are one atomic step, so concurrent accepts
    /// can never push the count past `max_sessions`.
    pub fn try_admit(self: &Arc<Self>) -> Option<Admission> {
        self.admitted
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < self.max_sessions).then_some(current + 1)
            })
            .ok()
            .map(|_| Admission { registry: Arc::clone(self) })
    }

    /// Allocate a fresh session ID.
    pub fn next_session_id(&self) -> SessionId {
        SessionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a session that completed its handshake.
    pub async fn register(
        &self,
        handle: Arc<SessionHandle>,
        policy: DuplicateNamePolicy,
    ) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.write().await;

        if sessions.contains_key(&handle.id()) {
            return Err(RegistryError::AlreadyRegistered(handle.id()));
        }

        if policy == DuplicateNamePolicy::Reject
            && sessions.values().any(|s| s.name() == handle.name())
        {
            return Err(RegistryError::DuplicateName(handle.name().to_string()));
        }

        sessions.insert(handle.id(), handle);
        Ok(())
    }

    /// Remove a session. Returns it if it was registered.
    pub async fn remove(&self, id: SessionId) -> Option<Arc<SessionHandle>> {
        self.sessions.write().await.remove(&id)
    }

    /// Consistent copy of every registered session, in session ID order.
    pub async fn snapshot(&self) -> Vec<Arc<SessionHandle>> {
        self.sessions.read().await.values().cloned().collect()
    }

    /// Session with this name that was accepted first (lowest ID).
    pub async fn find(&self, name: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.read().await.values().find(|s| s.name() == name).cloned()
    }

    /// Names of every registered session, in session ID order.
    pub async fn names(&self) -> Vec<String> {
        self.sessions.read().await.values().map(|s| s.name().to_string()).collect()
    }

    /// Number of registered sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session is registered.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Connections currently holding an admission slot (registered or still
    /// handshaking).
    pub fn admitted(&self) -> usize {
        self.admitted.load(Ordering::Acquire)
    }

    /// Admission capacity.
    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }
}

/// An occupied admission slot. Dropping it frees the slot.
pub struct Admission {
    registry: Arc<Registry>,
}

impl Drop for Admission {
    fn drop(&mut self) {
        let previous = self.registry.admitted.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "admission released more often than taken");
    }
}

impl fmt::Debug for Admission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Admission").field("admitted", &self.registry.admitted()).finish()
    }
}
