//! Chaotic storage wrapper for fault injection testing
//!
//! Delegates to an underlying store but fails a configurable fraction of
//! operations. Used to check that persistence failures are logged and
//! swallowed without touching message delivery.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use super::{Store, StorageError, UserRecord};

/// Store wrapper that randomly injects failures into mutations.
///
/// Reads (`users`, `messages`) always pass through so tests can inspect what
/// actually landed.
#[derive(Clone)]
pub struct ChaoticStore<S: Store> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    rng: Arc<Mutex<ChaoticRng>>,
    injected: Arc<AtomicUsize>,
}

/// Linear congruential generator, so chaos runs are reproducible per seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next value in [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // LCG constants from Numerical Recipes
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }
}

impl<S: Store> ChaoticStore<S> {
    /// Wrap `inner`, failing mutations with probability `failure_rate`
    /// (clamped to [0.0, 1.0]).
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Create with explicit seed for reproducible chaos
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        Self {
            inner,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            injected: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of failures injected so far.
    pub fn injected_failures(&self) -> usize {
        self.injected.load(Ordering::Relaxed)
    }

    /// Wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn maybe_fail(&self, operation: &'static str) -> Result<(), StorageError> {
        let roll = self.rng.lock().map_err(|_| StorageError::Poisoned)?.next();
        if roll < self.failure_rate {
            self.injected.fetch_add(1, Ordering::Relaxed);
            return Err(StorageError::Injected { operation });
        }
        Ok(())
    }
}

impl<S: Store> Store for ChaoticStore<S> {
    fn append_user(&self, name: &str) -> Result<u64, StorageError> {
        self.maybe_fail("append_user")?;
        self.inner.append_user(name)
    }

    fn append_message(&self, line: &str) -> Result<(), StorageError> {
        self.maybe_fail("append_message")?;
        self.inner.append_message(line)
    }

    fn remove_user(&self, name: &str) -> Result<usize, StorageError> {
        self.maybe_fail("remove_user")?;
        self.inner.remove_user(name)
    }

    fn users(&self) -> Result<Vec<UserRecord>, StorageError> {
        self.inner.users()
    }

    fn messages(&self) -> Result<Vec<String>, StorageError> {
        self.inner.messages()
    }
}
