use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use crate::error::{ScoringError, ScoringResult};

/// Table of exclusive locks keyed by entity id.
///
/// Entries are created on first use and kept for the life of the table.
/// Callers that take more than one lock take the match lock before any
/// innings lock.
pub struct LockTable<K> {
    name: &'static str,
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Copy + Eq + Hash> LockTable<K> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with_lock<T>(&self, key: K, f: impl FnOnce() -> ScoringResult<T>) -> ScoringResult<T> {
        let lock = {
            let mut table = self.locks.lock().map_err(|_| self.poisoned())?;
            Arc::clone(table.entry(key).or_default())
        };
        let _guard = lock.lock().map_err(|_| self.poisoned())?;
        f()
    }

    fn poisoned(&self) -> ScoringError {
        ScoringError::Internal(format!("{} lock poisoned", self.name))
    }
}
