//! Keyed async mutexes
//!
//! One `tokio::sync::Mutex<()>` per key, created on first use and kept for
//! the process lifetime like the sessions they guard.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Guard returned by [`KeyedLocks::lock`]; the key is released on drop
pub type SessionGuard = OwnedMutexGuard<()>;

/// Map of per-key async mutexes
#[derive(Debug)]
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash,
{
    /// Create an empty lock map
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Wait for exclusive access to `key`
    pub async fn lock(&self, key: K) -> SessionGuard {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(key).or_default().clone()
        };
        mutex.lock_owned().await
    }

    /// Number of keys that have been locked at least once
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether no key has been locked yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K> Default for KeyedLocks<K>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
