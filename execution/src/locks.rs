//! Per-key async mutual exclusion.
//!
//! Operations on the same player are serialized; operations on different players proceed in
//! parallel. Multi-key acquisition always locks in ascending key order so two operations that
//! touch the same pair of players cannot deadlock.

use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Arc, Mutex},
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

/// Held for as long as the operation needs exclusive access to its keys.
#[must_use = "dropping the guard releases the lock immediately"]
pub struct KeyGuard {
    _held: Vec<OwnedMutexGuard<()>>,
}

impl<K: Clone + Ord + Hash> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Clone + Ord + Hash> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &K) -> KeyGuard {
        let slot = self.slot(key);
        KeyGuard {
            _held: vec![slot.lock_owned().await],
        }
    }

    /// Locks every distinct key in ascending order.
    pub async fn lock_all(&self, keys: &[K]) -> KeyGuard {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let mut held = Vec::with_capacity(keys.len());
        for key in &keys {
            held.push(self.slot(key).lock_owned().await);
        }
        KeyGuard { _held: held }
    }

    /// Number of keys currently tracked. Idle keys are pruned on the next acquisition.
    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn slot(&self, key: &K) -> Arc<AsyncMutex<()>> {
        // The map only guards slot lookup, so a poisoned map is still consistent.
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        slots.entry(key.clone()).or_default().clone()
    }
}
