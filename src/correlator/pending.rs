//! Pending-match table with an explicit key-reuse policy.

use std::collections::HashMap;
use std::hash::Hash;

/// What happens when a second record arrives for a key that is still pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingPolicy {
    /// The newest record replaces the unmatched one (xperf dumper behaviour)
    #[default]
    Overwrite,
    /// The first record stays; the newcomer is dropped
    KeepFirst,
}

/// Records waiting for their correlation partner, one per key
#[derive(Debug)]
pub struct PendingTable<K, V> {
    entries: HashMap<K, V>,
    policy: PendingPolicy,
    collisions: u64,
}

impl<K: Eq + Hash, V> PendingTable<K, V> {
    pub fn new(policy: PendingPolicy) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
            collisions: 0,
        }
    }

    /// Insert a record, applying the reuse policy on collision
    ///
    /// Returns `true` if the key was already pending.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if let Some(existing) = self.entries.get_mut(&key) {
            self.collisions += 1;
            if self.policy == PendingPolicy::Overwrite {
                *existing = value;
            }
            return true;
        }
        self.entries.insert(key, value);
        false
    }

    /// Remove and return the record pending under `key`
    pub fn take(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of inserts that hit an already pending key
    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    /// Drop everything still pending, returning how many were lost
    pub fn drain_unmatched(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }
}
