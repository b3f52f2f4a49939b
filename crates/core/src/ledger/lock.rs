//! Per-key critical sections.
//!
//! Keys are independent: there is no global lock. A multi-key operation
//! acquires its keys in sorted order so two operations over overlapping key
//! sets cannot deadlock.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;

/// The key whose lock could not be acquired before the timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTimeout<K>(pub K);

/// A table of lazily created mutexes, one per key.
pub struct LockTable<K> {
    slots: DashMap<K, Arc<Mutex<()>>>,
    timeout: Duration,
}

impl<K> LockTable<K>
where
    K: Eq + Hash + Ord + Clone,
{
    /// Creates a table whose acquisitions give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            timeout,
        }
    }

    /// Runs `work` while holding the locks of every key in `keys`.
    ///
    /// # Errors
    ///
    /// Returns the first key that could not be locked in time. `work` is
    /// not run and every lock taken so far is released.
    pub fn run_exclusive<R>(
        &self,
        keys: impl IntoIterator<Item = K>,
        work: impl FnOnce() -> R,
    ) -> Result<R, LockTimeout<K>> {
        let mut ordered: Vec<K> = keys.into_iter().collect();
        ordered.sort();
        ordered.dedup();

        // Clone the slots out so no map shard stays borrowed while we block.
        let slots: Vec<Arc<Mutex<()>>> = ordered
            .iter()
            .map(|key| Arc::clone(self.slots.entry(key.clone()).or_default().value()))
            .collect();

        let result = {
            let mut guards = Vec::with_capacity(slots.len());
            let mut timed_out = None;
            for (key, slot) in ordered.iter().zip(&slots) {
                if let Some(guard) = slot.try_lock_for(self.timeout) {
                    guards.push(guard);
                } else {
                    timed_out = Some(key.clone());
                    break;
                }
            }
            match timed_out {
                Some(key) => Err(LockTimeout(key)),
                None => Ok(work()),
            }
        };

        drop(slots);
        self.evict_idle(&ordered);
        result
    }

    /// Drops the slots no other caller holds or waits on.
    ///
    /// Clones are only taken under the map's shard lock, so a slot whose
    /// count is one cannot be picked up while it is being removed.
    fn evict_idle(&self, keys: &[K]) {
        for key in keys {
            self.slots.remove_if(key, |_, slot| Arc::strong_count(slot) == 1);
        }
    }

    /// Number of keys currently held or waited on.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no key is held or waited on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
