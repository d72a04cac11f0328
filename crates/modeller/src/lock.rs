//! Per-id mutual exclusion.
//!
//! Operations on the same diagram or canvas id run one at a time; operations
//! on different ids do not contend beyond the short registry lookup.

use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Arc, Mutex, PoisonError},
};

/// A registry of one mutex per key.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    ///
    /// Entries are dropped from the registry once no caller holds or waits
    /// on them.
    pub fn with<T>(&self, key: &K, f: impl FnOnce() -> T) -> T {
        let slot = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        let _prune = Prune {
            registry: self,
            key,
            slot: &slot,
        };

        let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Number of keys currently registered.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes a key's entry when the last holder leaves, including on unwind.
struct Prune<'a, K: Eq + Hash> {
    registry: &'a KeyedLocks<K>,
    key: &'a K,
    slot: &'a Arc<Mutex<()>>,
}

impl<K: Eq + Hash> Drop for Prune<'_, K> {
    fn drop(&mut self) {
        let mut locks = self
            .registry
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // One reference in the registry plus ours means nobody else waits.
        if Arc::strong_count(self.slot) == 2 {
            locks.remove(self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        panic::{self, AssertUnwindSafe},
        sync::atomic::{AtomicUsize, Ordering},
        thread,
        time::Duration,
    };

    use super::*;

    #[test]
    fn test_same_key_is_serialized() {
        let locks = KeyedLocks::new();
        let inside = AtomicUsize::new(0);
        let max_inside = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    locks.with(&1_u64, || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(2));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                });
            }
        });

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_panicking_closure_releases_key() {
        let locks = KeyedLocks::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            locks.with::<()>(&7_u64, || panic!("edit failed"));
        }));
        assert!(outcome.is_err());
        assert!(locks.is_empty());

        assert_eq!(locks.with(&7_u64, || "reacquired"), "reacquired");
        assert!(locks.is_empty());
    }

    #[test]
    fn test_returns_closure_value() {
        let locks = KeyedLocks::new();
        assert_eq!(locks.with(&"a", || 42), 42);
        assert_eq!(locks.len(), 0);
    }
}
