//! Per-key reader/writer locks.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{ArcRwLockReadGuard, ArcRwLockWriteGuard, RawRwLock, RwLock};
use stockroom_core::Isbn;

type ItemLock = Arc<RwLock<()>>;

/// Lazily-populated map from key to that key's lock.
///
/// A lock is created on first reference and never removed, so every caller
/// naming the same key for the rest of the process shares one lock. Locks
/// outlive the deletion of their record.
#[derive(Debug, Default)]
pub struct ItemLockRegistry {
    locks: DashMap<Isbn, ItemLock>,
}

impl ItemLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys that have ever been locked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    pub fn contains(&self, isbn: Isbn) -> bool {
        self.locks.contains_key(&isbn)
    }

    /// Returns the lock for `isbn`, creating it atomically if absent.
    pub fn lock_for(&self, isbn: Isbn) -> ItemLock {
        if let Some(existing) = self.locks.get(&isbn) {
            return Arc::clone(&existing);
        }
        // The shard guard is released at the end of the statement, before any
        // caller blocks on the item lock itself.
        Arc::clone(&self.locks.entry(isbn).or_insert_with(|| Arc::new(RwLock::new(()))))
    }

    /// Acquires shared locks on `isbns` in ascending key order.
    pub fn read_all(&self, isbns: &BTreeSet<Isbn>) -> HeldItemLocks {
        HeldItemLocks {
            guards: isbns
                .iter()
                .map(|isbn| ItemGuard::Shared {
                    _guard: self.lock_for(*isbn).read_arc(),
                })
                .collect(),
        }
    }

    /// Acquires exclusive locks on `isbns` in ascending key order.
    pub fn write_all(&self, isbns: &BTreeSet<Isbn>) -> HeldItemLocks {
        HeldItemLocks {
            guards: isbns
                .iter()
                .map(|isbn| ItemGuard::Exclusive {
                    _guard: self.lock_for(*isbn).write_arc(),
                })
                .collect(),
        }
    }
}

/// Held only for its drop.
enum ItemGuard {
    Shared { _guard: ArcRwLockReadGuard<RawRwLock, ()> },
    Exclusive { _guard: ArcRwLockWriteGuard<RawRwLock, ()> },
}

/// Item locks held by one call. Dropping it releases them all.
#[must_use = "item locks are released as soon as this is dropped"]
pub struct HeldItemLocks {
    guards: Vec<ItemGuard>,
}

impl HeldItemLocks {
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    pub fn exclusive_count(&self) -> usize {
        self.guards
            .iter()
            .filter(|g| matches!(g, ItemGuard::Exclusive { .. }))
            .count()
    }
}

impl core::fmt::Debug for HeldItemLocks {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HeldItemLocks")
            .field("held", &self.guards.len())
            .field("exclusive", &self.exclusive_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn keys(raw: &[i64]) -> BTreeSet<Isbn> {
        raw.iter().copied().map(Isbn::new).collect()
    }

    #[test]
    fn same_key_yields_same_lock() {
        let registry = ItemLockRegistry::new();
        let a = registry.lock_for(Isbn::new(1));
        let b = registry.lock_for(Isbn::new(1));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn concurrent_first_access_creates_one_lock() {
        let registry = Arc::new(ItemLockRegistry::new());
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry.lock_for(Isbn::new(99))
                })
            })
            .collect();

        let locks: Vec<ItemLock> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(locks.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn shared_locks_coexist() {
        let registry = ItemLockRegistry::new();
        let first = registry.read_all(&keys(&[1, 2]));
        let second = registry.read_all(&keys(&[2, 3]));
        assert_eq!(first.len(), 2);
        assert_eq!(second.exclusive_count(), 0);
    }

    #[test]
    fn exclusive_lock_blocks_until_released() {
        let registry = Arc::new(ItemLockRegistry::new());
        let held = registry.write_all(&keys(&[5]));
        assert_eq!(held.exclusive_count(), 1);

        let (tx, rx) = mpsc::channel();
        let waiter = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let _shared = registry.read_all(&keys(&[5]));
                tx.send(()).unwrap();
            })
        };

        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        drop(held);
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        waiter.join().unwrap();
    }

    #[test]
    fn acquiring_creates_missing_locks() {
        let registry = ItemLockRegistry::new();
        let held = registry.write_all(&keys(&[1, 2]));
        assert!(registry.contains(Isbn::new(1)));
        assert!(registry.contains(Isbn::new(2)));
        assert_eq!(held.exclusive_count(), 2);
        drop(held);

        let held = registry.read_all(&keys(&[2, 3]));
        assert_eq!((held.len(), held.exclusive_count()), (2, 0));
        assert_eq!(registry.len(), 3);
    }
}
