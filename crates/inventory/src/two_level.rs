//! Two-level locking store.
//!
//! Protocol, per call:
//!
//! 1. Take the global lock: shared for reads, exclusive for any mutation.
//! 2. Validate the whole batch against the catalog. Nothing is mutated yet.
//! 3. Take the item lock of every key the batch touches, in ascending key
//!    order: shared for reads, exclusive for mutation.
//! 4. Read or apply.
//! 5. Release item locks, then the global lock.
//!
//! Every mutation holds the global lock exclusively, so mutations are totally
//! ordered and a reader never sees a partially applied batch. Item locks are
//! always taken after the global lock and in one canonical order, so no two
//! callers can wait on each other in a cycle.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use stockroom_core::{
    Book, BookCopy, BookEditorPick, BookRating, Isbn, StockBook, StoreError, StoreResult,
};

use crate::catalog::{Catalog, ValidBatch, listing_size};
use crate::config::StoreConfig;
use crate::item_locks::ItemLockRegistry;
use crate::store::{BookStore, StockManager};

fn rejected(op: &'static str, err: &StoreError) {
    tracing::debug!(op, kind = ?err.kind(), "rejected: {err}");
}

#[derive(Debug)]
pub struct TwoLevelLockingStore {
    /// Global coordination lock; guards the key set and every record.
    catalog: RwLock<Catalog>,
    item_locks: ItemLockRegistry,
    ratings: RangeInclusive<u64>,
    sampler: Mutex<StdRng>,
}

impl Default for TwoLevelLockingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TwoLevelLockingStore {
    pub fn new() -> Self {
        Self::with_config(&StoreConfig::default())
    }

    pub fn with_config(config: &StoreConfig) -> Self {
        Self {
            catalog: RwLock::new(Catalog::new()),
            item_locks: ItemLockRegistry::new(),
            ratings: config.rating_range(),
            sampler: Mutex::new(config.sampler()),
        }
    }

    pub fn item_locks(&self) -> &ItemLockRegistry {
        &self.item_locks
    }

    /// Keyed or structural mutation under the exclusive global lock.
    fn mutate<T, R>(
        &self,
        op: &'static str,
        validate: impl FnOnce(&Catalog) -> StoreResult<ValidBatch<T>>,
        apply: impl FnOnce(&mut Catalog, ValidBatch<T>) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let mut catalog = self.catalog.write();
        let batch = validate(&*catalog).inspect_err(|e| rejected(op, e))?;
        let count = batch.len();
        // Declared after `catalog`, so released before it.
        let _items = self.item_locks.write_all(&batch.keys());
        let out = apply(&mut *catalog, batch)?;
        tracing::debug!(op, count, "applied");
        Ok(out)
    }

    /// Read over every record under shared global and item locks.
    fn read_all<R>(&self, read: impl FnOnce(&Catalog) -> R) -> R {
        let catalog = self.catalog.read();
        let keys: BTreeSet<Isbn> = catalog.isbns().collect();
        let _items = self.item_locks.read_all(&keys);
        read(&*catalog)
    }

    /// Read over a validated subset of records.
    fn read_keys<R>(
        &self,
        op: &'static str,
        isbns: &[Isbn],
        read: impl FnOnce(&Catalog, &ValidBatch<()>) -> R,
    ) -> StoreResult<R> {
        let catalog = self.catalog.read();
        let batch = catalog.validate_lookup(isbns).inspect_err(|e| rejected(op, e))?;
        let _items = self.item_locks.read_all(&batch.keys());
        Ok(read(&*catalog, &batch))
    }
}

impl StockManager for TwoLevelLockingStore {
    fn add_books(&self, books: &[StockBook]) -> StoreResult<()> {
        // Locking the new keys creates their item locks.
        self.mutate(
            "add_books",
            |c| c.validate_new_books(books),
            |c, batch| {
                c.apply_new_books(batch);
                Ok(())
            },
        )
    }

    fn add_copies(&self, copies: &[BookCopy]) -> StoreResult<()> {
        self.mutate(
            "add_copies",
            |c| c.validate_restock(copies),
            |c, batch| {
                c.apply_add_copies(&batch);
                Ok(())
            },
        )
    }

    fn get_books_snapshot(&self) -> Vec<StockBook> {
        self.read_all(Catalog::snapshot)
    }

    fn get_books_by_isbn(&self, isbns: &[Isbn]) -> StoreResult<Vec<StockBook>> {
        self.read_keys("get_books_by_isbn", isbns, |c, batch| {
            c.lookup(batch).map(|r| r.to_stock_book()).collect()
        })
    }

    fn get_books_in_demand(&self) -> Vec<StockBook> {
        self.read_all(Catalog::in_demand)
    }

    fn update_editor_picks(&self, picks: &[BookEditorPick]) -> StoreResult<()> {
        self.mutate(
            "update_editor_picks",
            |c| c.validate_editor_picks(picks),
            |c, batch| {
                c.apply_editor_picks(&batch);
                Ok(())
            },
        )
    }

    fn remove_books(&self, isbns: &[Isbn]) -> StoreResult<()> {
        self.mutate(
            "remove_books",
            |c| c.validate_removals(isbns),
            |c, batch| {
                c.apply_removals(&batch);
                Ok(())
            },
        )
    }

    fn remove_all_books(&self) {
        let mut catalog = self.catalog.write();
        let removed = catalog.len();
        catalog.clear();
        tracing::debug!(op = "remove_all_books", removed, "applied");
    }
}

impl BookStore for TwoLevelLockingStore {
    fn buy_books(&self, copies: &[BookCopy]) -> StoreResult<()> {
        self.mutate(
            "buy_books",
            |c| c.validate_copies(copies),
            |c, batch| {
                c.apply_buy(&batch).inspect_err(|e| {
                    if let StoreError::InsufficientStock { short } = e {
                        tracing::warn!(?short, "purchase rejected; sale misses recorded");
                    }
                })
            },
        )
    }

    fn get_books(&self, isbns: &[Isbn]) -> StoreResult<Vec<Book>> {
        self.read_keys("get_books", isbns, |c, batch| {
            c.lookup(batch).map(|r| r.to_book()).collect()
        })
    }

    fn get_editor_picks(&self, n: i64) -> StoreResult<Vec<Book>> {
        let n = listing_size(n).inspect_err(|e| rejected("get_editor_picks", e))?;
        Ok(self.read_all(|c| c.sample_editor_picks(n, &mut *self.sampler.lock())))
    }

    fn get_top_rated_books(&self, n: i64) -> StoreResult<Vec<Book>> {
        let n = listing_size(n).inspect_err(|e| rejected("get_top_rated_books", e))?;
        Ok(self.read_all(|c| c.top_rated(n)))
    }

    fn rate_books(&self, ratings: &[BookRating]) -> StoreResult<()> {
        self.mutate(
            "rate_books",
            |c| c.validate_ratings(ratings, &self.ratings),
            |c, batch| {
                c.apply_ratings(&batch);
                Ok(())
            },
        )
    }
}
