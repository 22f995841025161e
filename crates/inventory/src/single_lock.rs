//! Single-lock store: one reader/writer lock around the whole catalog.
//!
//! Same validation and results as [`TwoLevelLockingStore`](crate::TwoLevelLockingStore),
//! without the item tier. Kept as the baseline the two-level store is measured
//! against.

use std::ops::RangeInclusive;

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use stockroom_core::{
    Book, BookCopy, BookEditorPick, BookRating, Isbn, StockBook, StoreError, StoreResult,
};

use crate::catalog::{Catalog, listing_size};
use crate::config::StoreConfig;
use crate::store::{BookStore, StockManager};

#[derive(Debug)]
pub struct SingleLockStore {
    catalog: RwLock<Catalog>,
    ratings: RangeInclusive<u64>,
    sampler: Mutex<StdRng>,
}

impl Default for SingleLockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SingleLockStore {
    pub fn new() -> Self {
        Self::with_config(&StoreConfig::default())
    }

    pub fn with_config(config: &StoreConfig) -> Self {
        Self {
            catalog: RwLock::new(Catalog::new()),
            ratings: config.rating_range(),
            sampler: Mutex::new(config.sampler()),
        }
    }
}

fn log_outcome<T>(op: &'static str, result: &StoreResult<T>) {
    match result {
        Ok(_) => tracing::debug!(op, "applied"),
        Err(StoreError::InsufficientStock { short }) => {
            tracing::warn!(op, ?short, "purchase rejected; sale misses recorded")
        }
        Err(err) => tracing::debug!(op, kind = ?err.kind(), "rejected: {err}"),
    }
}

impl StockManager for SingleLockStore {
    fn add_books(&self, books: &[StockBook]) -> StoreResult<()> {
        let mut catalog = self.catalog.write();
        let result = catalog
            .validate_new_books(books)
            .map(|batch| catalog.apply_new_books(batch));
        log_outcome("add_books", &result);
        result
    }

    fn add_copies(&self, copies: &[BookCopy]) -> StoreResult<()> {
        let mut catalog = self.catalog.write();
        let result = catalog
            .validate_restock(copies)
            .map(|batch| catalog.apply_add_copies(&batch));
        log_outcome("add_copies", &result);
        result
    }

    fn get_books_snapshot(&self) -> Vec<StockBook> {
        self.catalog.read().snapshot()
    }

    fn get_books_by_isbn(&self, isbns: &[Isbn]) -> StoreResult<Vec<StockBook>> {
        let catalog = self.catalog.read();
        let batch = catalog.validate_lookup(isbns)?;
        Ok(catalog.lookup(&batch).map(|r| r.to_stock_book()).collect())
    }

    fn get_books_in_demand(&self) -> Vec<StockBook> {
        self.catalog.read().in_demand()
    }

    fn update_editor_picks(&self, picks: &[BookEditorPick]) -> StoreResult<()> {
        let mut catalog = self.catalog.write();
        let result = catalog
            .validate_editor_picks(picks)
            .map(|batch| catalog.apply_editor_picks(&batch));
        log_outcome("update_editor_picks", &result);
        result
    }

    fn remove_books(&self, isbns: &[Isbn]) -> StoreResult<()> {
        let mut catalog = self.catalog.write();
        let result = catalog
            .validate_removals(isbns)
            .map(|batch| catalog.apply_removals(&batch));
        log_outcome("remove_books", &result);
        result
    }

    fn remove_all_books(&self) {
        let mut catalog = self.catalog.write();
        let removed = catalog.len();
        catalog.clear();
        tracing::debug!(op = "remove_all_books", removed, "applied");
    }
}

impl BookStore for SingleLockStore {
    fn buy_books(&self, copies: &[BookCopy]) -> StoreResult<()> {
        let mut catalog = self.catalog.write();
        let result = catalog
            .validate_copies(copies)
            .and_then(|batch| catalog.apply_buy(&batch));
        log_outcome("buy_books", &result);
        result
    }

    fn get_books(&self, isbns: &[Isbn]) -> StoreResult<Vec<Book>> {
        let catalog = self.catalog.read();
        let batch = catalog.validate_lookup(isbns)?;
        Ok(catalog.lookup(&batch).map(|r| r.to_book()).collect())
    }

    fn get_editor_picks(&self, n: i64) -> StoreResult<Vec<Book>> {
        let n = listing_size(n)?;
        let catalog = self.catalog.read();
        Ok(catalog.sample_editor_picks(n, &mut *self.sampler.lock()))
    }

    fn get_top_rated_books(&self, n: i64) -> StoreResult<Vec<Book>> {
        let n = listing_size(n)?;
        Ok(self.catalog.read().top_rated(n))
    }

    fn rate_books(&self, ratings: &[BookRating]) -> StoreResult<()> {
        let mut catalog = self.catalog.write();
        let result = catalog
            .validate_ratings(ratings, &self.ratings)
            .map(|batch| catalog.apply_ratings(&batch));
        log_outcome("rate_books", &result);
        result
    }
}
