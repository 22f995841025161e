//! Concurrent in-memory book inventory.
//!
//! Every public operation is a batch: it validates all of its input against the
//! current state before mutating anything, so a failed call leaves the store as
//! it found it. The one exception is a purchase that runs short, which still
//! records the shortfall as sale misses.

pub mod catalog;
pub mod config;
pub mod item_locks;
pub mod record;
pub mod single_lock;
pub mod store;
pub mod two_level;

pub use catalog::Catalog;
pub use config::{ConfigError, LockStrategy, StoreConfig, build_store};
pub use item_locks::{HeldItemLocks, ItemLockRegistry};
pub use record::BookRecord;
pub use single_lock::SingleLockStore;
pub use store::{BookStore, Inventory, StockManager};
pub use two_level::TwoLevelLockingStore;

pub use stockroom_core::{
    Book, BookCopy, BookEditorPick, BookRating, ErrorKind, Isbn, StockBook, StoreError,
    StoreResult,
};
