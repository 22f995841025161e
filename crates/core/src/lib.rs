//! `stockroom-core`: record keys, data holders and the error model.
//!
//! This crate contains **pure domain** types (no locking, no IO).

pub mod book;
pub mod error;
pub mod isbn;

pub use book::{Book, BookCopy, BookEditorPick, BookRating, StockBook};
pub use error::{ErrorKind, StoreError, StoreResult};
pub use isbn::Isbn;
