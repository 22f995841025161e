//! Plain data holders exchanged with the store.
//!
//! These carry no behaviour beyond simple derived values; all validation
//! happens in the store against its current state.

use serde::{Deserialize, Serialize};

use crate::isbn::Isbn;

fn average(total_rating: u64, times_rated: u64) -> Option<f64> {
    if times_rated == 0 {
        None
    } else {
        Some(total_rating as f64 / times_rated as f64)
    }
}

/// Stock-manager view of a record; also the input for a new listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockBook {
    pub isbn: Isbn,
    pub title: String,
    pub author: String,
    /// Price in cents.
    pub price: i64,
    pub num_copies: i64,
    #[serde(default)]
    pub sale_misses: u64,
    #[serde(default)]
    pub total_rating: u64,
    #[serde(default)]
    pub times_rated: u64,
    #[serde(default)]
    pub editor_pick: bool,
}

impl StockBook {
    /// A fresh book with no telemetry.
    pub fn new(
        isbn: impl Into<Isbn>,
        title: impl Into<String>,
        author: impl Into<String>,
        price: i64,
        num_copies: i64,
    ) -> Self {
        Self {
            isbn: isbn.into(),
            title: title.into(),
            author: author.into(),
            price,
            num_copies,
            sale_misses: 0,
            total_rating: 0,
            times_rated: 0,
            editor_pick: false,
        }
    }

    pub fn average_rating(&self) -> Option<f64> {
        average(self.total_rating, self.times_rated)
    }
}

/// Client view of a record: descriptive fields and rating, no stock counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Book {
    pub isbn: Isbn,
    pub title: String,
    pub author: String,
    pub price: i64,
    pub total_rating: u64,
    pub times_rated: u64,
    pub editor_pick: bool,
}

impl Book {
    pub fn average_rating(&self) -> Option<f64> {
        average(self.total_rating, self.times_rated)
    }
}

impl From<StockBook> for Book {
    fn from(b: StockBook) -> Self {
        Self {
            isbn: b.isbn,
            title: b.title,
            author: b.author,
            price: b.price,
            total_rating: b.total_rating,
            times_rated: b.times_rated,
            editor_pick: b.editor_pick,
        }
    }
}

/// A number of copies of one book, used for both restock and purchase.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookCopy {
    pub isbn: Isbn,
    pub num_copies: i64,
}

impl BookCopy {
    pub fn new(isbn: impl Into<Isbn>, num_copies: i64) -> Self {
        Self {
            isbn: isbn.into(),
            num_copies,
        }
    }
}

/// One customer rating.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookRating {
    pub isbn: Isbn,
    pub rating: i64,
}

impl BookRating {
    pub fn new(isbn: impl Into<Isbn>, rating: i64) -> Self {
        Self {
            isbn: isbn.into(),
            rating,
        }
    }
}

/// Sets or clears the editor-pick (promoted) flag of one book.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookEditorPick {
    pub isbn: Isbn,
    pub editor_pick: bool,
}

impl BookEditorPick {
    pub fn new(isbn: impl Into<Isbn>, editor_pick: bool) -> Self {
        Self {
            isbn: isbn.into(),
            editor_pick,
        }
    }
}
