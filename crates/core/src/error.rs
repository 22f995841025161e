//! Store error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::isbn::Isbn;

/// Result type used across the store.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error.
///
/// Every variant is a deterministic validation or business failure. A batch
/// call that returns one of these has not mutated any record (purchase sale
/// misses aside).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A required input field was absent (e.g. blank title).
    #[error("missing input: {0}")]
    MissingInput(String),

    /// The identifier is malformed.
    #[error("invalid isbn: {0}")]
    InvalidKey(Isbn),

    /// The identifier is well-formed but not in the store.
    #[error("isbn {0} not found")]
    KeyNotFound(Isbn),

    /// An insert targets a key that already exists (or appears twice in the batch).
    #[error("isbn {0} already exists")]
    DuplicateKey(Isbn),

    /// A quantity was zero or negative where a positive one is required, a
    /// price was negative, or a restock would exceed the representable stock.
    #[error("invalid quantity {quantity} for isbn {isbn}")]
    InvalidQuantity { isbn: Isbn, quantity: i64 },

    /// A rating fell outside the accepted range.
    #[error("invalid rating {rating} for isbn {isbn}")]
    InvalidRating { isbn: Isbn, rating: i64 },

    /// A purchase asked for more copies than are in stock.
    #[error("insufficient stock for {} isbn(s)", short.len())]
    InsufficientStock { short: Vec<Isbn> },

    /// A non-key argument was malformed or out of range (negative listing size).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl StoreError {
    pub fn missing(msg: impl Into<String>) -> Self {
        Self::MissingInput(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_quantity(isbn: Isbn, quantity: i64) -> Self {
        Self::InvalidQuantity { isbn, quantity }
    }

    pub fn invalid_rating(isbn: Isbn, rating: i64) -> Self {
        Self::InvalidRating { isbn, rating }
    }

    /// Failure kind without payload, for callers that only branch on the kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::MissingInput(_) => ErrorKind::NullOrMissingInput,
            StoreError::InvalidKey(_) => ErrorKind::InvalidKey,
            StoreError::KeyNotFound(_) => ErrorKind::KeyNotFound,
            StoreError::DuplicateKey(_) => ErrorKind::DuplicateKey,
            StoreError::InvalidQuantity { .. } => ErrorKind::InvalidQuantity,
            StoreError::InvalidRating { .. } => ErrorKind::InvalidRating,
            StoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            StoreError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }
}

/// Wire-stable failure kind reported back across the transport boundary.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NullOrMissingInput,
    InvalidKey,
    KeyNotFound,
    DuplicateKey,
    InvalidQuantity,
    InvalidRating,
    InsufficientStock,
    InvalidArgument,
}
