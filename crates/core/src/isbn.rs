//! Record key.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Catalog number of a book.
///
/// Any integer can be carried around; only positive ones are well-formed and
/// the store rejects the rest with [`StoreError::InvalidKey`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Isbn(i64);

impl Isbn {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 >= 1
    }

    /// Returns `self` if well-formed.
    pub fn validate(self) -> Result<Self, StoreError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(StoreError::InvalidKey(self))
        }
    }
}

impl core::fmt::Display for Isbn {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for Isbn {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Isbn> for i64 {
    fn from(value: Isbn) -> Self {
        value.0
    }
}

impl FromStr for Isbn {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = i64::from_str(s.trim())
            .map_err(|e| StoreError::invalid_argument(format!("Isbn: {e}")))?;
        Self(raw).validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_positive_values_are_valid() {
        assert!(Isbn::new(1).is_valid());
        assert!(!Isbn::new(0).is_valid());
        assert!(!Isbn::new(-5).is_valid());
        assert_eq!(Isbn::new(-5).validate(), Err(StoreError::InvalidKey(Isbn::new(-5))));
    }

    #[test]
    fn parses_and_validates() {
        assert_eq!(" 3044560 ".parse::<Isbn>(), Ok(Isbn::new(3_044_560)));
        assert_eq!("0".parse::<Isbn>(), Err(StoreError::InvalidKey(Isbn::new(0))));
        assert!(matches!(
            "abc".parse::<Isbn>(),
            Err(StoreError::InvalidArgument(_))
        ));
    }
}
