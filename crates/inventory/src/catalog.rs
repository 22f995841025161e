//! Key→record map with the validate-then-mutate passes of every operation.
//!
//! `Catalog` does no locking. Callers hold whatever locks their discipline
//! requires, run a `validate_*` pass (read-only, may fail), acquire item locks
//! for the returned batch's keys, then run the matching `apply_*` pass.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use rand::Rng;
use rand::seq::SliceRandom;
use stockroom_core::{
    Book, BookCopy, BookEditorPick, BookRating, Isbn, StockBook, StoreError, StoreResult,
};

use crate::record::BookRecord;

/// Input that passed validation against the catalog it was checked on.
///
/// Only meaningful while the lock held during validation is still held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidBatch<T> {
    items: Vec<(Isbn, T)>,
}

impl<T> ValidBatch<T> {
    /// Distinct keys in canonical (ascending) order.
    pub fn keys(&self) -> BTreeSet<Isbn> {
        self.items.iter().map(|(isbn, _)| *isbn).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> FromIterator<(Isbn, T)> for ValidBatch<T> {
    fn from_iter<I: IntoIterator<Item = (Isbn, T)>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Converts a non-negative listing size.
pub fn listing_size(n: i64) -> StoreResult<usize> {
    usize::try_from(n)
        .map_err(|_| StoreError::invalid_argument(format!("listing size must be >= 0, got {n}")))
}

/// Every batch operation needs at least one item.
fn require_items<T>(items: &[T], what: &str) -> StoreResult<()> {
    if items.is_empty() {
        Err(StoreError::missing(format!("no {what} given")))
    } else {
        Ok(())
    }
}

fn positive_quantity(isbn: Isbn, quantity: i64) -> StoreResult<u64> {
    match u64::try_from(quantity) {
        Ok(q) if q >= 1 => Ok(q),
        _ => Err(StoreError::invalid_quantity(isbn, quantity)),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Catalog {
    books: BTreeMap<Isbn, BookRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn isbns(&self) -> impl Iterator<Item = Isbn> + '_ {
        self.books.keys().copied()
    }

    pub fn get(&self, isbn: Isbn) -> Option<&BookRecord> {
        self.books.get(&isbn)
    }

    /// Well-formed and present.
    pub fn ensure_in_stock(&self, isbn: Isbn) -> StoreResult<Isbn> {
        let isbn = isbn.validate()?;
        if self.books.contains_key(&isbn) {
            Ok(isbn)
        } else {
            Err(StoreError::KeyNotFound(isbn))
        }
    }

    // ---- insert -----------------------------------------------------------

    pub fn validate_new_books(&self, listings: &[StockBook]) -> StoreResult<ValidBatch<BookRecord>> {
        require_items(listings, "books")?;
        let mut seen = BTreeSet::new();
        listings
            .iter()
            .map(|listing| {
                let isbn = listing.isbn.validate()?;
                if listing.title.trim().is_empty() {
                    return Err(StoreError::missing(format!("title of isbn {isbn}")));
                }
                if listing.author.trim().is_empty() {
                    return Err(StoreError::missing(format!("author of isbn {isbn}")));
                }
                let copies = positive_quantity(isbn, listing.num_copies)?;
                if listing.price < 0 {
                    return Err(StoreError::invalid_quantity(isbn, listing.price));
                }
                if self.books.contains_key(&isbn) || !seen.insert(isbn) {
                    return Err(StoreError::DuplicateKey(isbn));
                }
                Ok((isbn, BookRecord::from_stock_book(listing, copies)))
            })
            .collect()
    }

    pub fn apply_new_books(&mut self, batch: ValidBatch<BookRecord>) {
        for (isbn, record) in batch.items {
            self.books.insert(isbn, record);
        }
    }

    // ---- restock / purchase -----------------------------------------------

    pub fn validate_copies(&self, copies: &[BookCopy]) -> StoreResult<ValidBatch<u64>> {
        require_items(copies, "copies")?;
        copies
            .iter()
            .map(|c| {
                let isbn = self.ensure_in_stock(c.isbn)?;
                Ok((isbn, positive_quantity(isbn, c.num_copies)?))
            })
            .collect()
    }

    /// Restock validation: every key must also have room for the batch's
    /// total delta on top of its current stock.
    pub fn validate_restock(&self, copies: &[BookCopy]) -> StoreResult<ValidBatch<u64>> {
        let batch = self.validate_copies(copies)?;
        let mut added: BTreeMap<Isbn, u64> = BTreeMap::new();
        for (entry, (isbn, quantity)) in copies.iter().zip(&batch.items) {
            let headroom = self.books.get(isbn).map_or(0, BookRecord::restock_headroom);
            let total = added.entry(*isbn).or_default();
            match total.checked_add(*quantity) {
                Some(sum) if sum <= headroom => *total = sum,
                _ => return Err(StoreError::invalid_quantity(*isbn, entry.num_copies)),
            }
        }
        Ok(batch)
    }

    pub fn apply_add_copies(&mut self, batch: &ValidBatch<u64>) {
        for (isbn, copies) in &batch.items {
            if let Some(record) = self.books.get_mut(isbn) {
                record.add_copies(*copies);
            }
        }
    }

    /// Buys every demand or none of them.
    ///
    /// Demands naming the same key are summed. On any shortfall the missing
    /// copies are added to each short record's sale misses, no stock is
    /// taken, and `InsufficientStock` lists the short keys.
    pub fn apply_buy(&mut self, batch: &ValidBatch<u64>) -> StoreResult<()> {
        let mut demand: BTreeMap<Isbn, u64> = BTreeMap::new();
        for (isbn, copies) in &batch.items {
            let total = demand.entry(*isbn).or_default();
            *total = total.saturating_add(*copies);
        }

        let misses: Vec<(Isbn, u64)> = demand
            .iter()
            .filter_map(|(isbn, wanted)| {
                let missing = self.books.get(isbn)?.shortfall(*wanted)?;
                Some((*isbn, missing))
            })
            .collect();

        if !misses.is_empty() {
            for (isbn, missing) in &misses {
                if let Some(record) = self.books.get_mut(isbn) {
                    record.add_sale_miss(*missing);
                }
            }
            return Err(StoreError::InsufficientStock {
                short: misses.into_iter().map(|(isbn, _)| isbn).collect(),
            });
        }

        for (isbn, wanted) in demand {
            if let Some(record) = self.books.get_mut(&isbn) {
                record.buy_copies(wanted);
            }
        }
        Ok(())
    }

    // ---- remove -----------------------------------------------------------

    pub fn validate_removals(&self, isbns: &[Isbn]) -> StoreResult<ValidBatch<()>> {
        require_items(isbns, "isbns")?;
        let mut seen = BTreeSet::new();
        let mut items = Vec::with_capacity(isbns.len());
        for isbn in isbns {
            let isbn = self.ensure_in_stock(*isbn)?;
            if seen.insert(isbn) {
                items.push((isbn, ()));
            }
        }
        Ok(ValidBatch { items })
    }

    pub fn apply_removals(&mut self, batch: &ValidBatch<()>) {
        for (isbn, ()) in &batch.items {
            self.books.remove(isbn);
        }
    }

    pub fn clear(&mut self) {
        self.books.clear();
    }

    // ---- editor picks / ratings -------------------------------------------

    pub fn validate_editor_picks(&self, picks: &[BookEditorPick]) -> StoreResult<ValidBatch<bool>> {
        require_items(picks, "editor picks")?;
        picks
            .iter()
            .map(|p| Ok((self.ensure_in_stock(p.isbn)?, p.editor_pick)))
            .collect()
    }

    pub fn apply_editor_picks(&mut self, batch: &ValidBatch<bool>) {
        for (isbn, pick) in &batch.items {
            if let Some(record) = self.books.get_mut(isbn) {
                record.set_editor_pick(*pick);
            }
        }
    }

    pub fn validate_ratings(
        &self,
        ratings: &[BookRating],
        range: &RangeInclusive<u64>,
    ) -> StoreResult<ValidBatch<u64>> {
        require_items(ratings, "ratings")?;
        ratings
            .iter()
            .map(|r| {
                let isbn = self.ensure_in_stock(r.isbn)?;
                match u64::try_from(r.rating) {
                    Ok(rating) if range.contains(&rating) => Ok((isbn, rating)),
                    _ => Err(StoreError::invalid_rating(isbn, r.rating)),
                }
            })
            .collect()
    }

    pub fn apply_ratings(&mut self, batch: &ValidBatch<u64>) {
        for (isbn, rating) in &batch.items {
            if let Some(record) = self.books.get_mut(isbn) {
                record.add_rating(*rating);
            }
        }
    }

    // ---- reads ------------------------------------------------------------

    pub fn validate_lookup(&self, isbns: &[Isbn]) -> StoreResult<ValidBatch<()>> {
        require_items(isbns, "isbns")?;
        isbns
            .iter()
            .map(|isbn| Ok((self.ensure_in_stock(*isbn)?, ())))
            .collect()
    }

    /// Records of a validated lookup, in request order.
    pub fn lookup<'a>(&'a self, batch: &'a ValidBatch<()>) -> impl Iterator<Item = &'a BookRecord> + 'a {
        batch
            .items
            .iter()
            .filter_map(move |(isbn, ())| self.books.get(isbn))
    }

    pub fn snapshot(&self) -> Vec<StockBook> {
        self.books.values().map(BookRecord::to_stock_book).collect()
    }

    pub fn in_demand(&self) -> Vec<StockBook> {
        self.books
            .values()
            .filter(|r| r.sale_misses() > 0)
            .map(BookRecord::to_stock_book)
            .collect()
    }

    /// Highest average rating first; equal averages fall back to ascending ISBN.
    /// Unrated records are never returned.
    pub fn top_rated(&self, n: usize) -> Vec<Book> {
        let mut rated: Vec<&BookRecord> = self.books.values().filter(|r| r.times_rated() > 0).collect();
        // Iteration is already in ISBN order and the sort is stable.
        rated.sort_by(|a, b| b.cmp_rating(a));
        rated.into_iter().take(n).map(BookRecord::to_book).collect()
    }

    /// Up to `n` distinct editor picks chosen uniformly without replacement.
    pub fn sample_editor_picks<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<Book> {
        let picks: Vec<&BookRecord> = self.books.values().filter(|r| r.editor_pick()).collect();
        if n >= picks.len() {
            return picks.into_iter().map(BookRecord::to_book).collect();
        }
        picks
            .choose_multiple(rng, n)
            .map(|r| r.to_book())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use crate::record::MAX_COPIES;

    fn seeded() -> Catalog {
        let mut catalog = Catalog::new();
        let batch = catalog
            .validate_new_books(&[
                StockBook::new(1, "One", "Author", 1000, 5),
                StockBook::new(2, "Two", "Author", 1200, 10),
                StockBook::new(3, "Three", "Author", 900, 1),
            ])
            .unwrap();
        catalog.apply_new_books(batch);
        catalog
    }

    #[test]
    fn new_books_reject_existing_and_repeated_keys() {
        let catalog = seeded();
        let err = catalog
            .validate_new_books(&[StockBook::new(1, "Again", "Author", 1, 1)])
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateKey(Isbn::new(1)));

        let err = catalog
            .validate_new_books(&[
                StockBook::new(7, "A", "Author", 1, 1),
                StockBook::new(7, "B", "Author", 1, 1),
            ])
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateKey(Isbn::new(7)));
    }

    #[test]
    fn new_books_validate_every_field() {
        let catalog = Catalog::new();
        let cases = [
            (StockBook::new(0, "T", "A", 1, 1), "invalid isbn"),
            (StockBook::new(1, " ", "A", 1, 1), "missing title"),
            (StockBook::new(1, "T", "", 1, 1), "missing author"),
            (StockBook::new(1, "T", "A", 1, 0), "zero copies"),
            (StockBook::new(1, "T", "A", -1, 1), "negative price"),
        ];
        for (listing, why) in cases {
            assert!(catalog.validate_new_books(&[listing]).is_err(), "{why}");
        }
    }

    #[test]
    fn negative_price_is_an_invalid_quantity() {
        let err = Catalog::new()
            .validate_new_books(&[StockBook::new(4, "T", "A", -250, 1)])
            .unwrap_err();
        assert_eq!(err, StoreError::invalid_quantity(Isbn::new(4), -250));
    }

    #[test]
    fn restock_past_the_maximum_is_rejected_whole() {
        let mut catalog = seeded();
        let fill = catalog
            .validate_restock(&[BookCopy::new(1, i64::MAX - 5)])
            .unwrap();
        catalog.apply_add_copies(&fill);
        assert_eq!(catalog.get(Isbn::new(1)).unwrap().num_copies(), MAX_COPIES);

        let err = catalog
            .validate_restock(&[BookCopy::new(2, 1), BookCopy::new(1, 1)])
            .unwrap_err();
        assert_eq!(err, StoreError::invalid_quantity(Isbn::new(1), 1));
    }

    #[test]
    fn restock_sums_repeated_keys_against_headroom() {
        let catalog = seeded();
        let half = i64::MAX / 2;
        let err = catalog
            .validate_restock(&[BookCopy::new(3, half), BookCopy::new(3, half), BookCopy::new(3, 1)])
            .unwrap_err();
        assert_eq!(err, StoreError::invalid_quantity(Isbn::new(3), 1));
        assert!(catalog.validate_restock(&[BookCopy::new(3, half), BookCopy::new(3, half)]).is_ok());
    }

    #[test]
    fn buy_sums_repeated_demands() {
        let mut catalog = seeded();
        let batch = catalog
            .validate_copies(&[BookCopy::new(1, 3), BookCopy::new(1, 3)])
            .unwrap();

        let err = catalog.apply_buy(&batch).unwrap_err();
        assert_eq!(err, StoreError::InsufficientStock { short: vec![Isbn::new(1)] });

        let record = catalog.get(Isbn::new(1)).unwrap();
        assert_eq!(record.num_copies(), 5);
        assert_eq!(record.sale_misses(), 1);
    }

    #[test]
    fn failed_buy_only_touches_sale_misses_of_short_keys() {
        let mut catalog = seeded();
        let batch = catalog
            .validate_copies(&[BookCopy::new(2, 4), BookCopy::new(3, 3)])
            .unwrap();
        assert!(catalog.apply_buy(&batch).is_err());

        assert_eq!(catalog.get(Isbn::new(2)).unwrap().num_copies(), 10);
        assert_eq!(catalog.get(Isbn::new(2)).unwrap().sale_misses(), 0);
        assert_eq!(catalog.get(Isbn::new(3)).unwrap().num_copies(), 1);
        assert_eq!(catalog.get(Isbn::new(3)).unwrap().sale_misses(), 2);
    }

    #[test]
    fn removal_of_repeated_key_is_single() {
        let mut catalog = seeded();
        let batch = catalog
            .validate_removals(&[Isbn::new(2), Isbn::new(2)])
            .unwrap();
        assert_eq!(batch.len(), 1);
        catalog.apply_removals(&batch);
        assert_eq!(catalog.isbns().collect::<Vec<_>>(), vec![Isbn::new(1), Isbn::new(3)]);
    }

    #[test]
    fn ratings_outside_range_are_rejected() {
        let catalog = seeded();
        let range = 0..=5;
        assert!(catalog.validate_ratings(&[BookRating::new(1, 5)], &range).is_ok());
        assert_eq!(
            catalog.validate_ratings(&[BookRating::new(1, 6)], &range),
            Err(StoreError::invalid_rating(Isbn::new(1), 6))
        );
        assert_eq!(
            catalog.validate_ratings(&[BookRating::new(1, -1)], &range),
            Err(StoreError::invalid_rating(Isbn::new(1), -1))
        );
    }

    #[test]
    fn top_rated_breaks_ties_by_isbn() {
        let mut catalog = seeded();
        let batch = catalog
            .validate_ratings(
                &[BookRating::new(3, 4), BookRating::new(1, 4), BookRating::new(2, 5)],
                &(0..=5),
            )
            .unwrap();
        catalog.apply_ratings(&batch);

        let top: Vec<Isbn> = catalog.top_rated(3).into_iter().map(|b| b.isbn).collect();
        assert_eq!(top, vec![Isbn::new(2), Isbn::new(1), Isbn::new(3)]);
        assert_eq!(catalog.top_rated(1).len(), 1);
    }

    #[test]
    fn sample_returns_distinct_picks() {
        let mut catalog = seeded();
        let batch = catalog
            .validate_editor_picks(&[
                BookEditorPick::new(1, true),
                BookEditorPick::new(2, true),
                BookEditorPick::new(3, true),
            ])
            .unwrap();
        catalog.apply_editor_picks(&batch);

        let mut rng = StdRng::seed_from_u64(7);
        let sample = catalog.sample_editor_picks(2, &mut rng);
        assert_eq!(sample.len(), 2);
        assert_ne!(sample[0].isbn, sample[1].isbn);
        assert_eq!(catalog.sample_editor_picks(10, &mut rng).len(), 3);
    }

    #[test]
    fn empty_batches_are_missing_input() {
        let catalog = seeded();
        assert!(matches!(catalog.validate_copies(&[]), Err(StoreError::MissingInput(_))));
        assert!(matches!(
            catalog.validate_ratings(&[], &(0..=5)),
            Err(StoreError::MissingInput(_))
        ));
        assert!(matches!(catalog.validate_lookup(&[]), Err(StoreError::MissingInput(_))));
    }

    #[test]
    fn listing_size_rejects_negative() {
        assert_eq!(listing_size(3), Ok(3));
        assert!(matches!(listing_size(-1), Err(StoreError::InvalidArgument(_))));
    }
}
