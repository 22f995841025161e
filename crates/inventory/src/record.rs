use stockroom_core::{Book, Isbn, StockBook};

/// Largest stock a record may hold; the views report copies as `i64`.
pub const MAX_COPIES: u64 = i64::MAX as u64;

/// Mutable per-key state held by the store.
///
/// Descriptive fields are fixed at creation; only the counters and the
/// editor-pick flag change afterwards. Counters are unsigned, so a record can
/// never report negative stock or telemetry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    isbn: Isbn,
    title: String,
    author: String,
    price: i64,
    num_copies: u64,
    sale_misses: u64,
    total_rating: u64,
    times_rated: u64,
    editor_pick: bool,
}

impl BookRecord {
    /// Builds a record from an already-validated book listing.
    pub(crate) fn from_stock_book(book: &StockBook, num_copies: u64) -> Self {
        Self {
            isbn: book.isbn,
            title: book.title.clone(),
            author: book.author.clone(),
            price: book.price,
            num_copies,
            sale_misses: book.sale_misses,
            total_rating: book.total_rating,
            times_rated: book.times_rated,
            editor_pick: book.editor_pick,
        }
    }

    pub fn isbn(&self) -> Isbn {
        self.isbn
    }

    pub fn num_copies(&self) -> u64 {
        self.num_copies
    }

    pub fn sale_misses(&self) -> u64 {
        self.sale_misses
    }

    pub fn total_rating(&self) -> u64 {
        self.total_rating
    }

    pub fn times_rated(&self) -> u64 {
        self.times_rated
    }

    pub fn editor_pick(&self) -> bool {
        self.editor_pick
    }

    pub fn has_copies(&self, requested: u64) -> bool {
        self.num_copies >= requested
    }

    /// Copies missing to satisfy `requested`, or `None` if enough are in stock.
    pub fn shortfall(&self, requested: u64) -> Option<u64> {
        requested
            .checked_sub(self.num_copies)
            .filter(|missing| *missing > 0)
    }

    /// Room left before the record reaches [`MAX_COPIES`].
    pub fn restock_headroom(&self) -> u64 {
        MAX_COPIES - self.num_copies
    }

    /// Callers must check [`restock_headroom`](Self::restock_headroom) first.
    pub(crate) fn add_copies(&mut self, copies: u64) {
        debug_assert!(copies <= self.restock_headroom());
        self.num_copies += copies;
    }

    /// Callers must check [`has_copies`](Self::has_copies) first.
    pub(crate) fn buy_copies(&mut self, copies: u64) {
        debug_assert!(self.has_copies(copies));
        self.num_copies -= copies;
    }

    pub(crate) fn add_sale_miss(&mut self, missing: u64) {
        self.sale_misses = self.sale_misses.saturating_add(missing);
    }

    pub(crate) fn add_rating(&mut self, rating: u64) {
        self.total_rating = self.total_rating.saturating_add(rating);
        self.times_rated = self.times_rated.saturating_add(1);
    }

    pub(crate) fn set_editor_pick(&mut self, editor_pick: bool) {
        self.editor_pick = editor_pick;
    }

    /// Orders two records by average rating without going through floats.
    ///
    /// Unrated records sort below every rated one.
    pub fn cmp_rating(&self, other: &Self) -> core::cmp::Ordering {
        match (self.times_rated, other.times_rated) {
            (0, 0) => core::cmp::Ordering::Equal,
            (0, _) => core::cmp::Ordering::Less,
            (_, 0) => core::cmp::Ordering::Greater,
            (a_count, b_count) => {
                let lhs = u128::from(self.total_rating) * u128::from(b_count);
                let rhs = u128::from(other.total_rating) * u128::from(a_count);
                lhs.cmp(&rhs)
            }
        }
    }

    pub fn to_stock_book(&self) -> StockBook {
        StockBook {
            isbn: self.isbn,
            title: self.title.clone(),
            author: self.author.clone(),
            price: self.price,
            // Bounded by MAX_COPIES.
            num_copies: self.num_copies as i64,
            sale_misses: self.sale_misses,
            total_rating: self.total_rating,
            times_rated: self.times_rated,
            editor_pick: self.editor_pick,
        }
    }

    pub fn to_book(&self) -> Book {
        Book {
            isbn: self.isbn,
            title: self.title.clone(),
            author: self.author.clone(),
            price: self.price,
            total_rating: self.total_rating,
            times_rated: self.times_rated,
            editor_pick: self.editor_pick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cmp::Ordering;

    fn record(isbn: i64, copies: u64) -> BookRecord {
        BookRecord::from_stock_book(&StockBook::new(isbn, "Title", "Author", 1000, 1), copies)
    }

    #[test]
    fn shortfall_is_requested_minus_available() {
        let r = record(1, 5);
        assert_eq!(r.shortfall(5), None);
        assert_eq!(r.shortfall(3), None);
        assert_eq!(r.shortfall(8), Some(3));
    }

    #[test]
    fn buying_and_restocking_adjust_copies() {
        let mut r = record(1, 5);
        r.buy_copies(5);
        assert_eq!(r.num_copies(), 0);
        r.add_copies(4);
        assert_eq!(r.num_copies(), 4);
    }

    #[test]
    fn headroom_shrinks_towards_the_reportable_maximum() {
        let mut r = record(1, 1);
        assert_eq!(r.restock_headroom(), MAX_COPIES - 1);
        r.add_copies(MAX_COPIES - 1);
        assert_eq!(r.restock_headroom(), 0);
        assert_eq!(r.to_stock_book().num_copies, i64::MAX);
    }

    #[test]
    fn ratings_accumulate() {
        let mut r = record(1, 1);
        r.add_rating(5);
        r.add_rating(2);
        assert_eq!(r.total_rating(), 7);
        assert_eq!(r.times_rated(), 2);
        assert_eq!(r.to_book().average_rating(), Some(3.5));
    }

    #[test]
    fn rating_order_uses_exact_averages() {
        let mut a = record(1, 1);
        let mut b = record(2, 1);
        let unrated = record(3, 1);

        // 2/3 vs 4/6: equal averages.
        a.add_rating(2);
        a.add_rating(0);
        a.add_rating(0);
        for r in [1, 1, 1, 1, 0, 0] {
            b.add_rating(r);
        }
        assert_eq!(a.cmp_rating(&b), Ordering::Equal);

        b.add_rating(5);
        assert_eq!(a.cmp_rating(&b), Ordering::Less);
        assert_eq!(unrated.cmp_rating(&a), Ordering::Less);
        assert_eq!(unrated.cmp_rating(&unrated.clone()), Ordering::Equal);
    }

    #[test]
    fn stock_view_round_trips_listing() {
        let mut listing = StockBook::new(11, "Title", "Author", 1999, 3);
        listing.sale_misses = 4;
        listing.editor_pick = true;
        let r = BookRecord::from_stock_book(&listing, 3);
        assert_eq!(r.to_stock_book(), listing);
    }
}
