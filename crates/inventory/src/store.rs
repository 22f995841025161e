//! Operation sets exposed to the transport layer.

use std::sync::Arc;

use stockroom_core::{
    Book, BookCopy, BookEditorPick, BookRating, Isbn, StockBook, StoreResult,
};

/// Customer-facing operations.
pub trait BookStore: Send + Sync {
    /// Buys every requested copy or none. A shortfall still counts as a sale
    /// miss on the short books.
    fn buy_books(&self, copies: &[BookCopy]) -> StoreResult<()>;

    /// Client view of the requested books, in request order.
    fn get_books(&self, isbns: &[Isbn]) -> StoreResult<Vec<Book>>;

    /// Up to `n` editor picks, sampled uniformly without replacement.
    fn get_editor_picks(&self, n: i64) -> StoreResult<Vec<Book>>;

    /// The `n` best-rated books, best first.
    fn get_top_rated_books(&self, n: i64) -> StoreResult<Vec<Book>>;

    fn rate_books(&self, ratings: &[BookRating]) -> StoreResult<()>;
}

/// Stock-manager operations.
pub trait StockManager: Send + Sync {
    fn add_books(&self, books: &[StockBook]) -> StoreResult<()>;

    fn add_copies(&self, copies: &[BookCopy]) -> StoreResult<()>;

    /// Consistent snapshot of every record, in ISBN order.
    fn get_books_snapshot(&self) -> Vec<StockBook>;

    fn get_books_by_isbn(&self, isbns: &[Isbn]) -> StoreResult<Vec<StockBook>>;

    fn get_books_in_demand(&self) -> Vec<StockBook>;

    fn update_editor_picks(&self, picks: &[BookEditorPick]) -> StoreResult<()>;

    fn remove_books(&self, isbns: &[Isbn]) -> StoreResult<()>;

    fn remove_all_books(&self);
}

/// A store serving both customers and stock managers.
pub trait Inventory: BookStore + StockManager {}

impl<S> Inventory for S where S: BookStore + StockManager + ?Sized {}

impl<S> BookStore for Arc<S>
where
    S: BookStore + ?Sized,
{
    fn buy_books(&self, copies: &[BookCopy]) -> StoreResult<()> {
        (**self).buy_books(copies)
    }

    fn get_books(&self, isbns: &[Isbn]) -> StoreResult<Vec<Book>> {
        (**self).get_books(isbns)
    }

    fn get_editor_picks(&self, n: i64) -> StoreResult<Vec<Book>> {
        (**self).get_editor_picks(n)
    }

    fn get_top_rated_books(&self, n: i64) -> StoreResult<Vec<Book>> {
        (**self).get_top_rated_books(n)
    }

    fn rate_books(&self, ratings: &[BookRating]) -> StoreResult<()> {
        (**self).rate_books(ratings)
    }
}

impl<S> StockManager for Arc<S>
where
    S: StockManager + ?Sized,
{
    fn add_books(&self, books: &[StockBook]) -> StoreResult<()> {
        (**self).add_books(books)
    }

    fn add_copies(&self, copies: &[BookCopy]) -> StoreResult<()> {
        (**self).add_copies(copies)
    }

    fn get_books_snapshot(&self) -> Vec<StockBook> {
        (**self).get_books_snapshot()
    }

    fn get_books_by_isbn(&self, isbns: &[Isbn]) -> StoreResult<Vec<StockBook>> {
        (**self).get_books_by_isbn(isbns)
    }

    fn get_books_in_demand(&self) -> Vec<StockBook> {
        (**self).get_books_in_demand()
    }

    fn update_editor_picks(&self, picks: &[BookEditorPick]) -> StoreResult<()> {
        (**self).update_editor_picks(picks)
    }

    fn remove_books(&self, isbns: &[Isbn]) -> StoreResult<()> {
        (**self).remove_books(isbns)
    }

    fn remove_all_books(&self) {
        (**self).remove_all_books()
    }
}
