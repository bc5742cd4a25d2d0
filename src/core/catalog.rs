//! Catalog service: the operations the outside world calls.
//!
//! Adding a book resolves its cover first and then persists the book and
//! its note as one unit. Editing merges the submitted fields over the
//! stored entry before writing. Reads and deletes go straight to the store.

use thiserror::Error;
use tracing::{info, instrument};

use crate::adapters::LookupError;
use crate::domain::{BookEdit, BookEntry, BookId, ListOrder, NewBook};
use crate::store::{BookStore, EntryFilter, StoreError};

use super::cover::CoverResolver;

/// Errors surfaced by catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Book not found: {0}")]
    NotFound(BookId),

    /// Only raised when the resolver runs with `strict_search`
    #[error("Lookup service unavailable: {0}")]
    LookupUnavailable(#[from] LookupError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Orchestrates cover resolution and the record store
#[derive(Clone)]
pub struct CatalogService {
    store: BookStore,
    resolver: CoverResolver,
}

impl CatalogService {
    pub fn new(store: BookStore, resolver: CoverResolver) -> Self {
        Self { store, resolver }
    }

    pub fn store(&self) -> &BookStore {
        &self.store
    }

    /// Add a book with its note and return the new id
    #[instrument(skip(self, book), fields(title = %book.title, author = %book.author))]
    pub async fn add_book(&self, book: NewBook) -> CatalogResult<BookId> {
        let cover = self.resolver.resolve(&book.title, &book.author).await?;
        let has_cover = cover.is_some();

        let id = self.store.create(book, cover).await?;

        info!(%id, has_cover, "Book added");
        Ok(id)
    }

    /// Merge `edit` over the stored entry and persist the result
    #[instrument(skip(self, edit))]
    pub async fn edit_book(&self, id: BookId, edit: BookEdit) -> CatalogResult<BookEntry> {
        let updated = self
            .store
            .edit(id, move |current| edit.merge_onto(current))
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        info!(%id, "Book updated");
        Ok(updated)
    }

    /// One joined entry
    pub async fn get_book(&self, id: BookId) -> CatalogResult<BookEntry> {
        self.store
            .get(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Every entry in `order`
    pub async fn list(&self, order: ListOrder) -> CatalogResult<Vec<BookEntry>> {
        Ok(self.store.query(EntryFilter::All, order).await?)
    }

    /// Most recently read first
    pub async fn list_by_recency(&self) -> CatalogResult<Vec<BookEntry>> {
        self.list(ListOrder::Recency).await
    }

    /// Lowest rating first
    pub async fn list_by_rating(&self) -> CatalogResult<Vec<BookEntry>> {
        self.list(ListOrder::Rating).await
    }

    /// Case-insensitive substring search over title, author and genre
    pub async fn search(&self, query: &str) -> CatalogResult<Vec<BookEntry>> {
        Ok(self
            .store
            .query(EntryFilter::Search(query.to_string()), ListOrder::Added)
            .await?)
    }

    /// Delete a book together with its note
    #[instrument(skip(self))]
    pub async fn delete_book(&self, id: BookId) -> CatalogResult<()> {
        if !self.store.delete(id).await? {
            return Err(CatalogError::NotFound(id));
        }

        info!(%id, "Book deleted");
        Ok(())
    }
}
