//! Record store for books and their reading notes.
//!
//! SQLite-backed, two tables joined on `notes.book_id`:
//!
//! ```text
//! books (id, title, author, genre, description, cover_id)
//! notes (id, book_id -> books.id, read_date, rating, notes)
//! ```
//!
//! Every multi-row read is the Book ⋈ Note inner join, so a book without a
//! note is never returned. Foreign keys are enforced, which is why deletion
//! removes the note before the book.

pub mod book_store;
pub mod schema;

use thiserror::Error;

pub use book_store::{
    delete_book, delete_note, insert_book, insert_note, query_entries, update_book, update_note,
    BookStore, EntryFilter,
};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Store connection lock poisoned")]
    Poisoned,
}
