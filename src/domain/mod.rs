//! Domain types for the book catalog.
//!
//! This module contains the core data structures:
//! - Book and Note: the two persisted entities
//! - BookEntry: the joined row every read returns
//! - BookEdit: partial updates and their merge rules

pub mod book;

// Re-export commonly used types
pub use book::{
    Book, BookEdit, BookEntry, BookId, CoverId, CoverSize, ListOrder, NewBook, Note,
};
