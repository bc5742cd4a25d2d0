//! bookshelf - Personal book catalog
//!
//! Record the books you have read with a date, a rating and notes, then
//! browse, search, sort and edit them. New books get a cover image
//! resolved from Open Library when one exists.
//!
//! # Architecture
//!
//! - Every read is the Book ⋈ Note inner join (`BookEntry`)
//! - Adding resolves a cover first, then writes book and note in one transaction
//! - Editing merges submitted fields over the stored entry (blank keeps the old value)
//!
//! # Modules
//!
//! - `adapters`: External lookup integration (Open Library)
//! - `core`: Cover resolution and the catalog service
//! - `domain`: Data structures (Book, Note, BookEntry, BookEdit)
//! - `store`: SQLite record store
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Add a book
//! bookshelf add --title "Dune" --author "Frank Herbert" --rating 9
//!
//! # Sort by most recently read
//! bookshelf list --sort recency
//!
//! # Change only the rating
//! bookshelf edit 1 --rating 10
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod store;

// Re-export main types at crate root for convenience
pub use adapters::{CoverLookup, LookupError, OpenLibraryClient, OpenLibraryConfig};
pub use core::{CatalogError, CatalogService, CoverResolver, ResolverPolicy};
pub use domain::{Book, BookEdit, BookEntry, BookId, CoverId, ListOrder, NewBook, Note};
pub use store::{BookStore, StoreError};
