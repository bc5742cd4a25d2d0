//! Core catalog logic.
//!
//! This module contains:
//! - CoverResolver: ordered fallback search for a cover image
//! - CatalogService: add, edit, read and delete operations

pub mod catalog;
pub mod cover;

// Re-export commonly used types
pub use catalog::{CatalogError, CatalogResult, CatalogService};
pub use cover::{CoverResolver, ResolverPolicy};
