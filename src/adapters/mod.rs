//! Adapter interfaces for external systems.
//!
//! The catalog talks to one external service: a book lookup that can
//! search for editions and confirm that an edition has a cover image.

pub mod openlibrary;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::CoverId;

// Re-export the Open Library adapter
pub use openlibrary::{OpenLibraryClient, OpenLibraryConfig};

/// Errors returned by lookup adapters
#[derive(Debug, Error)]
pub enum LookupError {
    /// The probed resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Trait for external book lookup services
#[async_trait]
pub trait CoverLookup: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Search for editions matching title and author.
    ///
    /// Candidates are returned in the service's relevance order.
    async fn search_editions(&self, title: &str, author: &str)
        -> Result<Vec<CoverId>, LookupError>;

    /// Confirm that a cover image exists for the candidate
    async fn probe_cover(&self, candidate: &CoverId) -> Result<(), LookupError>;
}
