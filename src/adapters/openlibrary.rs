//! Open Library adapter.
//!
//! Searches `search.json` for editions and probes the covers endpoint with
//! `?default=false`, which answers 404 instead of a placeholder image when
//! an edition has no cover.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{CoverLookup, LookupError};
use crate::domain::{CoverId, CoverSize};

pub const DEFAULT_SEARCH_URL: &str = "https://openlibrary.org/search.json";
pub const DEFAULT_COVERS_URL: &str = "https://covers.openlibrary.org";

/// Connection settings for the Open Library client
#[derive(Debug, Clone)]
pub struct OpenLibraryConfig {
    pub search_url: String,
    pub covers_url: String,
    pub timeout: Duration,
}

impl Default for OpenLibraryConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            covers_url: DEFAULT_COVERS_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Search response; only the fields the resolver needs
#[derive(Debug, Deserialize)]
struct SearchResponse {
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    #[serde(default)]
    edition_key: Vec<String>,
}

/// Open Library HTTP client
pub struct OpenLibraryClient {
    config: OpenLibraryConfig,
    client: reqwest::Client,
}

impl OpenLibraryClient {
    /// Create a new client
    pub fn new(config: OpenLibraryConfig) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("bookshelf/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { config, client })
    }

    /// URL probed for a candidate
    fn probe_url(&self, candidate: &CoverId) -> String {
        candidate.image_url(&self.config.covers_url, CoverSize::Medium)
    }
}

/// Edition keys of the first matching document, in the order given
fn candidates_from(body: &str) -> Result<Vec<CoverId>, LookupError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| LookupError::Malformed(e.to_string()))?;

    Ok(response
        .docs
        .into_iter()
        .next()
        .map(|doc| doc.edition_key.into_iter().map(CoverId::new).collect())
        .unwrap_or_default())
}

#[async_trait]
impl CoverLookup for OpenLibraryClient {
    fn name(&self) -> &str {
        "openlibrary"
    }

    async fn search_editions(
        &self,
        title: &str,
        author: &str,
    ) -> Result<Vec<CoverId>, LookupError> {
        let response = self
            .client
            .get(&self.config.search_url)
            .query(&[("title", title), ("author_name", author)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                status: status.as_u16(),
                url: self.config.search_url.clone(),
            });
        }

        let body = response.text().await?;
        candidates_from(&body)
    }

    async fn probe_cover(&self, candidate: &CoverId) -> Result<(), LookupError> {
        let url = self.probe_url(candidate);
        let response = self
            .client
            .get(&url)
            .query(&[("default", "false")])
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(LookupError::NotFound(candidate.to_string())),
            status => Err(LookupError::Status {
                status: status.as_u16(),
                url,
            }),
        }
    }
}
