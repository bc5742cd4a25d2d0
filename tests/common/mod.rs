//! Shared test helpers: an in-process lookup fake and entry builders.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bookshelf::adapters::{CoverLookup, LookupError};
use bookshelf::core::{CatalogService, CoverResolver, ResolverPolicy};
use bookshelf::domain::{CoverId, NewBook};
use bookshelf::store::BookStore;
use chrono::NaiveDate;

/// Lookup fake with scripted candidates and cover availability
#[derive(Default)]
pub struct FakeLookup {
    /// None makes every search fail
    candidates: Option<Vec<String>>,
    covers: HashSet<String>,
    delays: HashMap<String, Duration>,
    searches: Mutex<Vec<(String, String)>>,
    probed: Mutex<Vec<String>>,
}

impl FakeLookup {
    pub fn with_candidates(candidates: &[&str]) -> Self {
        Self {
            candidates: Some(candidates.iter().map(|c| c.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_cover(mut self, candidate: &str) -> Self {
        self.covers.insert(candidate.to_string());
        self
    }

    /// Delay the probe of `candidate`
    pub fn with_delay(mut self, candidate: &str, delay: Duration) -> Self {
        self.delays.insert(candidate.to_string(), delay);
        self
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }

    pub fn searches(&self) -> Vec<(String, String)> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl CoverLookup for FakeLookup {
    fn name(&self) -> &str {
        "fake"
    }

    async fn search_editions(
        &self,
        title: &str,
        author: &str,
    ) -> Result<Vec<CoverId>, LookupError> {
        self.searches
            .lock()
            .unwrap()
            .push((title.to_string(), author.to_string()));

        match &self.candidates {
            Some(candidates) => Ok(candidates.iter().map(CoverId::new).collect()),
            None => Err(LookupError::Status {
                status: 503,
                url: "fake://search".to_string(),
            }),
        }
    }

    async fn probe_cover(&self, candidate: &CoverId) -> Result<(), LookupError> {
        self.probed.lock().unwrap().push(candidate.to_string());

        if let Some(delay) = self.delays.get(candidate.as_str()) {
            tokio::time::sleep(*delay).await;
        }

        if self.covers.contains(candidate.as_str()) {
            Ok(())
        } else {
            Err(LookupError::NotFound(candidate.to_string()))
        }
    }
}

/// Catalog over an in-memory store and the given lookup
pub async fn service_with(lookup: Arc<FakeLookup>, policy: ResolverPolicy) -> CatalogService {
    let store = BookStore::open_in_memory().await.unwrap();
    CatalogService::new(store, CoverResolver::with_policy(lookup, policy))
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn new_book(title: &str, author: &str, genre: &str, read: &str, rating: i64) -> NewBook {
    NewBook {
        title: title.to_string(),
        author: author.to_string(),
        genre: genre.to_string(),
        description: format!("About {}", title),
        read_date: date(read),
        rating,
        notes: format!("Notes on {}", title),
    }
}
