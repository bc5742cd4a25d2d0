//! Cover resolution for newly added books.
//!
//! Searches the lookup service once, then probes candidates in the order
//! the service returned them. The first candidate with an existing cover
//! wins. A failed probe is logged and the next candidate is tried; running
//! out of candidates yields "no cover", never an error.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::adapters::{CoverLookup, LookupError};
use crate::domain::CoverId;

/// How the resolver treats the lookup service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverPolicy {
    /// Candidates probed at once. Results are still taken in candidate order.
    pub probe_concurrency: usize,

    /// Propagate a failed search instead of falling back to "no cover"
    pub strict_search: bool,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self {
            probe_concurrency: 1,
            strict_search: false,
        }
    }
}

/// Resolves at most one usable cover id for a title and author
#[derive(Clone)]
pub struct CoverResolver {
    lookup: Arc<dyn CoverLookup>,
    policy: ResolverPolicy,
}

impl CoverResolver {
    pub fn new(lookup: Arc<dyn CoverLookup>) -> Self {
        Self::with_policy(lookup, ResolverPolicy::default())
    }

    pub fn with_policy(lookup: Arc<dyn CoverLookup>, policy: ResolverPolicy) -> Self {
        Self { lookup, policy }
    }

    /// Resolve a cover for `title` by `author`.
    ///
    /// Only a failed search under `strict_search` returns an error.
    #[instrument(skip(self), fields(lookup = self.lookup.name()))]
    pub async fn resolve(&self, title: &str, author: &str) -> Result<Option<CoverId>, LookupError> {
        let candidates = match self.lookup.search_editions(title, author).await {
            Ok(candidates) => candidates,
            Err(e) if self.policy.strict_search => return Err(e),
            Err(e) => {
                warn!(error = %e, "Cover search failed, continuing without a cover");
                return Ok(None);
            }
        };

        debug!(candidates = candidates.len(), "Cover search returned");

        let cover = if self.policy.probe_concurrency <= 1 {
            self.probe_sequential(&candidates).await
        } else {
            self.probe_windowed(&candidates).await
        };

        match &cover {
            Some(id) => debug!(cover = %id, "Cover resolved"),
            None => debug!("No cover found"),
        }
        Ok(cover)
    }

    async fn probe_sequential(&self, candidates: &[CoverId]) -> Option<CoverId> {
        for candidate in candidates {
            match self.lookup.probe_cover(candidate).await {
                Ok(()) => return Some(candidate.clone()),
                Err(e) => warn!(candidate = %candidate, error = %e, "Cover not found"),
            }
        }
        None
    }

    /// Probe `probe_concurrency` candidates at a time and keep the lowest
    /// index that succeeded, so the outcome matches sequential probing.
    async fn probe_windowed(&self, candidates: &[CoverId]) -> Option<CoverId> {
        for window in candidates.chunks(self.policy.probe_concurrency) {
            let mut probes = JoinSet::new();
            for (index, candidate) in window.iter().cloned().enumerate() {
                let lookup = Arc::clone(&self.lookup);
                probes.spawn(async move {
                    let result = lookup.probe_cover(&candidate).await;
                    (index, candidate, result)
                });
            }

            let mut best: Option<(usize, CoverId)> = None;
            while let Some(joined) = probes.join_next().await {
                match joined {
                    Ok((index, candidate, Ok(()))) => {
                        if best.as_ref().map_or(true, |(b, _)| index < *b) {
                            best = Some((index, candidate));
                        }
                    }
                    Ok((_, candidate, Err(e))) => {
                        warn!(candidate = %candidate, error = %e, "Cover not found")
                    }
                    Err(e) => warn!(error = %e, "Cover probe task failed"),
                }
            }

            if let Some((_, candidate)) = best {
                return Some(candidate);
            }
        }
        None
    }
}
