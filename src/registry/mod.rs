// src/registry/mod.rs
// Sources of candidate pools for a normalized query.

pub mod http;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Candidate;

pub use http::{CompanyRecord, RegistrySearchClient, SearchResponse};
pub use memory::InMemoryRegistry;

/// Returns up to `limit` plausible candidates for a normalized query, ordered
/// by the source's own relevance. The order is advisory: every candidate is
/// re-scored by the matcher.
#[async_trait]
pub trait CandidateProvider: Send + Sync {
    async fn fetch_candidates(&self, normalized_query: &str, limit: usize) -> Result<Vec<Candidate>>;

    /// Upper bound on concurrent requests this provider tolerates, if any.
    fn max_concurrency(&self) -> Option<usize> {
        None
    }
}
