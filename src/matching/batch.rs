// src/matching/batch.rs
// Bounded, order-preserving batch matching over a candidate provider.

use chrono::{DateTime, Utc};
use futures::future;
use futures::stream::{self, StreamExt};
use log::info;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use super::decision::validate_threshold;
use super::matcher::CompanyNameMatcher;
use crate::error::MatchError;
use crate::models::{BatchStats, MatchOutcome, MatchResult, RawName};
use crate::registry::CandidateProvider;
use crate::utils::config::MatcherConfig;
use crate::utils::progress_bars::logging::BatchLogger;
use crate::utils::progress_bars::progress_callback::{ProgressCallback, ProgressTracker};

/// Cooperative cancellation shared between a batch run and whoever stops it.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub threshold: f64,
    pub policy_version: String,
    /// One result per processed query, in input order.
    pub results: Vec<MatchResult>,
    pub stats: BatchStats,
}

pub struct BatchMatcher {
    matcher: Arc<CompanyNameMatcher>,
    workers: usize,
    candidate_limit: usize,
}

impl BatchMatcher {
    pub fn new(
        matcher: Arc<CompanyNameMatcher>,
        workers: usize,
        candidate_limit: usize,
    ) -> Result<Self, MatchError> {
        if workers == 0 {
            return Err(MatchError::InvalidConfig("workers must be at least 1".into()));
        }
        if candidate_limit == 0 {
            return Err(MatchError::InvalidConfig(
                "candidate limit must be at least 1".into(),
            ));
        }
        Ok(Self {
            matcher,
            workers,
            candidate_limit,
        })
    }

    pub fn from_config(config: &MatcherConfig) -> Result<Self, MatchError> {
        let matcher = CompanyNameMatcher::from_config(config)?;
        Self::new(Arc::new(matcher), config.workers, config.candidate_limit)
    }

    pub fn matcher(&self) -> &Arc<CompanyNameMatcher> {
        &self.matcher
    }

    /// Worker count capped by whatever concurrency the collaborators tolerate.
    pub fn effective_workers(&self, provider: &dyn CandidateProvider) -> usize {
        [
            Some(self.workers),
            self.matcher.semantic_provider().max_concurrency(),
            provider.max_concurrency(),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(1)
        .max(1)
    }

    /// Matches every query against its own candidate pool. Per-query failures
    /// are recorded in the results; only an invalid threshold fails the run.
    /// Cancellation stops new queries from starting and keeps the finished prefix.
    pub async fn run(
        &self,
        queries: Vec<RawName>,
        provider: Arc<dyn CandidateProvider>,
        threshold: f64,
        cancel: &CancellationFlag,
        progress: Option<ProgressCallback>,
    ) -> Result<BatchReport, MatchError> {
        validate_threshold(threshold)?;

        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let total = queries.len();
        let workers = self.effective_workers(provider.as_ref());
        let policy_version = self.matcher.policy().version.clone();
        let limit = self.candidate_limit;

        let logger = BatchLogger::new(&run_id);
        logger.log_start(total, workers, threshold, &policy_version);
        let mut tracker = ProgressTracker::new(progress);
        tracker.set_phase("Matching");
        logger.log_phase("Matching", Some(&format!("{} queries", total)));

        let outcomes = stream::iter(queries.into_iter().enumerate())
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|(index, query)| {
                let matcher = Arc::clone(&self.matcher);
                let provider = Arc::clone(&provider);
                let query_name = query.0.clone();
                let handle = tokio::spawn(match_one(matcher, provider, query, limit, threshold));
                async move {
                    let result = match handle.await {
                        Ok(result) => result,
                        Err(e) => scoring_failed(query_name, e.to_string()),
                    };
                    (index, result)
                }
            })
            .buffered(workers);
        let mut outcomes = std::pin::pin!(outcomes);

        let mut results = Vec::with_capacity(total);
        let mut matched = 0usize;
        while let Some((index, result)) = outcomes.next().await {
            if result.outcome == MatchOutcome::Matched {
                matched += 1;
            }
            logger.log_query_outcome(index, &result);
            results.push(result);
            logger.log_progress_update(results.len(), total, matched);
            tracker.update_progress(results.len(), total);
        }

        let cancelled = cancel.is_cancelled() && results.len() < total;
        if cancelled {
            logger.log_cancelled(results.len(), total);
        }
        if let Some((hits, misses)) = self.matcher.semantic_provider().cache_stats() {
            logger.log_cache_stats(hits, misses);
        }

        let stats = BatchStats::from_results(total, &results, cancelled);
        logger.log_completion(&stats);
        tracker.finish_phase(&format!("{}/{} matched", stats.matched, stats.processed));
        info!("✅ Batch {} finished in {:.2?}", run_id, logger.elapsed());

        Ok(BatchReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            threshold,
            policy_version,
            results,
            stats,
        })
    }
}

/// Normalize, fetch, then score on the blocking pool.
async fn match_one(
    matcher: Arc<CompanyNameMatcher>,
    provider: Arc<dyn CandidateProvider>,
    query: RawName,
    limit: usize,
    threshold: f64,
) -> MatchResult {
    let normalized = matcher.ensemble().normalizer().normalize_opt(query.as_deref());
    if normalized.is_empty() {
        return MatchResult::empty_query(query.0);
    }
    let core = matcher.ensemble().normalizer().core_of_normalized(&normalized);

    let candidates = match provider.fetch_candidates(&normalized, limit).await {
        Ok(candidates) => candidates,
        Err(e) => {
            return MatchResult::unmatched(
                query.0,
                normalized,
                core,
                MatchOutcome::CandidateFetchFailed {
                    reason: MatchError::candidate_provider(&e).to_string(),
                },
            )
        }
    };

    let scoring_matcher = Arc::clone(&matcher);
    let scoring_query = query.clone();
    let scoring_normalized = normalized.clone();
    let scored = tokio::task::spawn_blocking(move || {
        let prepared = scoring_matcher.ensemble().prepare_normalized(scoring_normalized);
        scoring_matcher.select_prepared(&scoring_query, &prepared, &candidates, threshold)
    })
    .await;

    match scored {
        Ok(result) => result,
        Err(e) => MatchResult::unmatched(
            query.0,
            normalized,
            core,
            MatchOutcome::ScoringFailed {
                reason: e.to_string(),
            },
        ),
    }
}

fn scoring_failed(query_name: Option<String>, reason: String) -> MatchResult {
    MatchResult {
        outcome: MatchOutcome::ScoringFailed { reason },
        ..MatchResult::empty_query(query_name)
    }
}
