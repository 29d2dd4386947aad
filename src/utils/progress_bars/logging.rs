// src/utils/progress_bars/logging.rs - Logging helpers for batch matching runs
use log::{debug, info, warn};
use std::time::{Duration, Instant};

use crate::models::{BatchStats, MatchOutcome, MatchResult};

#[derive(Clone)]
pub struct BatchLogger {
    run_id: String,
    start_time: Instant,
}

impl BatchLogger {
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, query_count: usize, workers: usize, threshold: f64, policy_version: &str) {
        info!("🚀 ===== COMPANY NAME MATCHING STARTING =====");
        info!("📅 Run ID: {}", self.run_id);
        info!("⚙️  Configuration:");
        info!("   • {} queries", query_count);
        info!("   • {} concurrent workers", workers);
        info!("   • Threshold: {:.2}", threshold);
        info!("   • Scoring policy: {}", policy_version);
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        match details {
            Some(details) => info!(
                "[{}] 🔄 Phase: {} - {} [+{:.1}s]",
                self.short_id(),
                phase,
                details,
                elapsed.as_secs_f32()
            ),
            None => info!(
                "[{}] 🔄 Phase: {} [+{:.1}s]",
                self.short_id(),
                phase,
                elapsed.as_secs_f32()
            ),
        }
    }

    pub fn log_query_outcome(&self, index: usize, result: &MatchResult) {
        let query = result.query_name.as_deref().unwrap_or("<missing>");
        match &result.outcome {
            MatchOutcome::Matched => debug!(
                "[{}] ✅ #{} '{}' → {} ({:.3})",
                self.short_id(),
                index,
                query,
                result.matched_id().unwrap_or("?"),
                result.confidence
            ),
            MatchOutcome::NoAcceptableCandidate | MatchOutcome::NoCandidates => debug!(
                "[{}] ➖ #{} '{}' unmatched ({:?})",
                self.short_id(),
                index,
                query,
                result.outcome
            ),
            MatchOutcome::EmptyQuery => info!(
                "[{}] ⏭️  #{} '{}' skipped: normalizes to an empty name",
                self.short_id(),
                index,
                query
            ),
            MatchOutcome::CandidateFetchFailed { reason } => warn!(
                "[{}] ⚠️  #{} '{}' candidate fetch failed: {}",
                self.short_id(),
                index,
                query,
                reason
            ),
            MatchOutcome::ScoringFailed { reason } => warn!(
                "[{}] ❌ #{} '{}' scoring failed: {}",
                self.short_id(),
                index,
                query,
                reason
            ),
        }
    }

    pub fn log_progress_update(&self, current: usize, total: usize, matched: usize) {
        let should_log = current == total
            || current % 5000 == 0
            || (total >= 100 && current % (total / 10) == 0);
        if should_log && current > 0 {
            let percent = current as f64 / total as f64 * 100.0;
            info!(
                "[{}] 📊 Progress: {}/{} ({:.1}%) - {} matched",
                self.short_id(),
                current,
                total,
                percent,
                matched
            );
        }
    }

    pub fn log_cache_stats(&self, hits: usize, misses: usize) {
        let total = hits + misses;
        if total > 0 {
            info!(
                "[{}] 💾 Semantic cache: {} hits, {} misses ({:.1}% hit rate)",
                self.short_id(),
                hits,
                misses,
                hits as f64 / total as f64 * 100.0
            );
        }
    }

    pub fn log_cancelled(&self, processed: usize, total: usize) {
        warn!(
            "[{}] 🛑 Cancelled after {}/{} queries; remaining queries discarded",
            self.short_id(),
            processed,
            total
        );
    }

    pub fn log_completion(&self, stats: &BatchStats) {
        info!("🎉 ===== COMPANY NAME MATCHING COMPLETED =====");
        info!("📅 Run ID: {}", self.run_id);
        info!("⏱️  Duration: {:.2?}", self.elapsed());
        info!(
            "🎯 {} of {} processed queries matched (avg confidence {:.3})",
            stats.matched, stats.processed, stats.avg_confidence
        );
        info!(
            "   • no acceptable candidate: {}, no candidates: {}, empty: {}",
            stats.no_acceptable_candidate, stats.no_candidates, stats.empty_queries
        );
        if stats.candidate_failures > 0 {
            warn!(
                "⚠️  {} queries could not fetch candidates",
                stats.candidate_failures
            );
        }
        if stats.scoring_failures > 0 {
            warn!("❌ {} queries failed during scoring", stats.scoring_failures);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn short_id(&self) -> &str {
        self.run_id.get(..8).unwrap_or(&self.run_id)
    }
}
