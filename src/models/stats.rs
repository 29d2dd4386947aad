// src/models/stats.rs
use serde::{Deserialize, Serialize};

use super::matching::{MatchOutcome, MatchResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_queries: usize,
    pub processed: usize,
    pub matched: usize,
    pub no_acceptable_candidate: usize,
    pub no_candidates: usize,
    pub empty_queries: usize,
    pub candidate_failures: usize,
    pub scoring_failures: usize,
    pub avg_confidence: f64,
    pub cancelled: bool,
}

impl BatchStats {
    pub fn from_results(total_queries: usize, results: &[MatchResult], cancelled: bool) -> Self {
        let mut stats = BatchStats {
            total_queries,
            processed: results.len(),
            cancelled,
            ..Default::default()
        };
        let mut confidence_sum = 0.0;
        for result in results {
            match result.outcome {
                MatchOutcome::Matched => {
                    stats.matched += 1;
                    confidence_sum += result.confidence;
                }
                MatchOutcome::NoAcceptableCandidate => stats.no_acceptable_candidate += 1,
                MatchOutcome::NoCandidates => stats.no_candidates += 1,
                MatchOutcome::EmptyQuery => stats.empty_queries += 1,
                MatchOutcome::CandidateFetchFailed { .. } => stats.candidate_failures += 1,
                MatchOutcome::ScoringFailed { .. } => stats.scoring_failures += 1,
            }
        }
        stats.avg_confidence = if stats.matched > 0 {
            confidence_sum / stats.matched as f64
        } else {
            0.0
        };
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_count_every_outcome() {
        let mut matched = MatchResult::unmatched(
            Some("Apple Inc".into()),
            "apple".into(),
            "apple".into(),
            MatchOutcome::Matched,
        );
        matched.confidence = 0.98;
        let results = vec![
            matched,
            MatchResult::empty_query(None),
            MatchResult::unmatched(None, "x".into(), "x".into(), MatchOutcome::NoCandidates),
            MatchResult::unmatched(
                None,
                "y".into(),
                "y".into(),
                MatchOutcome::CandidateFetchFailed {
                    reason: "down".into(),
                },
            ),
            MatchResult::unmatched(
                None,
                "z".into(),
                "z".into(),
                MatchOutcome::ScoringFailed {
                    reason: "panicked".into(),
                },
            ),
        ];
        let stats = BatchStats::from_results(6, &results, true);
        assert_eq!(stats.total_queries, 6);
        assert_eq!(stats.processed, 5);
        assert_eq!(stats.matched, 1);
        assert_eq!(stats.empty_queries, 1);
        assert_eq!(stats.no_candidates, 1);
        assert_eq!(stats.candidate_failures, 1);
        assert_eq!(stats.scoring_failures, 1);
        assert!((stats.avg_confidence - 0.98).abs() < 1e-12);
        assert!(stats.cancelled);
    }
}
