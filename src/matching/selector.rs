// src/matching/selector.rs
use log::trace;

use super::decision::MatchDecisionEngine;
use super::ensemble::{PreparedName, SimilarityEnsemble};
use crate::models::{Candidate, MatchOutcome, MatchResult, MatchVerdict, MatchedCandidate};

/// Picks the single best accepted candidate for a query.
///
/// Tie-breaking: a candidate replaces the running best only when its confidence
/// is strictly greater, and the running best starts at 0.0. With a fixed
/// candidate order the first candidate at the top confidence wins, and an
/// accepted verdict with zero confidence is never selected.
pub struct BestMatchSelector<'a> {
    ensemble: &'a SimilarityEnsemble,
    engine: &'a MatchDecisionEngine,
}

impl<'a> BestMatchSelector<'a> {
    pub fn new(ensemble: &'a SimilarityEnsemble, engine: &'a MatchDecisionEngine) -> Self {
        Self { ensemble, engine }
    }

    pub fn select(&self, query: &str, candidates: &[Candidate], threshold: f64) -> MatchResult {
        let prepared = self.ensemble.prepare(query);
        self.select_prepared(Some(query.to_string()), &prepared, candidates, threshold)
    }

    pub fn select_prepared(
        &self,
        query_name: Option<String>,
        query: &PreparedName,
        candidates: &[Candidate],
        threshold: f64,
    ) -> MatchResult {
        if query.normalized.is_empty() {
            return MatchResult::empty_query(query_name);
        }
        if candidates.is_empty() {
            return MatchResult::unmatched(
                query_name,
                query.normalized.clone(),
                query.core.clone(),
                MatchOutcome::NoCandidates,
            );
        }

        let mut best: Option<(&Candidate, PreparedName, MatchVerdict)> = None;
        let mut best_confidence = 0.0;
        for candidate in candidates {
            let prepared = self.ensemble.prepare(&candidate.name);
            let scores = self.ensemble.score_prepared(query, &prepared);
            let verdict = self.engine.decide(&scores, threshold);
            trace!(
                "'{}' vs '{}' ({}): {:.3}",
                query.normalized,
                prepared.normalized,
                candidate.id,
                verdict.confidence
            );
            if verdict.is_match && verdict.confidence > best_confidence {
                best_confidence = verdict.confidence;
                best = Some((candidate, prepared, verdict));
            }
        }

        match best {
            Some((candidate, prepared, verdict)) => MatchResult {
                query_name,
                normalized_query: Some(query.normalized.clone()),
                core_query: Some(query.core.clone()),
                best_match: Some(MatchedCandidate {
                    id: candidate.id.clone(),
                    name: candidate.name.clone(),
                    normalized_name: prepared.normalized,
                }),
                confidence: verdict.confidence,
                is_high_confidence: verdict.confidence >= threshold,
                scores: Some(verdict.scores),
                outcome: MatchOutcome::Matched,
            },
            None => MatchResult::unmatched(
                query_name,
                query.normalized.clone(),
                query.core.clone(),
                MatchOutcome::NoAcceptableCandidate,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::fuzzy::FuzzyKind;
    use crate::matching::normalize::NameNormalizer;
    use crate::matching::semantic::TrigramEmbedder;
    use crate::matching::OverlapTokens;
    use std::sync::Arc;

    fn ensemble() -> SimilarityEnsemble {
        SimilarityEnsemble::new(
            Arc::new(NameNormalizer::standard().unwrap()),
            FuzzyKind::Indel.build(),
            Arc::new(TrigramEmbedder::new()),
            OverlapTokens::Lexical,
        )
    }

    #[test]
    fn test_empty_pool_yields_no_match() {
        let ensemble = ensemble();
        let engine = MatchDecisionEngine::default();
        let result = BestMatchSelector::new(&ensemble, &engine).select("Apple Inc.", &[], 0.95);
        assert!(result.best_match.is_none());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.outcome, MatchOutcome::NoCandidates);
        assert_eq!(result.normalized_query.as_deref(), Some("apple"));
    }

    #[test]
    fn test_query_without_distinctive_words_never_matches() {
        let ensemble = ensemble();
        let engine = MatchDecisionEngine::default();
        let selector = BestMatchSelector::new(&ensemble, &engine);
        let candidates = vec![Candidate::new("Inc", "X1"), Candidate::new("Apple Ltd", "A1")];
        for query in ["", "Ltd", "!!!"] {
            let result = selector.select(query, &candidates, 0.95);
            assert_eq!(result.outcome, MatchOutcome::EmptyQuery, "query {:?}", query);
            assert!(result.best_match.is_none());
            assert_eq!(result.confidence, 0.0);
            assert_eq!(result.query_name.as_deref(), Some(query));
        }
        let result = selector.select("Ltd", &[], 0.95);
        assert_eq!(result.outcome, MatchOutcome::EmptyQuery);
    }

    #[test]
    fn test_picks_highest_confidence() {
        let ensemble = ensemble();
        let engine = MatchDecisionEngine::default();
        let candidates = vec![
            Candidate::new("Apple Computers Services", "001"),
            Candidate::new("Apple Limited", "002"),
            Candidate::new("Pineapple Ltd", "003"),
        ];
        let result =
            BestMatchSelector::new(&ensemble, &engine).select("Apple Inc.", &candidates, 0.95);
        assert_eq!(result.matched_id(), Some("002"));
        assert_eq!(result.confidence, 1.0);
        assert!(result.is_high_confidence);
        assert_eq!(result.outcome, MatchOutcome::Matched);
        assert!(result.scores.is_some());
    }

    #[test]
    fn test_first_seen_wins_ties() {
        let ensemble = ensemble();
        let engine = MatchDecisionEngine::default();
        let candidates = vec![
            Candidate::new("Apple Ltd", "first"),
            Candidate::new("Apple Limited", "second"),
            Candidate::new("APPLE INC", "third"),
        ];
        let selector = BestMatchSelector::new(&ensemble, &engine);
        let result = selector.select("Apple Inc.", &candidates, 0.95);
        assert_eq!(result.matched_id(), Some("first"));

        let reversed: Vec<Candidate> = candidates.into_iter().rev().collect();
        let result = selector.select("Apple Inc.", &reversed, 0.95);
        assert_eq!(result.matched_id(), Some("third"));
    }

    #[test]
    fn test_nothing_above_threshold() {
        let ensemble = ensemble();
        let engine = MatchDecisionEngine::default();
        let candidates = vec![
            Candidate::new("Amazon", "A1"),
            Candidate::new("Alphabet Inc", "A2"),
        ];
        let result = BestMatchSelector::new(&ensemble, &engine).select(
            "Microsoft Corporation",
            &candidates,
            0.95,
        );
        assert!(result.best_match.is_none());
        assert_eq!(result.confidence, 0.0);
        assert!(!result.is_high_confidence);
        assert_eq!(result.outcome, MatchOutcome::NoAcceptableCandidate);
    }
}
