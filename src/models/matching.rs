// src/models/matching.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of similarity signals produced for every (query, candidate) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    ExactMatch,
    CoreMatch,
    TokenOverlap,
    FuzzyRatio,
    PartialRatio,
    TokenSortRatio,
    TokenSetRatio,
    EmbeddingSimilarity,
}

impl Signal {
    pub const ALL: [Signal; 8] = [
        Signal::ExactMatch,
        Signal::CoreMatch,
        Signal::TokenOverlap,
        Signal::FuzzyRatio,
        Signal::PartialRatio,
        Signal::TokenSortRatio,
        Signal::TokenSetRatio,
        Signal::EmbeddingSimilarity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::ExactMatch => "exact_match",
            Signal::CoreMatch => "core_match",
            Signal::TokenOverlap => "token_overlap",
            Signal::FuzzyRatio => "fuzzy_ratio",
            Signal::PartialRatio => "partial_ratio",
            Signal::TokenSortRatio => "token_sort_ratio",
            Signal::TokenSetRatio => "token_set_ratio",
            Signal::EmbeddingSimilarity => "embedding_similarity",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-pair similarity scores, every value in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreVector {
    pub exact_match: f64,
    pub core_match: f64,
    pub token_overlap: f64,
    pub fuzzy_ratio: f64,
    pub partial_ratio: f64,
    pub token_sort_ratio: f64,
    pub token_set_ratio: f64,
    pub embedding_similarity: f64,
}

impl ScoreVector {
    pub fn get(&self, signal: Signal) -> f64 {
        match signal {
            Signal::ExactMatch => self.exact_match,
            Signal::CoreMatch => self.core_match,
            Signal::TokenOverlap => self.token_overlap,
            Signal::FuzzyRatio => self.fuzzy_ratio,
            Signal::PartialRatio => self.partial_ratio,
            Signal::TokenSortRatio => self.token_sort_ratio,
            Signal::TokenSetRatio => self.token_set_ratio,
            Signal::EmbeddingSimilarity => self.embedding_similarity,
        }
    }

    pub fn set(&mut self, signal: Signal, value: f64) {
        let slot = match signal {
            Signal::ExactMatch => &mut self.exact_match,
            Signal::CoreMatch => &mut self.core_match,
            Signal::TokenOverlap => &mut self.token_overlap,
            Signal::FuzzyRatio => &mut self.fuzzy_ratio,
            Signal::PartialRatio => &mut self.partial_ratio,
            Signal::TokenSortRatio => &mut self.token_sort_ratio,
            Signal::TokenSetRatio => &mut self.token_set_ratio,
            Signal::EmbeddingSimilarity => &mut self.embedding_similarity,
        };
        *slot = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Signal, f64)> + '_ {
        Signal::ALL.iter().map(move |s| (*s, self.get(*s)))
    }
}

/// Outcome of deciding one (query, candidate) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchVerdict {
    pub is_match: bool,
    pub confidence: f64,
    /// Name of the policy rule that fixed or raised the confidence, if any.
    pub rule: Option<String>,
    pub scores: ScoreVector,
}

/// A registry record offered for comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub id: String,
}

impl Candidate {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedCandidate {
    pub id: String,
    pub name: String,
    pub normalized_name: String,
}

/// Why a query ended the way it did. "No acceptable match" is a normal outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchOutcome {
    Matched,
    NoAcceptableCandidate,
    NoCandidates,
    EmptyQuery,
    CandidateFetchFailed { reason: String },
    /// The scoring task for this query did not complete.
    ScoringFailed { reason: String },
}

/// The result record for one query name against its whole candidate pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub query_name: Option<String>,
    pub normalized_query: Option<String>,
    pub core_query: Option<String>,
    pub best_match: Option<MatchedCandidate>,
    pub confidence: f64,
    pub is_high_confidence: bool,
    pub scores: Option<ScoreVector>,
    pub outcome: MatchOutcome,
}

impl MatchResult {
    /// A well-formed "no match" record for a query that produced no usable name.
    pub fn empty_query(query_name: Option<String>) -> Self {
        Self {
            query_name,
            normalized_query: None,
            core_query: None,
            best_match: None,
            confidence: 0.0,
            is_high_confidence: false,
            scores: None,
            outcome: MatchOutcome::EmptyQuery,
        }
    }

    pub fn unmatched(
        query_name: Option<String>,
        normalized_query: String,
        core_query: String,
        outcome: MatchOutcome,
    ) -> Self {
        Self {
            query_name,
            normalized_query: Some(normalized_query),
            core_query: Some(core_query),
            best_match: None,
            confidence: 0.0,
            is_high_confidence: false,
            scores: None,
            outcome,
        }
    }

    pub fn matched_id(&self) -> Option<&str> {
        self.best_match.as_ref().map(|m| m.id.as_str())
    }
}

/// A raw query name as it arrived; missing values are kept as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawName(pub Option<String>);

impl RawName {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl From<&str> for RawName {
    fn from(value: &str) -> Self {
        RawName(Some(value.to_string()))
    }
}

impl From<String> for RawName {
    fn from(value: String) -> Self {
        RawName(Some(value))
    }
}

impl From<Option<String>> for RawName {
    fn from(value: Option<String>) -> Self {
        RawName(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_vector_get_set_cover_all_signals() {
        let mut scores = ScoreVector::default();
        for (i, signal) in Signal::ALL.iter().enumerate() {
            scores.set(*signal, i as f64 / 10.0);
        }
        for (i, (signal, value)) in scores.iter().enumerate() {
            assert_eq!(signal, Signal::ALL[i]);
            assert!((value - i as f64 / 10.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_score_vector_serializes_with_signal_names() {
        let scores = ScoreVector {
            exact_match: 1.0,
            ..Default::default()
        };
        let json = serde_json::to_value(scores).unwrap();
        for signal in Signal::ALL {
            assert!(json.get(signal.as_str()).is_some(), "missing {}", signal);
        }
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(MatchOutcome::CandidateFetchFailed {
            reason: "timeout".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "candidate_fetch_failed");
        assert_eq!(json["reason"], "timeout");
    }

    #[test]
    fn test_empty_query_result_has_no_normalized_form() {
        let result = MatchResult::empty_query(Some(String::new()));
        assert!(result.normalized_query.is_none());
        assert!(result.best_match.is_none());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.outcome, MatchOutcome::EmptyQuery);
    }
}
