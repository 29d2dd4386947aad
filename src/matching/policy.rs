// src/matching/policy.rs
// Versioned scoring policy: signal weights, short-circuit rules and boosts.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::MatchError;
use crate::models::{ScoreVector, Signal};

pub const DEFAULT_POLICY_VERSION: &str = "company-v1";
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Linear weights over the eight signals. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    pub exact_match: f64,
    pub core_match: f64,
    pub token_overlap: f64,
    pub fuzzy_ratio: f64,
    pub partial_ratio: f64,
    pub token_sort_ratio: f64,
    pub token_set_ratio: f64,
    pub embedding_similarity: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            exact_match: 0.15,
            core_match: 0.15,
            token_overlap: 0.15,
            fuzzy_ratio: 0.10,
            partial_ratio: 0.10,
            token_sort_ratio: 0.15,
            token_set_ratio: 0.10,
            embedding_similarity: 0.10,
        }
    }
}

impl SignalWeights {
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

    pub fn weighted_sum(&self, scores: &ScoreVector) -> f64 {
        scores.iter().map(|(signal, v)| self.get(signal) * v).sum()
    }

    pub fn total(&self) -> f64 {
        Signal::ALL.iter().map(|s| self.get(*s)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Gt,
    Ge,
    Eq,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub signal: Signal,
    pub comparison: Comparison,
    pub value: f64,
}

impl Condition {
    pub fn new(signal: Signal, comparison: Comparison, value: f64) -> Self {
        Self {
            signal,
            comparison,
            value,
        }
    }

    pub fn holds(&self, scores: &ScoreVector) -> bool {
        let actual = scores.get(self.signal);
        match self.comparison {
            Comparison::Gt => actual > self.value,
            Comparison::Ge => actual >= self.value,
            Comparison::Eq => actual == self.value,
        }
    }
}

/// A conjunction of conditions that, when all hold, fixes (short-circuit) or
/// floors (boost) the confidence at `confidence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub name: String,
    pub conditions: Vec<Condition>,
    pub confidence: f64,
}

impl PolicyRule {
    pub fn new(name: impl Into<String>, conditions: Vec<Condition>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            conditions,
            confidence,
        }
    }

    pub fn applies(&self, scores: &ScoreVector) -> bool {
        !self.conditions.is_empty() && self.conditions.iter().all(|c| c.holds(scores))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub version: String,
    pub weights: SignalWeights,
    /// Checked in order before weighting; the first that applies decides.
    pub short_circuits: Vec<PolicyRule>,
    /// Applied in order after weighting; each can only raise the confidence.
    pub boosts: Vec<PolicyRule>,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        use Comparison::*;
        use Signal::*;

        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            weights: SignalWeights::default(),
            short_circuits: vec![
                PolicyRule::new("exact_match", vec![Condition::new(ExactMatch, Eq, 1.0)], 1.0),
                PolicyRule::new(
                    "core_match_with_overlap",
                    vec![
                        Condition::new(CoreMatch, Eq, 1.0),
                        Condition::new(TokenOverlap, Gt, 0.8),
                    ],
                    0.98,
                ),
            ],
            boosts: vec![
                PolicyRule::new(
                    "token_set_with_overlap",
                    vec![
                        Condition::new(TokenSetRatio, Gt, 0.95),
                        Condition::new(TokenOverlap, Gt, 0.8),
                    ],
                    0.96,
                ),
                PolicyRule::new(
                    "full_partial_with_token_sort",
                    vec![
                        Condition::new(PartialRatio, Eq, 1.0),
                        Condition::new(TokenSortRatio, Gt, 0.9),
                    ],
                    0.97,
                ),
            ],
        }
    }
}

impl ScoringPolicy {
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.version.trim().is_empty() {
            return Err(MatchError::InvalidPolicy("version must not be empty".into()));
        }
        for signal in Signal::ALL {
            let w = self.weights.get(signal);
            if !w.is_finite() || !(0.0..=1.0).contains(&w) {
                return Err(MatchError::InvalidPolicy(format!(
                    "weight for {} must be within [0, 1], got {}",
                    signal, w
                )));
            }
        }
        let total = self.weights.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(MatchError::InvalidPolicy(format!(
                "weights must sum to 1.0, got {:.6}",
                total
            )));
        }
        for rule in self.short_circuits.iter().chain(self.boosts.iter()) {
            if rule.conditions.is_empty() {
                return Err(MatchError::InvalidPolicy(format!(
                    "rule '{}' has no conditions",
                    rule.name
                )));
            }
            if !rule.confidence.is_finite() || !(0.0..=1.0).contains(&rule.confidence) {
                return Err(MatchError::InvalidPolicy(format!(
                    "rule '{}' confidence must be within [0, 1], got {}",
                    rule.name, rule.confidence
                )));
            }
            if let Some(c) = rule.conditions.iter().find(|c| !c.value.is_finite()) {
                return Err(MatchError::InvalidPolicy(format!(
                    "rule '{}' compares {} against a non-finite value",
                    rule.name, c.signal
                )));
            }
        }
        Ok(())
    }

    /// Loads and validates a policy from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scoring policy {}", path.display()))?;
        let policy: ScoringPolicy = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse scoring policy {}", path.display()))?;
        policy
            .validate()
            .with_context(|| format!("Scoring policy {} is invalid", path.display()))?;
        Ok(policy)
    }
}
