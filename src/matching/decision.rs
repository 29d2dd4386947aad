// src/matching/decision.rs
use log::trace;

use super::policy::ScoringPolicy;
use crate::error::MatchError;
use crate::models::{MatchVerdict, ScoreVector};

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.95;

pub fn validate_threshold(threshold: f64) -> Result<(), MatchError> {
    if threshold.is_finite() && (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(MatchError::InvalidConfig(format!(
            "match threshold must be within [0, 1], got {}",
            threshold
        )))
    }
}

/// Turns a score vector into a confidence and verdict under a validated policy.
#[derive(Debug, Clone)]
pub struct MatchDecisionEngine {
    policy: ScoringPolicy,
}

impl MatchDecisionEngine {
    pub fn new(policy: ScoringPolicy) -> Result<Self, MatchError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Short-circuit rules win outright and are accepted regardless of the
    /// threshold. Otherwise the weighted sum, raised by any applicable boosts,
    /// is accepted iff it reaches `threshold`.
    pub fn decide(&self, scores: &ScoreVector, threshold: f64) -> MatchVerdict {
        if let Some(rule) = self.policy.short_circuits.iter().find(|r| r.applies(scores)) {
            trace!("Short-circuit '{}' fired", rule.name);
            return MatchVerdict {
                is_match: true,
                confidence: rule.confidence,
                rule: Some(rule.name.clone()),
                scores: *scores,
            };
        }

        let mut confidence = self.policy.weights.weighted_sum(scores);
        let mut rule = None;
        for boost in self.policy.boosts.iter().filter(|b| b.applies(scores)) {
            if boost.confidence > confidence {
                confidence = boost.confidence;
                rule = Some(boost.name.clone());
            }
        }

        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        MatchVerdict {
            is_match: confidence >= threshold,
            confidence,
            rule,
            scores: *scores,
        }
    }
}

impl Default for MatchDecisionEngine {
    fn default() -> Self {
        Self {
            policy: ScoringPolicy::default(),
        }
    }
}
