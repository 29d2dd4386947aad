// src/error.rs
use thiserror::Error;

/// Errors surfaced by the matching engine.
///
/// Construction problems (policy, configuration) are fatal and reported before
/// any matching happens. Provider failures are per-query and retryable; the
/// batch runner records them in the result instead of aborting.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid scoring policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("candidate provider failed: {0}")]
    CandidateProvider(String),

    #[error("semantic provider failed: {0}")]
    SemanticProvider(String),
}

impl MatchError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MatchError::CandidateProvider(_) | MatchError::SemanticProvider(_)
        )
    }

    pub fn candidate_provider(err: &anyhow::Error) -> Self {
        MatchError::CandidateProvider(format!("{:#}", err))
    }

    pub fn semantic_provider(err: &anyhow::Error) -> Self {
        MatchError::SemanticProvider(format!("{:#}", err))
    }
}
