// src/utils/config.rs
use log::debug;
use std::path::PathBuf;
use url::Url;

use super::env::{env_opt, env_or};
use crate::error::MatchError;
use crate::matching::decision::{validate_threshold, DEFAULT_MATCH_THRESHOLD};
use crate::matching::fuzzy::FuzzyKind;
use crate::matching::OverlapTokens;

pub const DEFAULT_CANDIDATE_LIMIT: usize = 10;
pub const DEFAULT_CACHE_SIZE: usize = 20000;
pub const DEFAULT_REGISTRY_URL: &str = "http://localhost:8000";
pub const DEFAULT_REGISTRY_TIMEOUT_SECS: u64 = 30;

/// Runtime settings for a matching run, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherConfig {
    /// Minimum confidence for a candidate to be accepted
    pub threshold: f64,
    /// Candidates requested from the registry per query
    pub candidate_limit: usize,
    /// Queries in flight at once
    pub workers: usize,
    pub normalization_cache_size: usize,
    pub embedding_cache_size: usize,
    pub registry_url: String,
    pub registry_timeout_secs: u64,
    /// Optional JSON file replacing the built-in scoring policy
    pub scoring_policy_path: Option<PathBuf>,
    pub overlap_tokens: OverlapTokens,
    pub fuzzy: FuzzyKind,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            workers: num_cpus::get(),
            normalization_cache_size: DEFAULT_CACHE_SIZE,
            embedding_cache_size: DEFAULT_CACHE_SIZE,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            registry_timeout_secs: DEFAULT_REGISTRY_TIMEOUT_SECS,
            scoring_policy_path: None,
            overlap_tokens: OverlapTokens::default(),
            fuzzy: FuzzyKind::default(),
        }
    }
}

impl MatcherConfig {
    /// Reads every setting from the environment. Unparseable values fall back
    /// to their defaults; call [`MatcherConfig::validate`] before use.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            threshold: env_or("MATCH_THRESHOLD", defaults.threshold),
            candidate_limit: env_or("CANDIDATE_LIMIT", defaults.candidate_limit),
            workers: env_or("MATCH_WORKERS", defaults.workers),
            normalization_cache_size: env_or(
                "NORMALIZATION_CACHE_SIZE",
                defaults.normalization_cache_size,
            ),
            embedding_cache_size: env_or("EMBEDDING_CACHE_SIZE", defaults.embedding_cache_size),
            registry_url: env_opt("REGISTRY_URL").unwrap_or(defaults.registry_url),
            registry_timeout_secs: env_or("REGISTRY_TIMEOUT_SECS", defaults.registry_timeout_secs),
            scoring_policy_path: env_opt("SCORING_POLICY_PATH").map(PathBuf::from),
            overlap_tokens: env_or("OVERLAP_TOKENS", defaults.overlap_tokens),
            fuzzy: env_or("FUZZY_BACKEND", defaults.fuzzy),
        };
        debug!("Matcher config from environment: {:?}", config);
        config
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        validate_threshold(self.threshold)?;
        if self.candidate_limit == 0 {
            return Err(MatchError::InvalidConfig(
                "candidate limit must be at least 1".into(),
            ));
        }
        if self.workers == 0 {
            return Err(MatchError::InvalidConfig(
                "worker count must be at least 1".into(),
            ));
        }
        if self.registry_timeout_secs == 0 {
            return Err(MatchError::InvalidConfig(
                "registry timeout must be at least 1 second".into(),
            ));
        }
        self.registry_url()?;
        Ok(())
    }

    pub fn registry_url(&self) -> Result<Url, MatchError> {
        let url = Url::parse(&self.registry_url).map_err(|e| {
            MatchError::InvalidConfig(format!("invalid registry URL '{}': {}", self.registry_url, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(MatchError::InvalidConfig(format!(
                "registry URL must be http or https, got '{}'",
                other
            ))),
        }
    }
}
