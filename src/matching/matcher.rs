// src/matching/matcher.rs
// Facade composing normalization, scoring, decision and selection.

use log::info;
use std::sync::Arc;

use super::decision::{validate_threshold, MatchDecisionEngine};
use super::ensemble::{OverlapTokens, PreparedName, SimilarityEnsemble};
use super::fuzzy::FuzzyKind;
use super::normalize::{tokenize, NameNormalizer, NormalizerTables, TokenSet};
use super::policy::ScoringPolicy;
use super::selector::BestMatchSelector;
use super::semantic::{CachedSemanticProvider, SemanticProvider, TrigramEmbedder};
use crate::error::MatchError;
use crate::models::{Candidate, MatchResult, MatchVerdict, RawName, ScoreVector};
use crate::utils::config::MatcherConfig;

/// Builder for [`CompanyNameMatcher`]. Everything defaults to the built-in
/// company tables, the `company-v1` policy and the trigram embedder.
pub struct MatcherBuilder {
    tables: NormalizerTables,
    policy: ScoringPolicy,
    fuzzy: FuzzyKind,
    overlap: OverlapTokens,
    normalization_cache: usize,
    semantic: Option<Arc<dyn SemanticProvider>>,
}

impl Default for MatcherBuilder {
    fn default() -> Self {
        Self {
            tables: NormalizerTables::default(),
            policy: ScoringPolicy::default(),
            fuzzy: FuzzyKind::default(),
            overlap: OverlapTokens::default(),
            normalization_cache: 0,
            semantic: None,
        }
    }
}

impl MatcherBuilder {
    pub fn tables(mut self, tables: NormalizerTables) -> Self {
        self.tables = tables;
        self
    }

    pub fn policy(mut self, policy: ScoringPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn fuzzy(mut self, fuzzy: FuzzyKind) -> Self {
        self.fuzzy = fuzzy;
        self
    }

    pub fn overlap_tokens(mut self, overlap: OverlapTokens) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn normalization_cache(mut self, capacity: usize) -> Self {
        self.normalization_cache = capacity;
        self
    }

    pub fn semantic_provider(mut self, provider: Arc<dyn SemanticProvider>) -> Self {
        self.semantic = Some(provider);
        self
    }

    pub fn build(self) -> Result<CompanyNameMatcher, MatchError> {
        let engine = MatchDecisionEngine::new(self.policy)?;
        let normalizer =
            Arc::new(NameNormalizer::new(self.tables)?.with_cache(self.normalization_cache));
        let semantic = self
            .semantic
            .unwrap_or_else(|| Arc::new(TrigramEmbedder::new()) as Arc<dyn SemanticProvider>);
        let ensemble = SimilarityEnsemble::new(normalizer, self.fuzzy.build(), semantic, self.overlap);
        Ok(CompanyNameMatcher { ensemble, engine })
    }
}

pub struct CompanyNameMatcher {
    ensemble: SimilarityEnsemble,
    engine: MatchDecisionEngine,
}

impl CompanyNameMatcher {
    pub fn builder() -> MatcherBuilder {
        MatcherBuilder::default()
    }

    /// Default tables and policy with the built-in trigram embedder.
    pub fn standard() -> Result<Self, MatchError> {
        Self::builder().build()
    }

    /// Builds a matcher from runtime configuration, loading the scoring policy
    /// file when one is configured.
    pub fn from_config(config: &MatcherConfig) -> Result<Self, MatchError> {
        config.validate()?;
        let policy = match &config.scoring_policy_path {
            Some(path) => ScoringPolicy::from_json_file(path)
                .map_err(|e| MatchError::InvalidPolicy(format!("{:#}", e)))?,
            None => ScoringPolicy::default(),
        };
        info!(
            "🔧 Matcher: policy {}, fuzzy {}, overlap {}, threshold {}",
            policy.version, config.fuzzy, config.overlap_tokens, config.threshold
        );
        let semantic = CachedSemanticProvider::new(TrigramEmbedder::new(), config.embedding_cache_size);
        Self::builder()
            .policy(policy)
            .fuzzy(config.fuzzy)
            .overlap_tokens(config.overlap_tokens)
            .normalization_cache(config.normalization_cache_size)
            .semantic_provider(Arc::new(semantic))
            .build()
    }

    pub fn policy(&self) -> &ScoringPolicy {
        self.engine.policy()
    }

    pub fn ensemble(&self) -> &SimilarityEnsemble {
        &self.ensemble
    }

    pub fn semantic_provider(&self) -> &Arc<dyn SemanticProvider> {
        self.ensemble.semantic()
    }

    pub fn normalize(&self, raw: &str) -> String {
        self.ensemble.normalizer().normalize(raw)
    }

    pub fn core_name(&self, raw: &str) -> String {
        self.ensemble.normalizer().core_name(raw)
    }

    pub fn tokenize(&self, raw: &str) -> TokenSet {
        tokenize(&self.normalize(raw))
    }

    pub fn prepare(&self, raw: &str) -> PreparedName {
        self.ensemble.prepare(raw)
    }

    pub fn score(&self, name_a: &str, name_b: &str) -> ScoreVector {
        self.ensemble.score(name_a, name_b)
    }

    pub fn decide(&self, scores: &ScoreVector, threshold: f64) -> Result<MatchVerdict, MatchError> {
        validate_threshold(threshold)?;
        Ok(self.engine.decide(scores, threshold))
    }

    /// Scores and decides a single pair.
    pub fn compare(&self, name_a: &str, name_b: &str, threshold: f64) -> Result<MatchVerdict, MatchError> {
        validate_threshold(threshold)?;
        Ok(self.engine.decide(&self.score(name_a, name_b), threshold))
    }

    pub fn find_best_match(
        &self,
        query: &str,
        candidates: &[Candidate],
        threshold: f64,
    ) -> Result<MatchResult, MatchError> {
        validate_threshold(threshold)?;
        Ok(self.selector().select(query, candidates, threshold))
    }

    /// Matches one raw query against an already fetched pool. Missing or
    /// blank-after-normalization queries yield an `EmptyQuery` result.
    pub fn match_query(&self, query: &RawName, candidates: &[Candidate], threshold: f64) -> MatchResult {
        match self.prepare_query(query) {
            Some(prepared) => self.select_prepared(query, &prepared, candidates, threshold),
            None => MatchResult::empty_query(query.0.clone()),
        }
    }

    pub(crate) fn prepare_query(&self, query: &RawName) -> Option<PreparedName> {
        let normalized = self.ensemble.normalizer().normalize_opt(query.as_deref());
        if normalized.is_empty() {
            None
        } else {
            Some(self.ensemble.prepare_normalized(normalized))
        }
    }

    pub(crate) fn select_prepared(
        &self,
        query: &RawName,
        prepared: &PreparedName,
        candidates: &[Candidate],
        threshold: f64,
    ) -> MatchResult {
        self.selector()
            .select_prepared(query.0.clone(), prepared, candidates, threshold)
    }

    fn selector(&self) -> BestMatchSelector<'_> {
        BestMatchSelector::new(&self.ensemble, &self.engine)
    }
}
