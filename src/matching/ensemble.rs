// src/matching/ensemble.rs
// Computes the eight-signal score vector for a pair of names.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::fuzzy::FuzzyMetrics;
use super::normalize::{tokenize, NameNormalizer, TokenSet};
use super::semantic::SemanticProvider;
use crate::error::MatchError;
use crate::models::ScoreVector;
use crate::utils::candle::embedding_similarity;

/// Which token sets `token_overlap` compares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapTokens {
    /// Whitespace tokens of the normalized names.
    #[default]
    Lexical,
    /// Lemmas from the semantic provider.
    Lemmatized,
}

impl fmt::Display for OverlapTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverlapTokens::Lexical => "lexical",
            OverlapTokens::Lemmatized => "lemmatized",
        })
    }
}

impl FromStr for OverlapTokens {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexical" => Ok(OverlapTokens::Lexical),
            "lemmatized" | "lemmatised" => Ok(OverlapTokens::Lemmatized),
            other => Err(format!("unknown overlap token mode '{}'", other)),
        }
    }
}

/// A name with every per-name derivative computed once.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedName {
    pub normalized: String,
    pub core: String,
    pub tokens: TokenSet,
    pub embedding: Option<Vec<f32>>,
}

pub struct SimilarityEnsemble {
    normalizer: Arc<NameNormalizer>,
    fuzzy: Box<dyn FuzzyMetrics>,
    semantic: Arc<dyn SemanticProvider>,
    overlap: OverlapTokens,
}

impl SimilarityEnsemble {
    pub fn new(
        normalizer: Arc<NameNormalizer>,
        fuzzy: Box<dyn FuzzyMetrics>,
        semantic: Arc<dyn SemanticProvider>,
        overlap: OverlapTokens,
    ) -> Self {
        Self {
            normalizer,
            fuzzy,
            semantic,
            overlap,
        }
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    pub fn semantic(&self) -> &Arc<dyn SemanticProvider> {
        &self.semantic
    }

    pub fn prepare(&self, raw: &str) -> PreparedName {
        let normalized = self.normalizer.normalize(raw);
        self.prepare_normalized(normalized)
    }

    /// Derives core name, tokens and embedding from an already normalized name.
    /// Provider failures degrade to lexical tokens and a missing embedding.
    pub fn prepare_normalized(&self, normalized: String) -> PreparedName {
        let core = self.normalizer.core_of_normalized(&normalized);

        let tokens = match self.overlap {
            OverlapTokens::Lexical => tokenize(&normalized),
            OverlapTokens::Lemmatized => match self.semantic.lemmatize(&normalized) {
                Ok(lemmas) => lemmas.into_iter().collect(),
                Err(e) => {
                    warn!("⚠️ Lemmatizing '{}': {}", normalized, MatchError::semantic_provider(&e));
                    tokenize(&normalized)
                }
            },
        };

        let embedding = match self.semantic.embed(&normalized) {
            Ok(v) => v,
            Err(e) => {
                warn!("⚠️ Embedding '{}': {}", normalized, MatchError::semantic_provider(&e));
                None
            }
        };

        PreparedName {
            normalized,
            core,
            tokens,
            embedding,
        }
    }

    /// Scores two raw names.
    pub fn score(&self, name_a: &str, name_b: &str) -> ScoreVector {
        let a = self.prepare(name_a);
        let b = self.prepare(name_b);
        self.score_prepared(&a, &b)
    }

    pub fn score_prepared(&self, a: &PreparedName, b: &PreparedName) -> ScoreVector {
        let (na, nb) = (a.normalized.as_str(), b.normalized.as_str());
        let scores = ScoreVector {
            exact_match: indicator(na == nb),
            core_match: indicator(!a.core.is_empty() && a.core == b.core),
            token_overlap: token_overlap(&a.tokens, &b.tokens),
            fuzzy_ratio: self.fuzzy.ratio(na, nb),
            partial_ratio: self.fuzzy.partial_ratio(na, nb),
            token_sort_ratio: self.fuzzy.token_sort_ratio(na, nb),
            token_set_ratio: self.fuzzy.token_set_ratio(na, nb),
            embedding_similarity: embedding_similarity(
                a.embedding.as_deref(),
                b.embedding.as_deref(),
            ),
        };
        debug!("Scored '{}' vs '{}': {:?}", na, nb, scores);
        scores
    }
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// Shared tokens over the larger set size; 0.0 when either side is empty.
pub fn token_overlap(a: &TokenSet, b: &TokenSet) -> f64 {
    let largest = a.len().max(b.len());
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    a.intersection(b).count() as f64 / largest as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::fuzzy::FuzzyKind;
    use crate::matching::semantic::TrigramEmbedder;
    use crate::models::Signal;
    use anyhow::Result;

    fn ensemble(overlap: OverlapTokens) -> SimilarityEnsemble {
        SimilarityEnsemble::new(
            Arc::new(NameNormalizer::standard().unwrap()),
            FuzzyKind::Indel.build(),
            Arc::new(TrigramEmbedder::new()),
            overlap,
        )
    }

    const NAMES: &[&str] = &[
        "Apple Inc.",
        "Apple Incorporated",
        "Microsoft Corporation",
        "Amazon",
        "J. Smith",
        "Barclays Bank UK PLC",
        "The Royal Bank of Scotland plc",
        "Acme Widgets & Co Ltd",
        "Widgets Acme Limited",
        "Intl Business Machines Corp",
        "Global Investment Partners Ltd",
        "Smith & Sons Engineering",
    ];

    #[test]
    fn test_exact_and_core_signals() {
        let e = ensemble(OverlapTokens::Lexical);
        let s = e.score("Apple Inc.", "Apple Incorporated");
        assert_eq!(s.exact_match, 1.0);
        assert_eq!(s.core_match, 1.0);
        assert_eq!(s.token_overlap, 1.0);

        let s = e.score("Microsoft Corporation", "Amazon");
        assert_eq!(s.exact_match, 0.0);
        assert_eq!(s.core_match, 0.0);
        assert_eq!(s.token_overlap, 0.0);
    }

    #[test]
    fn test_empty_core_never_matches() {
        let e = ensemble(OverlapTokens::Lexical);
        // Both reduce to an empty core name.
        let s = e.score("Global Investment Partners Ltd", "The Global Investment");
        assert_eq!(s.core_match, 0.0);
    }

    #[test]
    fn test_token_overlap_uses_larger_set() {
        let a: TokenSet = ["acme", "widgets"].iter().map(|s| s.to_string()).collect();
        let b: TokenSet = ["acme", "widgets", "london", "north"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(token_overlap(&a, &b), 0.5);
        assert_eq!(token_overlap(&a, &TokenSet::new()), 0.0);
    }

    #[test]
    fn test_scores_stay_in_range_and_symmetric() {
        for overlap in [OverlapTokens::Lexical, OverlapTokens::Lemmatized] {
            let e = ensemble(overlap);
            for a in NAMES {
                for b in NAMES {
                    let ab = e.score(a, b);
                    let ba = e.score(b, a);
                    for (signal, value) in ab.iter() {
                        assert!((0.0..=1.0).contains(&value), "{} = {}", signal, value);
                    }
                    for signal in [
                        Signal::ExactMatch,
                        Signal::CoreMatch,
                        Signal::TokenOverlap,
                        Signal::TokenSortRatio,
                        Signal::TokenSetRatio,
                    ] {
                        assert_eq!(ab.get(signal), ba.get(signal), "{} for {} / {}", signal, a, b);
                    }
                    assert!((ab.embedding_similarity - ba.embedding_similarity).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_lemmatized_overlap_folds_plurals() {
        let lexical = ensemble(OverlapTokens::Lexical);
        let lemmatized = ensemble(OverlapTokens::Lemmatized);
        let a = "Pacific Battery";
        let b = "Pacific Batteries";
        assert_eq!(lexical.score(a, b).token_overlap, 0.5);
        assert_eq!(lemmatized.score(a, b).token_overlap, 1.0);
    }

    struct BrokenProvider;

    impl SemanticProvider for BrokenProvider {
        fn lemmatize(&self, _text: &str) -> Result<Vec<String>> {
            anyhow::bail!("lemmatizer offline")
        }

        fn embed(&self, _text: &str) -> Result<Option<Vec<f32>>> {
            anyhow::bail!("embedder offline")
        }
    }

    #[test]
    fn test_provider_failure_degrades_signals() {
        let e = SimilarityEnsemble::new(
            Arc::new(NameNormalizer::standard().unwrap()),
            FuzzyKind::Indel.build(),
            Arc::new(BrokenProvider),
            OverlapTokens::Lemmatized,
        );
        let s = e.score("Acme Widgets", "Acme Widgets");
        assert_eq!(s.embedding_similarity, 0.0);
        assert_eq!(s.token_overlap, 1.0);
        assert_eq!(s.exact_match, 1.0);
    }

    #[test]
    fn test_overlap_mode_parses() {
        assert_eq!("lexical".parse::<OverlapTokens>(), Ok(OverlapTokens::Lexical));
        assert_eq!(" Lemmatized ".parse::<OverlapTokens>(), Ok(OverlapTokens::Lemmatized));
        assert!("stems".parse::<OverlapTokens>().is_err());
    }
}
