// src/matching/mod.rs
pub mod batch;
pub mod decision;
pub mod ensemble;
pub mod fuzzy;
pub mod lexicon;
pub mod matcher;
pub mod normalize;
pub mod policy;
pub mod selector;
pub mod semantic;

pub use batch::{BatchMatcher, BatchReport, CancellationFlag};
pub use decision::{MatchDecisionEngine, DEFAULT_MATCH_THRESHOLD};
pub use ensemble::{OverlapTokens, PreparedName, SimilarityEnsemble};
pub use fuzzy::{FuzzyKind, FuzzyMetrics, IndelFuzzy, LevenshteinFuzzy};
pub use matcher::{CompanyNameMatcher, MatcherBuilder};
pub use normalize::{tokenize, NameNormalizer, NormalizerTables, TokenSet};
pub use policy::{ScoringPolicy, SignalWeights};
pub use selector::BestMatchSelector;
pub use semantic::{CachedSemanticProvider, SemanticProvider, TrigramEmbedder};
