// src/matching/normalize.rs
// Company name canonicalization: case, punctuation, abbreviation and country
// expansion, legal-form removal, generic trailing word stripping.

use log::debug;
use lru::LruCache;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Mutex;

use super::lexicon::{
    ABBREVIATIONS, COMMON_WORDS, COUNTRIES, DOTTED_LEGAL_FORMS, LEGAL_FORMS, PUNCTUATION,
    STOPWORDS,
};
use crate::error::MatchError;

/// Upper bound on full pipeline passes while searching for a fixed point.
const MAX_NORMALIZATION_PASSES: usize = 8;

const COMPANY_CONNECTORS: [&str; 2] = ["and co", "& co"];

pub type TokenSet = HashSet<String>;

/// Word tables driving normalization. Swap them out to normalize for another registry.
#[derive(Debug, Clone)]
pub struct NormalizerTables {
    pub punctuation: Vec<char>,
    pub abbreviations: HashMap<String, String>,
    pub countries: HashMap<String, String>,
    pub legal_forms: Vec<String>,
    pub dotted_legal_forms: Vec<String>,
    pub common_words: Vec<String>,
    pub stopwords: HashSet<String>,
}

impl Default for NormalizerTables {
    fn default() -> Self {
        let to_map = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>()
        };
        Self {
            punctuation: PUNCTUATION.chars().collect(),
            abbreviations: to_map(ABBREVIATIONS),
            countries: to_map(COUNTRIES),
            legal_forms: LEGAL_FORMS.iter().map(|s| s.to_string()).collect(),
            dotted_legal_forms: DOTTED_LEGAL_FORMS.iter().map(|s| s.to_string()).collect(),
            common_words: COMMON_WORDS.iter().map(|s| s.to_string()).collect(),
            stopwords: STOPWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub struct NameNormalizer {
    tables: NormalizerTables,
    common_word_set: HashSet<String>,
    legal_form_regex: Regex,
    dotted_form_regex: Regex,
    cache: Option<Mutex<LruCache<String, String>>>,
}

impl NameNormalizer {
    pub fn new(tables: NormalizerTables) -> Result<Self, MatchError> {
        let legal_form_regex = build_legal_form_regex(&tables)?;
        let dotted_form_regex = build_dotted_form_regex(&tables)?;
        let common_word_set = tables.common_words.iter().cloned().collect();
        Ok(Self {
            tables,
            common_word_set,
            legal_form_regex,
            dotted_form_regex,
            cache: None,
        })
    }

    /// Normalizer over the built-in company tables.
    pub fn standard() -> Result<Self, MatchError> {
        Self::new(NormalizerTables::default())
    }

    /// Memoize normalized forms keyed by the raw input. A capacity of zero disables it.
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        self
    }

    pub fn tables(&self) -> &NormalizerTables {
        &self.tables
    }

    /// Missing input normalizes to the empty string.
    pub fn normalize_opt(&self, raw: Option<&str>) -> String {
        raw.map(|r| self.normalize(r)).unwrap_or_default()
    }

    /// Canonical form of a company name. Repeated application is a no-op.
    pub fn normalize(&self, raw: &str) -> String {
        if let Some(cache) = &self.cache {
            if let Ok(mut guard) = cache.lock() {
                if let Some(hit) = guard.get(raw) {
                    return hit.clone();
                }
            }
        }

        let mut current = self.normalize_pass(raw);
        let mut passes = 1;
        loop {
            let next = self.normalize_pass(&current);
            if next == current {
                break;
            }
            passes += 1;
            if passes >= MAX_NORMALIZATION_PASSES {
                debug!("Normalization of '{}' did not settle after {} passes", raw, passes);
                current = next;
                break;
            }
            current = next;
        }

        if let Some(cache) = &self.cache {
            if let Ok(mut guard) = cache.lock() {
                guard.put(raw.to_string(), current.clone());
            }
        }
        current
    }

    /// Stricter representation without stopwords or generic industry terms.
    /// Empty when the name carries nothing distinctive.
    pub fn core_name(&self, raw: &str) -> String {
        let normalized = self.normalize(raw);
        self.core_of_normalized(&normalized)
    }

    pub fn core_of_normalized(&self, normalized: &str) -> String {
        normalized
            .split_whitespace()
            .filter(|token| {
                let lower = token.to_lowercase();
                !self.tables.stopwords.contains(&lower) && !self.common_word_set.contains(&lower)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn normalize_pass(&self, raw: &str) -> String {
        let mut name = raw.to_lowercase();

        // "l.l.c." -> " llc " before dots turn into word breaks.
        name = self
            .dotted_form_regex
            .replace_all(&name, |caps: &regex::Captures| {
                let letters: String = caps[0].chars().filter(|c| c.is_alphanumeric()).collect();
                format!(" {} ", letters)
            })
            .into_owned();

        name = name
            .chars()
            .map(|c| if self.tables.punctuation.contains(&c) { ' ' } else { c })
            .collect();
        name = name.replace('&', " and ");
        name = collapse_whitespace(&name);

        name = name
            .split(' ')
            .map(|token| {
                self.tables
                    .abbreviations
                    .get(token)
                    .or_else(|| self.tables.countries.get(token))
                    .map(String::as_str)
                    .unwrap_or(token)
            })
            .collect::<Vec<_>>()
            .join(" ");

        name = self.legal_form_regex.replace_all(&name, " ").into_owned();
        name = collapse_whitespace(&name);

        name = self.strip_trailing_common_words(name);

        for connector in COMPANY_CONNECTORS {
            while name.contains(connector) {
                name = name.replace(connector, "");
            }
        }
        collapse_whitespace(&name)
    }

    fn strip_trailing_common_words(&self, mut name: String) -> String {
        loop {
            let stripped = self.tables.common_words.iter().find_map(|word| {
                name.strip_suffix(word.as_str())
                    .filter(|rest| rest.ends_with(char::is_whitespace))
                    .map(|rest| rest.trim_end().to_string())
            });
            match stripped {
                Some(rest) => name = rest,
                None => return name,
            }
        }
    }
}

/// Whitespace-split, case-folded, de-duplicated tokens of a normalized name.
pub fn tokenize(normalized: &str) -> TokenSet {
    normalized
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn build_legal_form_regex(tables: &NormalizerTables) -> Result<Regex, MatchError> {
    let mut alternatives: Vec<String> = tables
        .legal_forms
        .iter()
        .map(|form| regex::escape(form))
        .collect();
    // Longest first so "corporation" wins over "corp".
    alternatives.sort_by(|a, b| b.len().cmp(&a.len()));
    let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
    Regex::new(&pattern)
        .map_err(|e| MatchError::InvalidConfig(format!("legal form pattern failed to compile: {}", e)))
}

/// Matches designators spelled with a dot after every letter but the last
/// (trailing dot optional). Bare runs of single letters such as "c o" are left alone.
fn build_dotted_form_regex(tables: &NormalizerTables) -> Result<Regex, MatchError> {
    let mut alternatives: Vec<String> = tables
        .dotted_legal_forms
        .iter()
        .filter(|form| form.chars().count() > 1)
        .map(|form| {
            let letters: Vec<String> = form.chars().map(|c| regex::escape(&c.to_string())).collect();
            letters.join(r"\.\s?")
        })
        .collect();
    alternatives.sort_by(|a, b| b.len().cmp(&a.len()));
    let pattern = format!(r"(?i)\b(?:{})\b\.?", alternatives.join("|"));
    Regex::new(&pattern)
        .map_err(|e| MatchError::InvalidConfig(format!("dotted legal form pattern failed to compile: {}", e)))
}
