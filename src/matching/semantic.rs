// src/matching/semantic.rs
// Lemmatization and name embeddings behind a substitutable provider.

use anyhow::Result;
use log::{debug, info};
use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::lexicon::STOPWORDS;

pub const EMBEDDING_DIM: usize = 256;

/// Source of lemmas and vector embeddings for names.
///
/// Implementations must be deterministic for identical input. Both calls may
/// fail (a remote model being down, say); callers degrade the affected signal
/// to 0.0 rather than failing the comparison.
pub trait SemanticProvider: Send + Sync {
    /// Lemmas of content words, stopwords and punctuation removed, in input order.
    fn lemmatize(&self, text: &str) -> Result<Vec<String>>;

    /// Fixed-length embedding, or `None` when the text carries no signal.
    fn embed(&self, text: &str) -> Result<Option<Vec<f32>>>;

    /// Upper bound on concurrent calls this provider tolerates, if any.
    fn max_concurrency(&self) -> Option<usize> {
        None
    }

    /// (hits, misses) when the provider caches its results.
    fn cache_stats(&self) -> Option<(usize, usize)> {
        None
    }
}

/// Deterministic provider with no model runtime: FNV-hashed word and character
/// trigram features folded into a fixed-size vector, plus suffix-folding lemmas.
#[derive(Debug, Clone)]
pub struct TrigramEmbedder {
    stopwords: HashSet<&'static str>,
}

impl Default for TrigramEmbedder {
    fn default() -> Self {
        Self {
            stopwords: STOPWORDS.iter().copied().collect(),
        }
    }
}

impl TrigramEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    fn words(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
    }
}

impl SemanticProvider for TrigramEmbedder {
    fn lemmatize(&self, text: &str) -> Result<Vec<String>> {
        Ok(Self::words(text)
            .filter(|w| !self.stopwords.contains(w.as_str()))
            .map(|w| fold_plural(&w))
            .collect())
    }

    fn embed(&self, text: &str) -> Result<Option<Vec<f32>>> {
        let words: Vec<String> = Self::words(text).collect();
        if words.is_empty() {
            return Ok(None);
        }

        let mut vector = vec![0f32; EMBEDDING_DIM];
        for word in &words {
            vector[bucket(&format!("w:{}", fold_plural(word)))] += 1.0;

            let padded: Vec<char> = format!(" {} ", word).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                vector[bucket(&trigram)] += 0.5;
            }
        }
        Ok(Some(vector))
    }
}

fn bucket(feature: &str) -> usize {
    (fnv1a(feature) as usize) % EMBEDDING_DIM
}

fn fnv1a(s: &str) -> u32 {
    let mut hash: u32 = 2166136261;
    for byte in s.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

/// Light English plural folding: "companies" -> "company", "boxes" -> "box",
/// "banks" -> "bank". Leaves "glass", "status", "analysis" alone.
fn fold_plural(word: &str) -> String {
    let len = word.chars().count();
    if len > 4 && word.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if len > 4 && ["ches", "shes", "sses", "xes", "zes"].iter().any(|s| word.ends_with(s)) {
        return word[..word.len() - 2].to_string();
    }
    if len > 3
        && word.ends_with('s')
        && !["ss", "us", "is"].iter().any(|s| word.ends_with(s))
    {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Wraps a provider with LRU caches for lemmas and embeddings. Failures are
/// passed through and never cached.
pub struct CachedSemanticProvider<P: SemanticProvider> {
    inner: P,
    lemmas: Option<Mutex<LruCache<String, Vec<String>>>>,
    embeddings: Option<Mutex<LruCache<String, Option<Vec<f32>>>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<P: SemanticProvider> CachedSemanticProvider<P> {
    /// A capacity of zero disables caching.
    pub fn new(inner: P, capacity: usize) -> Self {
        info!("🧠 Semantic provider cache capacity: {}", capacity);
        let cap = NonZeroUsize::new(capacity);
        Self {
            inner,
            lemmas: cap.map(|c| Mutex::new(LruCache::new(c))),
            embeddings: cap.map(|c| Mutex::new(LruCache::new(c))),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// (hits, misses) across both caches.
    pub fn stats(&self) -> (usize, usize) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    fn record_hit(&self) {
        let hits = self.hits.fetch_add(1, Ordering::Relaxed) + 1;
        if hits % 1000 == 0 {
            let misses = self.misses.load(Ordering::Relaxed);
            debug!(
                "Semantic cache stats - hits: {}, misses: {}, hit rate: {:.2}%",
                hits,
                misses,
                hits as f64 / (hits + misses) as f64 * 100.0
            );
        }
    }

    fn cached<V: Clone>(
        &self,
        cache: &Option<Mutex<LruCache<String, V>>>,
        key: &str,
        compute: impl FnOnce() -> Result<V>,
    ) -> Result<V> {
        let Some(cache) = cache else {
            return compute();
        };
        if let Ok(mut guard) = cache.lock() {
            if let Some(value) = guard.get(key) {
                self.record_hit();
                return Ok(value.clone());
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = compute()?;
        if let Ok(mut guard) = cache.lock() {
            guard.put(key.to_string(), value.clone());
        }
        Ok(value)
    }
}

impl<P: SemanticProvider> SemanticProvider for CachedSemanticProvider<P> {
    fn lemmatize(&self, text: &str) -> Result<Vec<String>> {
        self.cached(&self.lemmas, text, || self.inner.lemmatize(text))
    }

    fn embed(&self, text: &str) -> Result<Option<Vec<f32>>> {
        self.cached(&self.embeddings, text, || self.inner.embed(text))
    }

    fn max_concurrency(&self) -> Option<usize> {
        self.inner.max_concurrency()
    }

    fn cache_stats(&self) -> Option<(usize, usize)> {
        Some(self.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::candle::embedding_similarity;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_lemmatize_drops_stopwords_and_folds_plurals() {
        let e = TrigramEmbedder::new();
        assert_eq!(
            e.lemmatize("the bank of scotland").unwrap(),
            vec!["bank".to_string(), "scotland".to_string()]
        );
        assert_eq!(
            e.lemmatize("pacific batteries and boxes").unwrap(),
            vec!["pacific".to_string(), "battery".to_string(), "box".to_string()]
        );
        assert_eq!(e.lemmatize("glass status").unwrap(), vec!["glass", "status"]);
        assert!(e.lemmatize("").unwrap().is_empty());
    }

    #[test]
    fn test_embed_is_deterministic_and_sized() {
        let e = TrigramEmbedder::new();
        let a = e.embed("acme widgets").unwrap().unwrap();
        let b = e.embed("acme widgets").unwrap().unwrap();
        assert_eq!(a.len(), EMBEDDING_DIM);
        assert_eq!(a, b);
        assert!(e.embed("   ").unwrap().is_none());
        assert!(e.embed("").unwrap().is_none());
    }

    #[test]
    fn test_similar_names_embed_closer() {
        let e = TrigramEmbedder::new();
        let acme = e.embed("acme widget").unwrap();
        let acme_plural = e.embed("acme widgets").unwrap();
        let other = e.embed("zenith pharmacy").unwrap();
        let near = embedding_similarity(acme.as_deref(), acme_plural.as_deref());
        let far = embedding_similarity(acme.as_deref(), other.as_deref());
        assert!(near > far, "near {} should exceed far {}", near, far);
        assert!(near > 0.8);
    }

    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl SemanticProvider for CountingProvider {
        fn lemmatize(&self, text: &str) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![text.to_string()])
        }

        fn embed(&self, text: &str) -> Result<Option<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text == "boom" {
                anyhow::bail!("model offline");
            }
            Ok(Some(vec![1.0, 0.0]))
        }

        fn max_concurrency(&self) -> Option<usize> {
            Some(2)
        }
    }

    #[test]
    fn test_cache_serves_repeats_and_skips_failures() {
        let cached = CachedSemanticProvider::new(
            CountingProvider {
                calls: AtomicUsize::new(0),
            },
            8,
        );
        cached.embed("acme").unwrap();
        cached.embed("acme").unwrap();
        cached.lemmatize("acme").unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);

        assert!(cached.embed("boom").is_err());
        assert!(cached.embed("boom").is_err());
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 4);

        assert_eq!(cached.stats().0, 1);
        assert_eq!(cached.max_concurrency(), Some(2));
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let cached = CachedSemanticProvider::new(
            CountingProvider {
                calls: AtomicUsize::new(0),
            },
            0,
        );
        cached.embed("acme").unwrap();
        cached.embed("acme").unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }
}
