// src/registry/memory.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::CandidateProvider;
use crate::matching::normalize::{tokenize, NameNormalizer};
use crate::models::Candidate;

/// Registry held in memory, searched through an inverted index over
/// normalized name tokens. Useful for reference lists and tests.
pub struct InMemoryRegistry {
    records: Vec<Candidate>,
    index: HashMap<String, Vec<usize>>,
}

#[derive(Debug, Deserialize)]
struct RegistryRow {
    company_name: Option<String>,
    company_number: Option<String>,
}

impl InMemoryRegistry {
    pub fn new(records: Vec<Candidate>, normalizer: &NameNormalizer) -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            for token in tokenize(&normalizer.normalize(&record.name)) {
                index.entry(token).or_default().push(i);
            }
        }
        Self { records, index }
    }

    /// Loads `company_name` / `company_number` columns from a CSV file.
    /// Rows missing either column are skipped.
    pub fn from_csv(path: impl AsRef<Path>, normalizer: &NameNormalizer) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open reference file {}", path.display()))?;

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for row in reader.deserialize::<RegistryRow>() {
            let row = row.with_context(|| format!("Malformed row in {}", path.display()))?;
            match (row.company_name, row.company_number) {
                (Some(name), Some(number)) if !name.trim().is_empty() && !number.trim().is_empty() => {
                    records.push(Candidate::new(name, number.trim()));
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!("⚠️  Skipped {} reference rows without a name or number", skipped);
        }
        info!("📚 Loaded {} reference companies from {}", records.len(), path.display());
        Ok(Self::new(records, normalizer))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records sharing at least one token with the query, most shared tokens
    /// first, insertion order breaking ties.
    pub fn search(&self, normalized_query: &str, limit: usize) -> Vec<Candidate> {
        let mut shared: HashMap<usize, usize> = HashMap::new();
        for token in tokenize(normalized_query) {
            if let Some(postings) = self.index.get(&token) {
                for &i in postings {
                    *shared.entry(i).or_insert(0) += 1;
                }
            }
        }
        let mut ranked: Vec<(usize, usize)> = shared.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
            .into_iter()
            .take(limit)
            .map(|(i, _)| self.records[i].clone())
            .collect()
    }
}

#[async_trait]
impl CandidateProvider for InMemoryRegistry {
    async fn fetch_candidates(&self, normalized_query: &str, limit: usize) -> Result<Vec<Candidate>> {
        Ok(self.search(normalized_query, limit))
    }
}
