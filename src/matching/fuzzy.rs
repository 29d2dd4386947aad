// src/matching/fuzzy.rs
// Edit-distance similarity primitives over normalized names.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use strsim::normalized_levenshtein;

/// Four [0, 1] string similarities. Empty input on either side scores 0.0.
///
/// `ratio` and `partial_ratio` are order sensitive; the token variants compare
/// sorted and de-duplicated token lists. `partial_ratio` aligns the shorter
/// string inside the longer one and is not symmetric in general.
pub trait FuzzyMetrics: Send + Sync {
    fn ratio(&self, a: &str, b: &str) -> f64;

    fn partial_ratio(&self, a: &str, b: &str) -> f64;

    fn token_sort_ratio(&self, a: &str, b: &str) -> f64 {
        let sorted_a = sorted_tokens(a).join(" ");
        let sorted_b = sorted_tokens(b).join(" ");
        self.ratio(&sorted_a, &sorted_b)
    }

    fn token_set_ratio(&self, a: &str, b: &str) -> f64 {
        let mut tokens_a = sorted_tokens(a);
        let mut tokens_b = sorted_tokens(b);
        tokens_a.dedup();
        tokens_b.dedup();
        if tokens_a.is_empty() || tokens_b.is_empty() {
            return 0.0;
        }
        let mut intersection: Vec<&str> = Vec::new();
        let mut only_a: Vec<&str> = Vec::new();
        for t in &tokens_a {
            if tokens_b.contains(t) {
                intersection.push(t);
            } else {
                only_a.push(t);
            }
        }
        let only_b: Vec<&str> = tokens_b
            .iter()
            .filter(|t| !tokens_a.contains(t))
            .map(String::as_str)
            .collect();

        let sect = intersection.join(" ");
        let combined_a = format!("{} {}", sect, only_a.join(" ")).trim().to_string();
        let combined_b = format!("{} {}", sect, only_b.join(" ")).trim().to_string();

        [
            self.ratio(&sect, &combined_a),
            self.ratio(&sect, &combined_b),
            self.ratio(&combined_a, &combined_b),
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuzzyKind {
    #[default]
    Indel,
    Levenshtein,
}

impl fmt::Display for FuzzyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FuzzyKind::Indel => "indel",
            FuzzyKind::Levenshtein => "levenshtein",
        })
    }
}

impl FromStr for FuzzyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indel" => Ok(FuzzyKind::Indel),
            "levenshtein" => Ok(FuzzyKind::Levenshtein),
            other => Err(format!("unknown fuzzy backend '{}'", other)),
        }
    }
}

impl FuzzyKind {
    pub fn build(self) -> Box<dyn FuzzyMetrics> {
        match self {
            FuzzyKind::Indel => Box::new(IndelFuzzy),
            FuzzyKind::Levenshtein => Box::new(LevenshteinFuzzy),
        }
    }
}

/// Insertion/deletion similarity, reported in whole percentage points.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndelFuzzy;

impl FuzzyMetrics for IndelFuzzy {
    fn ratio(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        round_percent(indel_ratio(&a, &b))
    }

    fn partial_ratio(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

        let mut best: f64 = 0.0;
        for (i, j, _) in matching_blocks(shorter, longer) {
            let start = j.saturating_sub(i);
            let end = (start + shorter.len()).min(longer.len());
            let score = indel_ratio(shorter, &longer[start..end]);
            if score > 0.995 {
                return 1.0;
            }
            best = best.max(score);
        }
        round_percent(best)
    }
}

/// The same constructions over normalized Levenshtein similarity.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinFuzzy;

impl FuzzyMetrics for LevenshteinFuzzy {
    fn ratio(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        normalized_levenshtein(a, b)
    }

    fn partial_ratio(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let a_len = a.chars().count();
        let b_len = b.chars().count();
        let (shorter, longer, width) = if a_len <= b_len { (a, b, a_len) } else { (b, a, b_len) };
        let longer: Vec<char> = longer.chars().collect();

        longer
            .windows(width)
            .map(|window| normalized_levenshtein(shorter, &window.iter().collect::<String>()))
            .fold(0.0, f64::max)
    }
}

fn round_percent(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

fn sorted_tokens(s: &str) -> Vec<String> {
    let cleaned: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    let mut tokens: Vec<String> = cleaned.split_whitespace().map(str::to_string).collect();
    tokens.sort();
    tokens
}

fn indel_ratio(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    2.0 * lcs_len(a, b) as f64 / (a.len() + b.len()) as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Maximal matching blocks `(i, j, len)` of `a` inside `b`, ordered, ending with
/// the `(a.len(), b.len(), 0)` sentinel.
fn matching_blocks(a: &[char], b: &[char]) -> Vec<(usize, usize, usize)> {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        b2j.entry(*c).or_default().push(j);
    }

    let mut queue = vec![(0, a.len(), 0, b.len())];
    let mut blocks = Vec::new();
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        blocks.push((i, j, k));
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }
    blocks.sort_unstable();

    let mut merged: Vec<(usize, usize, usize)> = Vec::with_capacity(blocks.len() + 1);
    for (i, j, k) in blocks {
        match merged.last_mut() {
            Some(last) if last.0 + last.2 == i && last.1 + last.2 == j => last.2 += k,
            _ => merged.push((i, j, k)),
        }
    }
    merged.push((a.len(), b.len(), 0));
    merged
}

/// Longest common run in `a[alo..ahi]` and `b[blo..bhi]`; ties go to the
/// earliest start in `a`, then in `b`.
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0);
    let mut j2len: HashMap<usize, usize> = HashMap::new();
    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next_j2len = HashMap::new();
        if let Some(positions) = b2j.get(c) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = if j > 0 { j2len.get(&(j - 1)).copied().unwrap_or(0) } else { 0 } + 1;
                next_j2len.insert(j, k);
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        j2len = next_j2len;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ratio_identical_and_disjoint() {
        let f = IndelFuzzy;
        assert!(approx(f.ratio("apple", "apple"), 1.0));
        assert!(approx(f.ratio("abc", "xyz"), 0.0));
        assert!(approx(f.ratio("", "apple"), 0.0));
        assert!(approx(f.ratio("", ""), 0.0));
    }

    #[test]
    fn test_ratio_counts_common_subsequence() {
        // lcs("microsoft", "amazon") = "mo" -> 2 * 2 / 15
        let f = IndelFuzzy;
        assert!(approx(f.ratio("microsoft", "amazon"), 0.27));
        assert!(approx(f.ratio("microsoft", "amazon"), f.ratio("amazon", "microsoft")));
    }

    #[test]
    fn test_partial_ratio_finds_substring() {
        let f = IndelFuzzy;
        assert!(approx(f.partial_ratio("test", "this is a test!"), 1.0));
        assert!(approx(f.partial_ratio("apple", "apple computer"), 1.0));
        assert!(f.partial_ratio("apple", "banana split") < 0.6);
    }

    #[test]
    fn test_partial_ratio_can_be_asymmetric() {
        let f = IndelFuzzy;
        // Equal lengths: the first argument is aligned inside the second.
        let forward = f.partial_ratio("abcd", "bcda");
        let backward = f.partial_ratio("bcda", "abcd");
        assert!(approx(forward, 0.75));
        assert!(approx(backward, 0.86));
    }

    #[test]
    fn test_matching_blocks_end_with_sentinel() {
        let a: Vec<char> = "abxcd".chars().collect();
        let b: Vec<char> = "abcd".chars().collect();
        let blocks = matching_blocks(&a, &b);
        assert_eq!(blocks, vec![(0, 0, 2), (3, 2, 2), (5, 4, 0)]);
    }

    #[test]
    fn test_token_sort_ignores_order() {
        let f = IndelFuzzy;
        assert!(approx(f.token_sort_ratio("fuzzy wuzzy bear", "bear wuzzy fuzzy"), 1.0));
        assert!(f.ratio("fuzzy wuzzy bear", "bear wuzzy fuzzy") < 1.0);
    }

    #[test]
    fn test_token_set_handles_subsets_and_duplicates() {
        let f = IndelFuzzy;
        assert!(approx(f.token_set_ratio("fuzzy was a bear", "fuzzy fuzzy was a bear"), 1.0));
        assert!(approx(f.token_set_ratio("acme", "acme widgets"), 1.0));
        assert!(approx(f.token_set_ratio("", "acme"), 0.0));
    }

    #[test]
    fn test_token_measures_are_symmetric() {
        let pairs = [
            ("acme widgets uk", "widgets acme"),
            ("barclays bank", "bank of scotland"),
            ("j smith", "smith jones"),
        ];
        for kind in [FuzzyKind::Indel, FuzzyKind::Levenshtein] {
            let f = kind.build();
            for (a, b) in pairs {
                assert!(approx(f.token_sort_ratio(a, b), f.token_sort_ratio(b, a)));
                assert!(approx(f.token_set_ratio(a, b), f.token_set_ratio(b, a)));
            }
        }
    }

    #[test]
    fn test_levenshtein_backend_ranges() {
        let f = LevenshteinFuzzy;
        assert!(approx(f.ratio("kitten", "kitten"), 1.0));
        assert!(approx(f.ratio("kitten", ""), 0.0));
        assert!(approx(f.partial_ratio("acme", "the acme store"), 1.0));
        let r = f.ratio("kitten", "sitting");
        assert!(r > 0.0 && r < 1.0);
    }
}
