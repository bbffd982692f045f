//! Free-text title lookup.
//!
//! An exact case-insensitive match wins outright. Otherwise every catalog title
//! is scored with a [`TitleSimilarity`] ratio and the best one is accepted only
//! if it reaches [`DEFAULT_CUTOFF`]; ties go to the earliest row.

use crate::tokenizer::normalize_title;
use crate::{Error, Result, SimilarityIndex};
use std::collections::HashMap;

pub const DEFAULT_CUTOFF: f64 = 0.5;

/// Similarity between two normalized titles, in `0.0..=1.0`.
///
/// Ratios need not be symmetric. The resolver always passes the catalog title
/// first and the user's query second.
pub trait TitleSimilarity {
    fn ratio(&self, candidate: &str, query: &str) -> f64;
}

/// Ratcliff/Obershelp ratio: `2 * M / T`, where `M` counts characters in the
/// recursively found longest matching blocks and `T` is the combined length.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceRatio;

impl TitleSimilarity for SequenceRatio {
    fn ratio(&self, candidate: &str, query: &str) -> f64 {
        let a: Vec<char> = candidate.chars().collect();
        let b: Vec<char> = query.chars().collect();
        let total = a.len() + b.len();
        if total == 0 {
            return 1.0;
        }
        2.0 * matching_chars(&a, &b) as f64 / total as f64
    }
}

/// `1 - edit_distance / max_len`, measured in chars.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinRatio;

impl TitleSimilarity for LevenshteinRatio {
    fn ratio(&self, candidate: &str, query: &str) -> f64 {
        let a: Vec<char> = candidate.chars().collect();
        let b: Vec<char> = query.chars().collect();
        let max_len = a.len().max(b.len());
        if max_len == 0 {
            return 1.0;
        }
        1.0 - levenshtein_distance(&a, &b) as f64 / max_len as f64
    }
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }
    total
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, len)`.
/// Among equally long blocks the one starting earliest in `a`, then in `b`, wins.
fn longest_match(a: &[char], b: &[char], alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut best = (alo, blo, 0);
    // prev[jj + 1] = length of the common run ending at a[i - 1], b[blo + jj]
    let mut prev = vec![0usize; width + 1];
    let mut cur = vec![0usize; width + 1];
    for i in alo..ahi {
        for jj in 0..width {
            cur[jj + 1] = if a[i] == b[blo + jj] { prev[jj] + 1 } else { 0 };
            let k = cur[jj + 1];
            if k > best.2 {
                best = (i + 1 - k, blo + jj + 1 - k, k);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    best
}

fn levenshtein_distance(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev_row: Vec<usize> = (0..=b.len()).collect();
    let mut curr_row = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr_row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr_row[j + 1] = (curr_row[j] + 1).min(prev_row[j + 1] + 1).min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }
    prev_row[b.len()]
}

/// Maps query strings to row positions of one index.
pub struct TitleResolver<S = SequenceRatio> {
    titles: Vec<String>,
    exact: HashMap<String, usize>,
    similarity: S,
    cutoff: f64,
}

impl TitleResolver<SequenceRatio> {
    pub fn new(index: &SimilarityIndex) -> Self {
        Self::with_similarity(index, SequenceRatio)
    }
}

impl<S: TitleSimilarity> TitleResolver<S> {
    pub fn with_similarity(index: &SimilarityIndex, similarity: S) -> Self {
        let titles: Vec<String> = index.rows().iter().map(|r| normalize_title(&r.title)).collect();
        let mut exact = HashMap::with_capacity(titles.len());
        for (pos, t) in titles.iter().enumerate() {
            exact.entry(t.clone()).or_insert(pos);
        }
        Self { titles, exact, similarity, cutoff: DEFAULT_CUTOFF }
    }

    /// Override the acceptance threshold, clamped to `0.0..=1.0`.
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff.clamp(0.0, 1.0);
        self
    }

    pub fn cutoff(&self) -> f64 { self.cutoff }

    pub fn resolve(&self, query: &str) -> Result<usize> {
        let normalized = normalize_title(query);
        if normalized.is_empty() {
            return Err(Error::TitleNotFound(query.to_string()));
        }
        if let Some(&pos) = self.exact.get(&normalized) {
            return Ok(pos);
        }

        let mut best: Option<(usize, f64)> = None;
        for (pos, title) in self.titles.iter().enumerate() {
            let score = self.similarity.ratio(title, &normalized);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((pos, score));
            }
        }
        match best {
            Some((pos, score)) if score >= self.cutoff => {
                tracing::debug!(query, matched = %self.titles[pos], score, "fuzzy title match");
                Ok(pos)
            }
            _ => Err(Error::TitleNotFound(query.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build, CatalogRow};

    fn catalog(titles: &[&str]) -> SimilarityIndex {
        let rows = titles.iter().enumerate().map(|(i, t)| CatalogRow::new(i as u64 + 1, *t, "drama")).collect();
        build(rows).unwrap()
    }

    #[test]
    fn sequence_ratio_known_values() {
        let r = SequenceRatio;
        assert_eq!(r.ratio("abcd", "abcd"), 1.0);
        assert_eq!(r.ratio("abcd", "wxyz"), 0.0);
        // "abcd" vs "bcde": block "bcd" -> 2*3/8
        assert!((r.ratio("abcd", "bcde") - 0.75).abs() < 1e-12);
        // "the dark kn" + "ght" -> 2*14/29
        assert!((r.ratio("the dark knght", "the dark knight") - 28.0 / 29.0).abs() < 1e-12);
    }

    #[test]
    fn sequence_ratio_recurses_on_both_sides() {
        // blocks: "ab" then "d" on the right side
        assert_eq!(matching_chars(&['a', 'b', 'x', 'd'], &['a', 'b', 'y', 'd']), 3);
    }

    #[test]
    fn sequence_ratio_depends_on_argument_order() {
        let r = SequenceRatio;
        assert!((r.ratio("cab", "a bc") - 2.0 / 7.0).abs() < 1e-12);
        assert!((r.ratio("a bc", "cab") - 4.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn resolver_scores_catalog_title_first() {
        let index = catalog(&["cab"]);
        let err = TitleResolver::new(&index).resolve("a bc").unwrap_err();
        assert!(matches!(err, Error::TitleNotFound(_)));
    }

    #[test]
    fn levenshtein_ratio_known_values() {
        let r = LevenshteinRatio;
        assert_eq!(r.ratio("", ""), 1.0);
        assert!((r.ratio("kitten", "sitting") - (1.0 - 3.0 / 7.0)).abs() < 1e-12);
    }

    #[test]
    fn exact_match_ignores_case() {
        let index = catalog(&["Heat", "The Dark Knight", "Up"]);
        let resolver = TitleResolver::new(&index);
        assert_eq!(resolver.resolve("the DARK knight").unwrap(), 1);
    }

    #[test]
    fn typo_resolves_to_same_row() {
        let index = catalog(&["The Dark Knight Rises", "The Dark Knight", "Inception"]);
        let resolver = TitleResolver::new(&index);
        let exact = resolver.resolve("The Dark Knight").unwrap();
        assert_eq!(resolver.resolve("the dark knght").unwrap(), exact);
    }

    #[test]
    fn unrelated_query_is_not_found() {
        let index = catalog(&["Heat", "The Dark Knight", "Inception"]);
        let resolver = TitleResolver::new(&index);
        let err = resolver.resolve("totally unrelated nonsense string").unwrap_err();
        assert!(matches!(err, Error::TitleNotFound(_)));
    }

    #[test]
    fn blank_query_is_not_found() {
        let index = catalog(&["Heat"]);
        assert!(matches!(TitleResolver::new(&index).resolve("   "), Err(Error::TitleNotFound(_))));
    }

    #[test]
    fn ties_go_to_earliest_row() {
        let index = catalog(&["abcx", "abcy"]);
        let resolver = TitleResolver::new(&index);
        assert_eq!(resolver.resolve("abcz").unwrap(), 0);
    }

    #[test]
    fn duplicate_case_variants_resolve_to_first() {
        let index = catalog(&["Solaris", "SOLARIS"]);
        assert_eq!(TitleResolver::new(&index).resolve("solaris").unwrap(), 0);
    }

    #[test]
    fn cutoff_is_configurable() {
        let index = catalog(&["abcd"]);
        let strict = TitleResolver::new(&index).with_cutoff(0.9);
        assert!(strict.resolve("bcde").is_err());
        let loose = TitleResolver::new(&index).with_cutoff(0.7);
        assert_eq!(loose.resolve("bcde").unwrap(), 0);
    }

    #[test]
    fn alternative_similarity_plugs_in() {
        let index = catalog(&["Alien", "Aliens", "Heat"]);
        let resolver = TitleResolver::with_similarity(&index, LevenshteinRatio);
        assert_eq!(resolver.resolve("aliems").unwrap(), 1);
    }
}
