use crate::index::{CatalogRow, SimilarityIndex, TermId, Vocabulary, WeightingParams};
use crate::tokenizer::tokenize;
use crate::{Error, Result};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_MAX_FEATURES: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildOptions {
    /// Keep only this many terms, ranked by total corpus count. `None` keeps all.
    pub max_features: Option<usize>,
    pub weighting: WeightingParams,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { max_features: Some(DEFAULT_MAX_FEATURES), weighting: WeightingParams::default() }
    }
}

struct TermStats {
    term: String,
    df: u32,
    total: u64,
}

/// Build an index with default options.
pub fn build(rows: Vec<CatalogRow>) -> Result<SimilarityIndex> {
    build_with(rows, &BuildOptions::default())
}

/// Fit the vocabulary over every row's combined text and compute one unit
/// TF-IDF vector per row. Rows repeating an earlier title are dropped.
pub fn build_with(rows: Vec<CatalogRow>, options: &BuildOptions) -> Result<SimilarityIndex> {
    if rows.is_empty() {
        return Err(Error::EmptyCorpus);
    }
    let rows = dedup_titles(rows);
    let tokenized: Vec<Vec<String>> = rows.iter().map(|r| tokenize(&r.combined_text)).collect();

    // Corpus statistics, kept in first-seen order.
    let mut stats: Vec<TermStats> = Vec::new();
    let mut lookup: HashMap<String, usize> = HashMap::new();
    for tokens in &tokenized {
        let mut seen_in_doc: HashSet<usize> = HashSet::new();
        for token in tokens {
            let idx = match lookup.get(token) {
                Some(&idx) => idx,
                None => {
                    lookup.insert(token.clone(), stats.len());
                    stats.push(TermStats { term: token.clone(), df: 0, total: 0 });
                    stats.len() - 1
                }
            };
            stats[idx].total += 1;
            if seen_in_doc.insert(idx) {
                stats[idx].df += 1;
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    let mut retained: Vec<usize> = (0..stats.len()).collect();
    if let Some(cap) = options.max_features {
        retained.sort_by_key(|&i| Reverse(stats[i].total));
        retained.truncate(cap);
        retained.sort_unstable();
    }

    let n = rows.len();
    let mut terms: HashMap<String, TermId> = HashMap::with_capacity(retained.len());
    let mut idf: Vec<f32> = Vec::with_capacity(retained.len());
    for i in retained {
        let s = &stats[i];
        terms.insert(s.term.clone(), idf.len() as TermId);
        idf.push(options.weighting.idf(n, s.df));
    }
    let vocabulary = Vocabulary::new(terms, idf);

    let vectors: Vec<_> = tokenized.iter().map(|t| vocabulary.transform(t, &options.weighting)).collect();
    let empty_rows = vectors.iter().filter(|v| v.is_zero()).count();
    if empty_rows > 0 {
        tracing::warn!(empty_rows, "rows without any vocabulary term get a zero vector");
    }
    tracing::info!(
        num_rows = n,
        seen_terms = stats.len(),
        num_terms = vocabulary.len(),
        "built vector space"
    );

    Ok(SimilarityIndex::from_parts(vocabulary, options.weighting, vectors, rows))
}

fn dedup_titles(rows: Vec<CatalogRow>) -> Vec<CatalogRow> {
    let before = rows.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(rows.len());
    let kept: Vec<CatalogRow> = rows.into_iter().filter(|r| seen.insert(r.title.clone())).collect();
    if kept.len() < before {
        tracing::info!(dropped = before - kept.len(), "dropped rows with duplicate titles");
    }
    kept
}
