use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type TermId = u32;

/// Display-only metadata. The similarity engine never reads these fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayFields {
    #[serde(default)]
    pub genres: Vec<String>,
    /// Average user rating, if any ratings exist.
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub crew: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub id: u64,
    pub title: String,
    /// Flattened genre, keyword, cast and director tokens.
    pub combined_text: String,
    #[serde(default)]
    pub display: DisplayFields,
}

impl CatalogRow {
    pub fn new(id: u64, title: impl Into<String>, combined_text: impl Into<String>) -> Self {
        Self { id, title: title.into(), combined_text: combined_text.into(), display: DisplayFields::default() }
    }
}

/// How raw term counts become weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightingParams {
    /// idf = ln((1 + N) / (1 + df)) + 1 when set, ln(N / df) + 1 otherwise.
    pub smooth_idf: bool,
    /// tf = 1 + ln(count) when set, raw count otherwise.
    pub sublinear_tf: bool,
}

impl Default for WeightingParams {
    fn default() -> Self {
        Self { smooth_idf: true, sublinear_tf: false }
    }
}

impl WeightingParams {
    pub fn idf(&self, num_docs: usize, df: u32) -> f32 {
        let n = num_docs as f32;
        let df = df as f32;
        if self.smooth_idf {
            ((1.0 + n) / (1.0 + df)).ln() + 1.0
        } else {
            (n / df.max(1.0)).ln() + 1.0
        }
    }

    pub fn tf(&self, count: u32) -> f32 {
        if count == 0 {
            0.0
        } else if self.sublinear_tf {
            1.0 + (count as f32).ln()
        } else {
            count as f32
        }
    }
}

/// Term to column mapping with the idf weight of every column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: HashMap<String, TermId>,
    idf: Vec<f32>,
}

impl Vocabulary {
    /// `terms` must map onto `0..idf.len()` exactly once per column.
    pub fn new(terms: HashMap<String, TermId>, idf: Vec<f32>) -> Self {
        Self { terms, idf }
    }

    pub fn len(&self) -> usize { self.idf.len() }

    pub fn is_empty(&self) -> bool { self.idf.is_empty() }

    pub fn term_id(&self, term: &str) -> Option<TermId> { self.terms.get(term).copied() }

    pub fn idf(&self, term_id: TermId) -> Option<f32> { self.idf.get(term_id as usize).copied() }

    /// Weight an already tokenized document. Out-of-vocabulary tokens are ignored.
    pub fn transform(&self, tokens: &[String], weighting: &WeightingParams) -> SparseVector {
        let mut counts: HashMap<TermId, u32> = HashMap::new();
        for token in tokens {
            if let Some(tid) = self.term_id(token) {
                *counts.entry(tid).or_insert(0) += 1;
            }
        }
        let weights = counts
            .into_iter()
            .map(|(tid, count)| (tid, weighting.tf(count) * self.idf[tid as usize]));
        let mut vector = SparseVector::from_pairs(weights);
        vector.normalize();
        vector
    }

    fn validate(&self) -> Result<(), String> {
        if self.terms.len() != self.idf.len() {
            return Err(format!("vocabulary has {} terms but {} idf weights", self.terms.len(), self.idf.len()));
        }
        let mut seen = vec![false; self.idf.len()];
        for (term, &tid) in &self.terms {
            match seen.get_mut(tid as usize) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => return Err(format!("column {tid} assigned twice (term '{term}')")),
                None => return Err(format!("term '{term}' maps outside dimension {}", self.idf.len())),
            }
        }
        Ok(())
    }
}

/// Sparse vector with strictly increasing column indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    indices: Vec<TermId>,
    values: Vec<f32>,
}

impl SparseVector {
    /// Collect (column, weight) pairs; zero weights are dropped.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (TermId, f32)>) -> Self {
        let mut pairs: Vec<(TermId, f32)> = pairs.into_iter().filter(|(_, w)| *w != 0.0).collect();
        pairs.sort_by_key(|(tid, _)| *tid);
        pairs.dedup_by_key(|(tid, _)| *tid);
        let (indices, values) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    pub fn nnz(&self) -> usize { self.indices.len() }

    pub fn is_zero(&self) -> bool { self.indices.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Scale to unit length. The zero vector stays zero.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for v in self.values.iter_mut() { *v /= norm; }
        }
    }

    /// Dot product by merging the two index lists; equals cosine similarity for unit vectors.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    fn validate(&self, dimension: usize) -> Result<(), String> {
        if self.indices.len() != self.values.len() {
            return Err("sparse vector has mismatched index and value counts".into());
        }
        if self.indices.windows(2).any(|w| w[0] >= w[1]) {
            return Err("sparse vector indices are not strictly increasing".into());
        }
        match self.indices.last() {
            Some(&last) if last as usize >= dimension => {
                Err(format!("sparse vector column {last} outside dimension {dimension}"))
            }
            _ => Ok(()),
        }
    }
}

/// The fitted vocabulary, one unit vector per row, and the rows themselves.
/// Row position is the only key shared between `vectors` and `rows`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityIndex {
    vocabulary: Vocabulary,
    weighting: WeightingParams,
    vectors: Vec<SparseVector>,
    rows: Vec<CatalogRow>,
}

impl SimilarityIndex {
    pub(crate) fn from_parts(
        vocabulary: Vocabulary,
        weighting: WeightingParams,
        vectors: Vec<SparseVector>,
        rows: Vec<CatalogRow>,
    ) -> Self {
        debug_assert_eq!(vectors.len(), rows.len());
        Self { vocabulary, weighting, vectors, rows }
    }

    pub fn len(&self) -> usize { self.rows.len() }

    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// Number of retained vocabulary terms.
    pub fn dimension(&self) -> usize { self.vocabulary.len() }

    pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }

    pub fn weighting(&self) -> &WeightingParams { &self.weighting }

    pub fn rows(&self) -> &[CatalogRow] { &self.rows }

    pub fn row(&self, position: usize) -> Option<&CatalogRow> { self.rows.get(position) }

    pub fn vectors(&self) -> &[SparseVector] { &self.vectors }

    pub fn vector(&self, position: usize) -> Option<&SparseVector> { self.vectors.get(position) }

    pub fn position_of_id(&self, id: u64) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    /// Project free text into this index's vector space.
    pub fn vectorize(&self, text: &str) -> SparseVector {
        self.vocabulary.transform(&tokenize(text), &self.weighting)
    }

    /// Check every alignment invariant; used when an index comes from outside the builder.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.vectors.len() != self.rows.len() {
            return Err(format!("{} vectors for {} rows", self.vectors.len(), self.rows.len()));
        }
        self.vocabulary.validate()?;
        let dimension = self.dimension();
        for (pos, v) in self.vectors.iter().enumerate() {
            v.validate(dimension).map_err(|e| format!("row {pos}: {e}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothed_idf_matches_formula() {
        let w = WeightingParams::default();
        let expected = (4.0f32 / 3.0).ln() + 1.0;
        assert!((w.idf(3, 2) - expected).abs() < 1e-6);
    }

    #[test]
    fn unsmoothed_idf_and_sublinear_tf() {
        let w = WeightingParams { smooth_idf: false, sublinear_tf: true };
        assert!((w.idf(4, 2) - (2.0f32.ln() + 1.0)).abs() < 1e-6);
        assert_eq!(w.tf(1), 1.0);
        assert!((w.tf(3) - (1.0 + 3.0f32.ln())).abs() < 1e-6);
        assert_eq!(w.tf(0), 0.0);
    }

    #[test]
    fn sparse_dot_merges_indices() {
        let a = SparseVector::from_pairs(vec![(0, 1.0), (3, 2.0), (7, 1.0)]);
        let b = SparseVector::from_pairs(vec![(3, 0.5), (7, 4.0), (9, 1.0)]);
        assert_eq!(a.dot(&b), 5.0);
        assert_eq!(a.dot(&b), b.dot(&a));
    }

    #[test]
    fn normalize_gives_unit_length() {
        let mut v = SparseVector::from_pairs(vec![(1, 3.0), (2, 4.0)]);
        v.normalize();
        assert!((v.norm() - 1.0).abs() < 1e-6);
        assert!((v.dot(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_stays_zero() {
        let mut v = SparseVector::default();
        v.normalize();
        assert!(v.is_zero());
        assert_eq!(v.norm(), 0.0);
    }

    #[test]
    fn validate_rejects_out_of_range_columns() {
        let v = SparseVector::from_pairs(vec![(5, 1.0)]);
        assert!(v.validate(3).is_err());
        assert!(v.validate(6).is_ok());
    }
}
