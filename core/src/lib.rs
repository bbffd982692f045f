//! Content-based movie similarity: TF-IDF vectors over each movie's combined
//! descriptive tokens, cosine ranking, and fuzzy title resolution.

pub mod builder;
pub mod error;
pub mod index;
pub mod persist;
pub mod ranker;
pub mod recommend;
pub mod resolver;
pub mod tokenizer;

pub use builder::{build, build_with, BuildOptions};
pub use error::{Error, Result};
pub use index::{CatalogRow, DisplayFields, SimilarityIndex, SparseVector, TermId, Vocabulary, WeightingParams};
pub use ranker::{rank, Neighbor};
pub use recommend::{Recommendation, Recommender};
pub use resolver::{LevenshteinRatio, SequenceRatio, TitleResolver, TitleSimilarity};
