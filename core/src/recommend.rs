use crate::index::{CatalogRow, SimilarityIndex};
use crate::ranker::{rank, Neighbor};
use crate::resolver::{SequenceRatio, TitleResolver, TitleSimilarity};
use crate::Result;

/// One recommended row, borrowed from the index.
#[derive(Debug, Clone, Copy)]
pub struct Recommendation<'a> {
    pub position: usize,
    pub score: f32,
    pub row: &'a CatalogRow,
}

/// The immutable query-side service: an index plus the resolver built over it.
/// Share it behind an `Arc` for concurrent readers.
pub struct Recommender<S = SequenceRatio> {
    index: SimilarityIndex,
    resolver: TitleResolver<S>,
}

impl Recommender<SequenceRatio> {
    pub fn new(index: SimilarityIndex) -> Self {
        let resolver = TitleResolver::new(&index);
        Self { index, resolver }
    }
}

impl<S: TitleSimilarity> Recommender<S> {
    pub fn with_resolver(index: SimilarityIndex, resolver: TitleResolver<S>) -> Self {
        Self { index, resolver }
    }

    pub fn index(&self) -> &SimilarityIndex { &self.index }

    pub fn resolver(&self) -> &TitleResolver<S> { &self.resolver }

    /// Row position of the catalog title best matching `title`.
    pub fn resolve(&self, title: &str) -> Result<usize> {
        self.resolver.resolve(title)
    }

    /// Rows most similar to the movie `title` resolves to, excluding that movie.
    pub fn recommend(&self, title: &str, top_n: usize) -> Result<Vec<Recommendation<'_>>> {
        let position = self.resolve(title)?;
        Ok(self.neighbors_of(position, top_n))
    }

    pub fn recommend_titles(&self, title: &str, top_n: usize) -> Result<Vec<String>> {
        Ok(self.recommend(title, top_n)?.into_iter().map(|r| r.row.title.clone()).collect())
    }

    /// Rows most similar to an already resolved position.
    pub fn neighbors_of(&self, position: usize, top_n: usize) -> Vec<Recommendation<'_>> {
        match self.index.vector(position) {
            Some(query) => self.materialize(rank(query, &self.index, top_n, Some(position))),
            None => Vec::new(),
        }
    }

    /// Rows most similar to free descriptive text, e.g. "heist thriller".
    pub fn similar_to_text(&self, text: &str, top_n: usize) -> Vec<Recommendation<'_>> {
        let query = self.index.vectorize(text);
        if query.is_zero() {
            return Vec::new();
        }
        self.materialize(rank(&query, &self.index, top_n, None))
    }

    fn materialize(&self, neighbors: Vec<Neighbor>) -> Vec<Recommendation<'_>> {
        neighbors
            .into_iter()
            .filter_map(|n| {
                self.index.row(n.position).map(|row| Recommendation { position: n.position, score: n.score, row })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build, Error};

    fn recommender() -> Recommender {
        Recommender::new(
            build(vec![
                CatalogRow::new(1, "Alpha", "space adventure heroic"),
                CatalogRow::new(2, "Beta", "space adventure comic"),
                CatalogRow::new(3, "Gamma", "romance drama slow"),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn recommends_by_shared_terms() {
        assert_eq!(recommender().recommend_titles("Alpha", 2).unwrap(), vec!["Beta", "Gamma"]);
    }

    #[test]
    fn never_recommends_the_query_itself() {
        let rec = recommender();
        let hits = rec.recommend("alpha", 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.row.title != "Alpha"));
    }

    #[test]
    fn unknown_title_propagates_not_found() {
        let err = recommender().recommend("zzzzzzzzzzzzzzzz", 2).unwrap_err();
        assert!(matches!(err, Error::TitleNotFound(ref t) if t == "zzzzzzzzzzzzzzzz"));
    }

    #[test]
    fn free_text_search() {
        let rec = recommender();
        let hits = rec.similar_to_text("slow romance", 1);
        assert_eq!(hits[0].row.title, "Gamma");
        assert!(rec.similar_to_text("the of and", 3).is_empty());
    }

    #[test]
    fn out_of_range_position_has_no_neighbors() {
        assert!(recommender().neighbors_of(99, 3).is_empty());
    }
}
