/// One ranked row returned by [`super::Collection::query`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    pub id: String,
    pub document: String,
    /// Cosine distance to the query vector (0.0 = identical direction).
    pub distance: f64,
}

impl QueryMatch {
    /// Similarity in `[0, 1]` derived from cosine distance.
    #[must_use]
    pub fn similarity(&self) -> f64 {
        1.0 - (self.distance / 2.0)
    }
}
