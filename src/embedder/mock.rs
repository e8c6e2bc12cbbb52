/// Mock embedder for testing purposes.
///
/// Hashes each lowercase word into a fixed number of buckets, so texts that
/// share vocabulary land close together under cosine distance.
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Embedder, EmbedderError};

/// A deterministic bag-of-words embedder.
///
/// Useful for exercising the pipeline without an embedding runtime.
pub struct MockEmbedder {
    pub dimensions: usize,
    calls: AtomicUsize,
}

impl MockEmbedder {
    /// Create a new `MockEmbedder` with the given dimensionality.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed` calls served so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut embedding = vec![0.0f32; self.dimensions];
        let words = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty());
        for word in words {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimensions as u64) as usize;
            embedding[bucket] += 1.0;
        }

        // Text without words still needs a non-zero direction.
        if embedding.iter().all(|v| *v == 0.0) {
            embedding[0] = 1.0;
        }

        // L2 normalize
        let norm_sq: f32 = embedding.iter().map(|v| v * v).sum();
        let inv = 1.0 / norm_sq.sqrt();
        for v in &mut embedding {
            *v *= inv;
        }

        Ok(embedding)
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
