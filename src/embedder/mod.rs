/// Embedder trait and shared types for text embedding.
///
/// The embedding runtime itself is external; implementations adapt it to
/// this contract. See [`crate::ollama::OllamaClient`] for the HTTP adapter
/// and [`mock::MockEmbedder`] for a deterministic in-process one.
pub mod mock;

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("embedding request failed: {0}")]
    RequestFailed(String),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
}

/// Trait for text embedding implementations.
///
/// All implementations must be `Send + Sync` so one instance can be shared
/// between the index builder and the session.
pub trait Embedder: Send + Sync {
    /// Embed a single text string into exactly one vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;

    /// Identifier of the embedding model, for diagnostics.
    fn model_name(&self) -> &str;
}
