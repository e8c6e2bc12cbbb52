/// Generator trait and shared types for text generation.
///
/// Like the embedder, the language model runtime is external; this module
/// pins down the contract the response delivery relies on.
pub mod mock;

use thiserror::Error;

/// Errors that can occur during generation.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    RequestFailed(String),

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),

    #[error("model reported an error: {0}")]
    Model(String),
}

/// Incrementally delivered response text, in generation order.
pub type ChunkStream = Box<dyn Iterator<Item = Result<String, GenerationError>> + Send>;

/// One generation call: fixed system instructions plus the assembled prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
}

/// Trait for language model backends.
pub trait Generator: Send + Sync {
    /// Generate the complete response in one blocking call.
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, GenerationError>;

    /// Start a generation whose text arrives as a sequence of chunks.
    fn generate_stream(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<ChunkStream, GenerationError>;

    /// Identifier of the model, for diagnostics.
    fn model_name(&self) -> &str;
}
