//! Crate-level error type aggregating every component's failures.
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::db::StoreError;
use crate::embedder::EmbedderError;
use crate::generator::GenerationError;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("documentation for RAG not found. Please check '--help'.")]
    MissingDocs,

    #[error("documentation path is invalid: {path}: {source}")]
    InvalidDocsPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("In non-interactive mode, a prompt must be provided. Please check '--help'.")]
    MissingPrompt,

    #[error(
        "no documents found. Please add documents to your docs folder. Please check '--help'."
    )]
    NoDocumentsFound,

    #[error("no documents were converted. Check that the files are valid.")]
    NoDocumentsConverted,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Embedding(#[from] EmbedderError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("collection is empty")]
    EmptyCollection,

    #[error("failed to start client: {0}")]
    Client(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The user interrupted the run.
    #[error("cancelled")]
    Cancelled,
}

impl RagError {
    /// Errors that come from an external collaborator mid-session.
    #[must_use]
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            Self::Embedding(_) | Self::Generation(_) | Self::Store(_)
        )
    }
}
