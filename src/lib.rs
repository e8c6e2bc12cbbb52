//! # docs-assistant: Local RAG Assistant
//!
//! Converts a directory of PDF, DOCX, HTML and XLSX files to text, embeds
//! them into a fresh in-memory vector collection, and answers questions by
//! handing the single nearest document to a local LLM.
//!
//! ## Architecture
//!
//! - **[`config`]**: Configuration loading and validation
//! - **[`converter`]**: Format detection and text extraction
//! - **[`indexer`]**: Document discovery, normalization and embedding
//! - **[`db`]**: SQLite + sqlite-vec collections (add, nearest-neighbor query)
//! - **[`embedder`]** / **[`generator`]**: Model capabilities, with mocks
//! - **[`ollama`]**: Ollama HTTP client implementing both capabilities
//! - **[`rag`]**: Retrieval, prompt assembly, delivery, session loop
//! - **[`console`]**: Terminal output and the working indicator
//! - **[`app`]** / **[`cli`]**: Run orchestration and argument parsing

pub mod app;
pub mod cli;
pub mod config;
pub mod console;
pub mod converter;
pub mod db;
pub mod embedder;
pub mod error;
pub mod generator;
pub mod indexer;
pub mod ollama;
pub mod rag;

pub use error::RagError;
