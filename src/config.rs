/// Configuration module for the docs assistant.
///
/// Handles loading, validating, and providing default configuration values.
/// The resulting `Config` is built once at startup and passed by reference
/// into every component; nothing mutates it afterwards.
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

// ── Default value functions ──────────────────────────────────────────

fn default_llm_model() -> String {
    "granite3.3:2b".to_string()
}

fn default_embed_model() -> String {
    "nomic-embed-text:latest".to_string()
}

fn default_system_prompt() -> String {
    concat!(
        "You are an AI assistant in the Red Hat CSI Client Tools team that focuses on ",
        "retrieving information from documentation to provide helpful knowledge about ",
        "the team's processes and workflows. ",
        "You have been provided with documents to use to generate your answers. ",
        "If you do not know the answer, please respond accordingly. ",
        "Never generate answers that cannot be found in provided resources. ",
        "Do not exceed 80 characters per line in your response message."
    )
    .to_string()
}

fn default_sources_dir() -> String {
    "./docs/".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_collection_prefix() -> String {
    "docs".to_string()
}

fn default_assistant_name() -> String {
    "Client Tools AI Assistant".to_string()
}

// ── Errors ───────────────────────────────────────────────────────────

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0:#}")]
    Load(anyhow::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ── Config struct ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Generative model used to answer questions.
    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    /// Model used for document and query embeddings.
    #[serde(default = "default_embed_model")]
    pub embed_model: String,

    /// Fixed system instruction sent with every generation request.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Document directory used when `--docs` is not given.
    #[serde(default = "default_sources_dir")]
    pub sources_dir: String,

    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Transport-level retries for embedding/generation calls. `0` fails fast.
    #[serde(default)]
    pub max_retries: u32,

    /// Upper bound (in characters) on the document text inlined in a prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_context_chars: Option<usize>,

    #[serde(default = "default_collection_prefix")]
    pub collection_prefix: String,

    /// Name shown in the interactive prompt.
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_model: default_llm_model(),
            embed_model: default_embed_model(),
            system_prompt: default_system_prompt(),
            sources_dir: default_sources_dir(),
            ollama_url: default_ollama_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: 0,
            max_context_chars: None,
            collection_prefix: default_collection_prefix(),
            assistant_name: default_assistant_name(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from an optional JSON file.
    ///
    /// Without a path the built-in defaults are used. A path that cannot be
    /// read or parsed is an error; fields missing from the file fall back to
    /// their defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = config_path else {
            info!("No configuration file given, using defaults");
            return Ok(Self::default());
        };

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))
            .map_err(ConfigError::Load)?;

        let cfg: Config = serde_json::from_str(&data)
            .with_context(|| format!("invalid JSON in {}", path.display()))
            .map_err(ConfigError::Load)?;

        info!("Loaded configuration from {}", path.display());
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(!self.llm_model.trim().is_empty(), "llm_model must not be empty")?;
        ensure(
            !self.embed_model.trim().is_empty(),
            "embed_model must not be empty",
        )?;
        ensure(
            !self.ollama_url.trim().is_empty(),
            "ollama_url must not be empty",
        )?;
        ensure(
            self.request_timeout_secs > 0,
            "request_timeout_secs must be positive",
        )?;
        ensure(
            is_identifier(&self.collection_prefix),
            "collection_prefix must be non-empty and contain only ASCII letters, digits or '_'",
        )?;
        ensure(
            self.max_context_chars != Some(0),
            "max_context_chars must be positive when set",
        )?;
        Ok(())
    }
}

fn ensure(condition: bool, message: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid(message.to_string()))
    }
}

/// Whether `s` is usable as part of a SQL table name without quoting tricks.
pub(crate) fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ── Tests ────────────────────────────────────────────────────────────
