//! Command-line surface.
use std::path::PathBuf;

use clap::Parser;

use crate::app::{RunOptions, SessionMode};
use crate::config::Config;
use crate::error::RagError;
use crate::rag::DeliveryMode;

/// A local RAG-based AI assistant to retrieve team workflows and processes
/// information from locally stored documents.
#[derive(Parser, Debug)]
#[command(name = "docs-assistant", version)]
pub struct Cli {
    /// Enable streaming generated responses.
    #[arg(short, long)]
    pub stream: bool,

    /// Enable interactive prompting.
    #[arg(short, long)]
    pub interactive: bool,

    /// Path to local directory of documents to use for RAG prompting.
    ///
    /// Defaults to `sources_dir` from the configuration (`./docs/`).
    #[arg(short, long, value_name = "DIR")]
    pub docs: Option<PathBuf>,

    /// Path to a JSON configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long)]
    pub verbose: bool,

    /// Prompt for the AI assistant.
    pub prompt: Vec<String>,
}

impl Cli {
    /// Turn parsed arguments into run options, rejecting a blank docs path
    /// and, outside interactive mode, a blank prompt.
    pub fn run_options(&self, config: &Config) -> Result<RunOptions, RagError> {
        let docs_dir = self
            .docs
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.sources_dir));
        if docs_dir.to_string_lossy().trim().is_empty() {
            return Err(RagError::MissingDocs);
        }

        let mode = if self.interactive {
            SessionMode::Interactive
        } else {
            let prompt = self.prompt.join(" ").trim().to_string();
            if prompt.is_empty() {
                return Err(RagError::MissingPrompt);
            }
            SessionMode::OneShot(prompt)
        };

        Ok(RunOptions {
            docs_dir,
            mode,
            delivery: DeliveryMode::from_stream_flag(self.stream),
        })
    }
}
