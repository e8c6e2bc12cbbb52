//! Wires conversion, indexing and the session together for one run.
use std::future::Future;
use std::io::{self, BufRead};
use std::path::PathBuf;

use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::console::Output;
use crate::converter::{DocumentParser, FormatConverter};
use crate::db::Db;
use crate::embedder::Embedder;
use crate::error::RagError;
use crate::generator::Generator;
use crate::indexer::normalize::resolve_docs_dir;
use crate::indexer::{Indexer, collection_name, normalize_directory};
use crate::ollama::OllamaClient;
use crate::rag::{DeliveryMode, Session, SessionOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    OneShot(String),
    Interactive,
}

/// Everything the command line decides for a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub docs_dir: PathBuf,
    pub mode: SessionMode,
    pub delivery: DeliveryMode,
}

/// The external capabilities a run depends on.
pub struct Collaborators<'a> {
    pub parser: &'a dyn DocumentParser,
    pub embedder: &'a dyn Embedder,
    pub generator: &'a dyn Generator,
}

/// Convert, index, then answer. Each run gets its own in-memory collection.
pub fn run<R: BufRead>(
    config: &Config,
    options: &RunOptions,
    collaborators: &Collaborators<'_>,
    output: &dyn Output,
    input: R,
    token: &CancellationToken,
) -> Result<SessionOutcome, RagError> {
    // Reject a missing prompt before any conversion work.
    if let SessionMode::OneShot(prompt) = &options.mode {
        if prompt.trim().is_empty() {
            return Err(RagError::MissingPrompt);
        }
    }

    info!(
        "Embedding with {}, generating with {}",
        collaborators.embedder.model_name(),
        collaborators.generator.model_name()
    );

    let docs_dir = resolve_docs_dir(&options.docs_dir)?;
    let documents = normalize_directory(&docs_dir, collaborators.parser, output, token)?;

    let db = Db::open_in_memory()?;
    let name = collection_name(&config.collection_prefix);
    info!("Building collection {name}");
    let collection = Indexer::new(collaborators.embedder, output).build_index(
        &db,
        &name,
        &documents,
        token,
    )?;

    let session = Session::new(
        &collection,
        collaborators.embedder,
        collaborators.generator,
        config,
        output,
        options.delivery,
        token,
    );

    match &options.mode {
        SessionMode::OneShot(prompt) => {
            session.one_shot(prompt)?;
            Ok(SessionOutcome::Completed)
        }
        SessionMode::Interactive => session.interactive(input),
    }
}

/// [`run`] against a local Ollama server, reading questions from stdin.
pub fn run_with_ollama(
    config: &Config,
    options: &RunOptions,
    output: &dyn Output,
    token: &CancellationToken,
) -> Result<SessionOutcome, RagError> {
    let client = OllamaClient::from_config(config).map_err(|e| RagError::Client(e.to_string()))?;
    let collaborators = Collaborators {
        parser: &FormatConverter,
        embedder: &client,
        generator: &client,
    };

    let stdin = std::io::stdin();
    run(config, options, &collaborators, output, stdin.lock(), token)
}

/// How a supervised run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Success,
    Failure,
    /// The interrupt fired first; the caller should exit with status 0.
    Interrupted,
}

/// Print `error` with the `Error:` prefix, clearing any active indicator.
pub fn report_failure(output: &dyn Output, error: &RagError) {
    output.stop_status();
    output.error(&error.to_string());
}

/// Race the pipeline `worker` against `interrupt`.
///
/// On interrupt the token is cancelled, the indicator cleared and the
/// graceful notice printed; the worker is left running. An `interrupt` that
/// resolves to an error is ignored.
pub async fn supervise<W, I>(
    worker: W,
    interrupt: I,
    token: &CancellationToken,
    output: &dyn Output,
) -> Completion
where
    W: Future<Output = Result<Result<SessionOutcome, RagError>, JoinError>>,
    I: Future<Output = io::Result<()>>,
{
    tokio::select! {
        joined = worker => match joined {
            Ok(Ok(outcome)) => {
                info!("Finished: {outcome:?}");
                Completion::Success
            }
            Ok(Err(RagError::Cancelled)) => Completion::Success,
            Ok(Err(e)) => {
                report_failure(output, &e);
                Completion::Failure
            }
            Err(e) => {
                report_failure(output, &RagError::Client(e.to_string()));
                Completion::Failure
            }
        },
        Ok(()) = interrupt => {
            token.cancel();
            output.stop_status();
            output.print("");
            output.print("Ctrl+C pressed. Exiting gracefully...");
            Completion::Interrupted
        }
    }
}
