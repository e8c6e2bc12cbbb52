//! One-shot and interactive question answering over a built collection.
use std::io::BufRead;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::console::{Output, status};
use crate::db::Collection;
use crate::embedder::Embedder;
use crate::error::RagError;
use crate::generator::Generator;
use crate::rag::delivery::{DeliveryMode, deliver};
use crate::rag::prompt::assemble;
use crate::rag::retriever::Retriever;

pub const HELP_TEXT: &str = "Type 'exit' to exit, or ask a question to the AI.";

/// What one line of interactive input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Help,
    Ask(String),
}

/// Trim `line` and classify it. `exit` and `help` are case-insensitive;
/// blank input counts as `help`.
pub fn parse_command(line: &str) -> Command {
    let input = line.trim();
    if input.eq_ignore_ascii_case("exit") {
        Command::Exit
    } else if input.is_empty() || input.eq_ignore_ascii_case("help") {
        Command::Help
    } else {
        Command::Ask(input.to_string())
    }
}

/// One question, the document it was answered from, and the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub prompt: String,
    pub context: String,
    pub response: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The one-shot question was answered.
    Completed,
    /// The user typed `exit`.
    Exited,
    /// Input was closed.
    EndOfInput,
    Cancelled,
}

pub struct Session<'a> {
    collection: &'a Collection<'a>,
    embedder: &'a dyn Embedder,
    generator: &'a dyn Generator,
    config: &'a Config,
    output: &'a dyn Output,
    mode: DeliveryMode,
    token: &'a CancellationToken,
}

impl<'a> Session<'a> {
    pub fn new(
        collection: &'a Collection<'a>,
        embedder: &'a dyn Embedder,
        generator: &'a dyn Generator,
        config: &'a Config,
        output: &'a dyn Output,
        mode: DeliveryMode,
        token: &'a CancellationToken,
    ) -> Self {
        Self {
            collection,
            embedder,
            generator,
            config,
            output,
            mode,
            token,
        }
    }

    /// Retrieve, assemble and deliver one answer. Turns share no state.
    pub fn ask(&self, question: &str) -> Result<Turn, RagError> {
        let retrieved = {
            let _working = status(self.output, "Creating prompt embeddings...");
            Retriever::new(self.collection, self.embedder).retrieve(question)?
        };

        let prompt = assemble(
            &self.config.system_prompt,
            &retrieved.text,
            question,
            self.config.max_context_chars,
        );
        let response = deliver(self.generator, &prompt, self.mode, self.output, self.token)?;

        Ok(Turn {
            prompt: question.to_string(),
            context: retrieved.text,
            response,
        })
    }

    /// Answer a single question supplied up front.
    pub fn one_shot(&self, prompt: &str) -> Result<Turn, RagError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(RagError::MissingPrompt);
        }
        self.output.print(&format!("Prompt received: {prompt}"));
        self.ask(prompt)
    }

    /// Read questions from `input` until `exit`, end of input, or cancellation.
    ///
    /// A failed turn is reported and the loop keeps going; only I/O errors on
    /// `input` end it with an error.
    pub fn interactive<R: BufRead>(&self, mut input: R) -> Result<SessionOutcome, RagError> {
        let mut line = String::new();

        loop {
            if self.token.is_cancelled() {
                return Ok(SessionOutcome::Cancelled);
            }

            self.output.print("");
            self.output.print_inline(&format!(
                "Ask a question to the {}:\n> ",
                self.config.assistant_name
            ));

            line.clear();
            if input.read_line(&mut line)? == 0 {
                self.output.print("");
                self.output.print("Exiting...");
                return Ok(SessionOutcome::EndOfInput);
            }
            if self.token.is_cancelled() {
                return Ok(SessionOutcome::Cancelled);
            }

            match parse_command(&line) {
                Command::Exit => {
                    self.output.print("Exiting...");
                    return Ok(SessionOutcome::Exited);
                }
                Command::Help => self.output.print(HELP_TEXT),
                Command::Ask(question) => match self.ask(&question) {
                    Ok(turn) => info!("Answered with {} characters", turn.response.len()),
                    Err(RagError::Cancelled) => return Ok(SessionOutcome::Cancelled),
                    Err(e) if e.is_collaborator_failure() => {
                        warn!("Turn failed: {e}");
                        self.output.error(&e.to_string());
                    }
                    Err(e) => return Err(e),
                },
            }
        }
    }
}
