use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use docs_assistant::RagError;
use docs_assistant::app::{Completion, report_failure, run_with_ollama, supervise};
use docs_assistant::cli::Cli;
use docs_assistant::config::Config;
use docs_assistant::console::{Console, Output};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let console = Arc::new(Console::new());

    // 1. Load config
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return fail(console.as_ref(), &RagError::from(e)),
    };
    if let Err(e) = config.validate() {
        return fail(console.as_ref(), &RagError::from(e));
    }

    // 2. Resolve run options
    let options = match cli.run_options(&config) {
        Ok(options) => options,
        Err(e) => return fail(console.as_ref(), &e),
    };

    // 3. Run the pipeline off the async runtime
    let token = CancellationToken::new();
    let worker = {
        let console = Arc::clone(&console);
        let token = token.clone();
        tokio::task::spawn_blocking(move || {
            run_with_ollama(&config, &options, console.as_ref(), &token)
        })
    };

    // 4. Race it against Ctrl-C
    match supervise(worker, tokio::signal::ctrl_c(), &token, console.as_ref()).await {
        Completion::Success => ExitCode::SUCCESS,
        Completion::Failure => ExitCode::FAILURE,
        // stdin reads cannot be interrupted, so leave without joining the worker.
        Completion::Interrupted => std::process::exit(0),
    }
}

fn fail(console: &dyn Output, error: &RagError) -> ExitCode {
    report_failure(console, error);
    ExitCode::FAILURE
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,docs_assistant={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
