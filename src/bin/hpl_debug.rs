// ABOUTME: `hpl-debug` CLI: same pipeline as `hpl`, but renders the full §7 report on failure

use clap::Parser;
use hpl::config;
use hpl::debug::DebugReport;
use hpl::document;
use hpl::eval::Evaluator;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Runs a structured-document HPL script, printing a full debug report on
/// an uncaught error instead of just the message.
#[derive(Parser, Debug)]
#[command(name = "hpl-debug")]
#[command(version = config::VERSION)]
struct CliArgs {
    /// The document to run.
    #[arg(value_name = "FILE")]
    script: PathBuf,

    /// Install a DEBUG-level tracing subscriber before running.
    #[arg(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    if args.verbose || config::debug_enabled() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .init();
    }

    let search_path = config::module_search_path();

    let env = match document::load_document(&args.script, &search_path) {
        Ok(env) => env,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let evaluator = match Evaluator::new(env, search_path) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match evaluator.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let (call_stack, locals, globals) =
                evaluator.take_failure_snapshot().unwrap_or_default();
            let report = DebugReport::new(&e, call_stack, locals, globals);
            eprintln!("{report}");
            ExitCode::FAILURE
        }
    }
}
