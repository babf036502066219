// ABOUTME: `hpl` CLI: load a document, run its entry point, exit 1 on an uncaught error

use clap::Parser;
use hpl::config;
use hpl::document;
use hpl::eval::Evaluator;
use std::path::PathBuf;
use std::process::ExitCode;

/// Runs a structured-document HPL script.
#[derive(Parser, Debug)]
#[command(name = "hpl")]
#[command(version = config::VERSION)]
#[command(about = config::WELCOME_MESSAGE)]
struct CliArgs {
    /// The document to run.
    #[arg(value_name = "FILE")]
    script: PathBuf,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
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
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
