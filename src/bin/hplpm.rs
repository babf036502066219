// ABOUTME: `hplpm` CLI: a thin wrapper over the `HPL_MODULE_PATHS` package directory

use clap::{Parser, Subcommand};
use hpl::config;
use std::path::PathBuf;
use std::process::ExitCode;

/// Manages script-file modules (`.hpl` packages) in the default package
/// directory (`<home>/.hpl/packages`, or the first `HPL_MODULE_PATHS`
/// entry).
#[derive(Parser, Debug)]
#[command(name = "hplpm")]
#[command(version = config::VERSION)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copies a `.hpl` file into the package directory.
    Add { path: PathBuf },
    /// Removes a module by name from the package directory.
    Remove { name: String },
    /// Lists installed modules.
    List,
}

fn package_dir() -> Result<PathBuf, String> {
    config::module_search_path()
        .into_iter()
        .next()
        .ok_or_else(|| "no package directory configured (set HPL_MODULE_PATHS or HOME)".to_string())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let result = match args.command {
        Command::Add { path } => add(&path),
        Command::Remove { name } => remove(&name),
        Command::List => list(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("hplpm: {e}");
            ExitCode::FAILURE
        }
    }
}

fn add(path: &std::path::Path) -> Result<(), String> {
    let dir = package_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("{} has no file name", path.display()))?;
    std::fs::copy(path, dir.join(file_name)).map_err(|e| e.to_string())?;
    Ok(())
}

fn remove(name: &str) -> Result<(), String> {
    let dir = package_dir()?;
    let file_name = if name.ends_with(".hpl") {
        name.to_string()
    } else {
        format!("{name}.hpl")
    };
    std::fs::remove_file(dir.join(file_name)).map_err(|e| e.to_string())?;
    Ok(())
}

fn list() -> Result<(), String> {
    let dir = package_dir()?;
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("(no packages installed)");
            return Ok(());
        }
        Err(e) => return Err(e.to_string()),
    };
    for entry in entries.flatten() {
        if entry.path().extension().and_then(|e| e.to_str()) == Some("hpl") {
            println!("{}", entry.path().file_stem().unwrap_or_default().to_string_lossy());
        }
    }
    Ok(())
}
