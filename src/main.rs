//! symdex CLI entry point

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use symdex::{index_file, Cli, SqliteRecorder};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn run() -> symdex::Result<String> {
    let cli = Cli::parse();

    let working_directory = cli.working_directory.clone().unwrap_or_else(|| {
        cli.source_file_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let mut recorder = SqliteRecorder::open(&cli.database_file_path)?;
    if cli.clear {
        recorder.clear()?;
    }

    index_file(
        &cli.source_file_path,
        &working_directory,
        &mut recorder,
        cli.verbose,
    )?;

    let stats = recorder.stats()?;
    Ok(format!(
        "Indexed {} into {}: {} symbols, {} references, {} locations",
        cli.source_file_path.display(),
        cli.database_file_path.display(),
        stats.symbols,
        stats.edges,
        stats.locations
    ))
}
