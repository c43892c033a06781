//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::Parser;

/// Python symbol indexer writing a SQLite symbol database
#[derive(Parser, Debug)]
#[command(name = "symdex")]
#[command(about = "Index a Python source file into a SQLite symbol database")]
#[command(version)]
pub struct Cli {
    /// Python source file to index
    #[arg(long = "source-file-path")]
    pub source_file_path: PathBuf,

    /// SQLite database file to create or update
    #[arg(long = "database-file-path")]
    pub database_file_path: PathBuf,

    /// Root directory of the indexed project (defaults to the source file's
    /// parent directory)
    #[arg(long = "working-directory")]
    pub working_directory: Option<PathBuf>,

    /// Drop all previously recorded facts before indexing
    #[arg(long)]
    pub clear: bool,

    /// Print the traversed AST shape to stdout
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_arguments() {
        let cli = Cli::try_parse_from([
            "symdex",
            "--source-file-path",
            "a.py",
            "--database-file-path",
            "a.symdex",
        ])
        .expect("arguments parse");
        assert_eq!(cli.source_file_path, PathBuf::from("a.py"));
        assert!(!cli.clear);
        assert!(!cli.verbose);
    }

    #[test]
    fn rejects_missing_database_path() {
        let result = Cli::try_parse_from(["symdex", "--source-file-path", "a.py"]);
        assert!(result.is_err());
    }
}
