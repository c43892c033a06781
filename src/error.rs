//! Error types and exit codes for symdex

use std::process::ExitCode;
use thiserror::Error;

/// Main error type for symdex operations
#[derive(Error, Debug)]
pub enum SymdexError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse file: {message}")]
    ParseFailure { message: String },

    #[error("Symbol database error: {message}")]
    DatabaseError { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SymdexError {
    /// Convert error to appropriate exit code:
    /// - 0: Success
    /// - 1: File not found / IO error
    /// - 3: Parse failure
    /// - 4: Symbol database failure
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::FileNotFound { .. } => ExitCode::from(1),
            Self::ParseFailure { .. } => ExitCode::from(3),
            Self::DatabaseError { .. } => ExitCode::from(4),
            Self::Io(_) => ExitCode::from(1),
        }
    }
}

/// Result type alias for symdex operations
pub type Result<T> = std::result::Result<T, SymdexError>;
