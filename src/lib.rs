//! symdex: Python symbol indexer with a SQLite symbol database
//!
//! This library extracts symbol definitions and cross-references from
//! Python source code and records them into a structured symbol database
//! for later navigation (go-to-definition, call graphs, symbol search).
//! Parsing uses tree-sitter; name resolution is a lexical scope-tree
//! lookup; recording goes through the [`SymbolRecorder`] façade, backed
//! either by a SQLite file or by an in-memory fact log.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use symdex::{index_source, MemoryRecorder};
//!
//! let source = "class A:\n    x = 1\n";
//! let mut recorder = MemoryRecorder::new();
//! index_source(source, Path::new("."), &mut recorder, false)?;
//!
//! assert!(recorder.symbol_id("A").is_some());
//! assert!(recorder.symbol_id("A.x").is_some());
//! ```

pub mod cli;
pub mod database;
pub mod error;
pub mod index;
pub mod location;
pub mod name;
pub mod record;
pub mod resolve;
pub mod visitor;

// Re-export commonly used types
pub use cli::Cli;
pub use database::{DatabaseStats, SqliteRecorder, SUPPORTED_DATABASE_VERSION};
pub use error::{Result, SymdexError};
pub use index::{index_file, index_source, VIRTUAL_FILE_PATH};
pub use location::ParseLocation;
pub use name::{hierarchy_of_node, NameElement, NameHierarchy, PYTHON_DELIMITER};
pub use record::{
    DefinitionKind, Fact, FileId, LocalSymbolId, MemoryRecorder, ReferenceId, ReferenceKind,
    SymbolId, SymbolKind, SymbolRecorder,
};
pub use resolve::{Definition, Resolver};
pub use visitor::{AstTrace, AstVisitor, NodeKind, QuietTrace, TraceSink};
