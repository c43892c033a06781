//! Indexing entry points.
//!
//! Each call sets up a fresh parse, a fresh resolver and a fresh visitor,
//! then runs one full traversal against the supplied recorder. Nothing
//! survives between calls, so indexing the same source twice produces
//! identical fact streams.

use std::fs;
use std::path::Path;

use tree_sitter::Parser;

use crate::error::{Result, SymdexError};
use crate::record::SymbolRecorder;
use crate::resolve::Resolver;
use crate::visitor::{AstTrace, AstVisitor};

/// Path recorded for in-memory sources.
pub const VIRTUAL_FILE_PATH: &str = "virtual_file.py";

/// Index in-memory Python source.
///
/// The source is recorded under [`VIRTUAL_FILE_PATH`]; every resolution
/// query runs against the supplied text, never the disk.
pub fn index_source<R: SymbolRecorder>(
    source: &str,
    working_directory: &Path,
    recorder: &mut R,
    verbose: bool,
) -> Result<()> {
    index(source, VIRTUAL_FILE_PATH, working_directory, recorder, verbose)
}

/// Index a Python source file read from disk.
pub fn index_file<R: SymbolRecorder>(
    path: &Path,
    working_directory: &Path,
    recorder: &mut R,
    verbose: bool,
) -> Result<()> {
    if !path.exists() {
        return Err(SymdexError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let source = fs::read_to_string(path)?;
    let file_path = path.display().to_string();
    index(&source, &file_path, working_directory, recorder, verbose)
}

fn index<R: SymbolRecorder>(
    source: &str,
    file_path: &str,
    working_directory: &Path,
    recorder: &mut R,
    verbose: bool,
) -> Result<()> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| SymdexError::ParseFailure {
            message: format!("Failed to set Python grammar for {}: {:?}", file_path, e),
        })?;

    // Cold parse on every call: the resolver must reflect exactly this text.
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| SymdexError::ParseFailure {
            message: format!("Failed to parse file: {}", file_path),
        })?;

    let resolver = Resolver::new(tree.root_node(), source, working_directory);
    if verbose {
        let mut visitor = AstVisitor::with_trace(recorder, &resolver, file_path, source, AstTrace);
        visitor.traverse(tree.root_node());
    } else {
        let mut visitor = AstVisitor::new(recorder, &resolver, file_path, source);
        visitor.traverse(tree.root_node());
    }
    Ok(())
}
