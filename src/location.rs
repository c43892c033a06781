//! Source span model shared by every recorded fact.

use std::fmt;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

/// An inclusive source span, 1-indexed lines and columns.
///
/// tree-sitter reports 0-based rows and byte columns with an exclusive end
/// column. The database convention is 1-based inclusive on both ends, so the
/// start row, start column and end row shift by +1 while the exclusive end
/// column already equals the 1-based inclusive value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseLocation {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl ParseLocation {
    /// Create a location from already-converted database coordinates.
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Span of a tree-sitter node in database coordinates.
    pub fn of_node(node: &Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_line: start.row as u32 + 1,
            start_column: start.column as u32 + 1,
            end_line: end.row as u32 + 1,
            end_column: end.column as u32,
        }
    }
}

impl fmt::Display for ParseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}|{}:{}]",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> tree_sitter::Tree {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .expect("python grammar loads");
        parser.parse(source, None).expect("source parses")
    }

    #[test]
    fn converts_node_span_to_database_coordinates() {
        // `x` occupies row 0, columns 4..5 in tree-sitter terms.
        let tree = parse("    x = 1\n");
        let root = tree.root_node();
        let identifier = root
            .descendant_for_point_range(
                tree_sitter::Point { row: 0, column: 4 },
                tree_sitter::Point { row: 0, column: 5 },
            )
            .expect("identifier exists");
        assert_eq!(identifier.kind(), "identifier");

        let location = ParseLocation::of_node(&identifier);
        assert_eq!(location, ParseLocation::new(1, 5, 1, 5));
    }

    #[test]
    fn display_matches_bracket_format() {
        let location = ParseLocation::new(2, 1, 4, 10);
        assert_eq!(location.to_string(), "[2:1|4:10]");
    }
}
