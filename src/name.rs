//! Qualified symbol names and the hierarchy builder.
//!
//! A [`NameHierarchy`] is the canonical key for a symbol in the database: an
//! ordered list of name elements, outermost scope first, joined by a
//! delimiter. The serialized JSON form (`name_delimiter` / `name_elements`)
//! is the on-disk contract shared with any tool that reads the database.

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

/// Delimiter separating Python scope levels in a qualified name.
pub const PYTHON_DELIMITER: &str = ".";

/// One segment of a qualified name.
///
/// Prefix and postfix decorate a segment without changing the base
/// identifier used for equality and lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NameElement {
    pub name: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub postfix: String,
}

impl NameElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: String::new(),
            postfix: String::new(),
        }
    }
}

/// Ordered, delimited path of name elements identifying one symbol.
///
/// Two hierarchies denote the same symbol iff their delimiter and full
/// element sequence are equal; that is exactly derived `PartialEq`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameHierarchy {
    #[serde(rename = "name_delimiter")]
    pub delimiter: String,
    #[serde(rename = "name_elements")]
    pub elements: Vec<NameElement>,
}

impl NameHierarchy {
    /// Create a one-element hierarchy.
    pub fn new(element: NameElement, delimiter: &str) -> Self {
        Self {
            delimiter: delimiter.to_string(),
            elements: vec![element],
        }
    }

    /// Serialized database key.
    ///
    /// A hierarchy with zero elements is a construction-time intermediate
    /// only; callers never serialize one.
    pub fn serialize(&self) -> String {
        // Plain owned data; JSON encoding cannot fail here.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse a serialized key back into a hierarchy.
    pub fn deserialize(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// Human-readable form, e.g. `A.run` for a method `run` on class `A`.
    pub fn display_string(&self) -> String {
        let mut out = String::new();
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                out.push_str(&self.delimiter);
            }
            if !element.prefix.is_empty() {
                out.push_str(&element.prefix);
                out.push(' ');
            }
            out.push_str(&element.name);
            if !element.postfix.is_empty() {
                out.push_str(&element.postfix);
            }
        }
        out
    }
}

/// Derive the qualified name for a definition site.
///
/// Accepts either an `identifier` leaf (the defining occurrence of a name)
/// or a `class_definition` / `function_definition` node, whose `name` field
/// supplies the leaf. Returns `None` for anonymous or non-nameable nodes;
/// callers skip recording for those.
///
/// The climb over parent links appends the current element to the first
/// enclosing ancestor that yields a hierarchy of its own, which produces
/// outermost-first element order. A node with no enclosing named scope gets
/// a fresh single-element hierarchy at module scope.
pub fn hierarchy_of_node(node: Node, source: &str) -> Option<NameHierarchy> {
    let name_node = if node.kind() == "identifier" {
        node
    } else {
        definition_name(node)?
    };
    let element = NameElement::new(node_text(&name_node, source)?);

    // A name leaf's parent is its own defining construct; start the climb
    // one level further out so the leaf is not treated as its own ancestor.
    let mut parent = node.parent();
    if node.kind() == "identifier" {
        parent = parent.and_then(|p| p.parent());
    }
    while let Some(ancestor) = parent {
        if let Some(mut enclosing) = hierarchy_of_node(ancestor, source) {
            enclosing.elements.push(element);
            return Some(enclosing);
        }
        parent = ancestor.parent();
    }
    Some(NameHierarchy::new(element, PYTHON_DELIMITER))
}

/// The `name` child of a class or function definition. Only definition
/// nodes contribute scope levels; every other node kind climbs through.
fn definition_name(node: Node) -> Option<Node> {
    match node.kind() {
        "class_definition" | "function_definition" => node.child_by_field_name("name"),
        _ => None,
    }
}

/// UTF-8 text of a node's span.
pub(crate) fn node_text<'s>(node: &Node, source: &'s str) -> Option<&'s str> {
    node.utf8_text(source.as_bytes()).ok()
}
