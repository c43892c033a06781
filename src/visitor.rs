//! AST traversal engine.
//!
//! Walks a parsed module depth-first, maintains the lexical scope context
//! and drives every recording call. Dispatch is a closed enum over the node
//! kinds the engine reacts to; everything else recurses only.
//!
//! Failure semantics: a recording call returning the zero failure id is
//! logged and the walk continues. A node whose name cannot be resolved, or
//! whose resolved definition has no usable position, is skipped silently.
//! Nothing aborts a file's pass.

use tracing::warn;
use tree_sitter::Node;

use crate::location::ParseLocation;
use crate::name::{hierarchy_of_node, node_text};
use crate::record::{DefinitionKind, ReferenceKind, SymbolId, SymbolKind, SymbolRecorder};
use crate::resolve::Resolver;

/// Closed set of node kinds the engine dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Identifier,
    ClassDef,
    FuncDef,
    ExprStmt,
    Comment,
    SyntaxError,
    Other,
}

impl NodeKind {
    pub fn of(node: &Node) -> Self {
        match node.kind() {
            "identifier" => Self::Identifier,
            "class_definition" => Self::ClassDef,
            "function_definition" => Self::FuncDef,
            "expression_statement" => Self::ExprStmt,
            "comment" => Self::Comment,
            "ERROR" => Self::SyntaxError,
            _ => Self::Other,
        }
    }
}

/// Observer hook the engine reports every traversed node to.
///
/// Purely observational; implementations must not affect recorded facts.
pub trait TraceSink {
    fn node(&mut self, kind: &str, depth: usize);
}

/// Silent sink used by the plain engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuietTrace;

impl TraceSink for QuietTrace {
    fn node(&mut self, _kind: &str, _depth: usize) {}
}

/// Prints one line per node, indented proportionally to its depth.
#[derive(Debug, Default, Clone, Copy)]
pub struct AstTrace;

impl TraceSink for AstTrace {
    fn node(&mut self, kind: &str, depth: usize) {
        println!("AST: {}{}", "| ".repeat(depth), kind);
    }
}

/// Depth-first traversal engine over one parsed module.
///
/// Construction records the indexed file and seeds the scope context stack
/// with the file symbol id as its base entry; the stack therefore always
/// carries the current enclosing symbol, and references recorded outside
/// any class or function nesting attribute to the file itself. Each visitor
/// owns its stack; nothing is shared across traversals.
pub struct AstVisitor<'a, 't, R: SymbolRecorder, T: TraceSink = QuietTrace> {
    recorder: &'a mut R,
    resolver: &'a Resolver<'t>,
    source: &'a str,
    context_stack: Vec<SymbolId>,
    trace: T,
    depth: usize,
}

impl<'a, 't, R: SymbolRecorder> AstVisitor<'a, 't, R, QuietTrace> {
    pub fn new(
        recorder: &'a mut R,
        resolver: &'a Resolver<'t>,
        file_path: &str,
        source: &'a str,
    ) -> Self {
        Self::with_trace(recorder, resolver, file_path, source, QuietTrace)
    }
}

impl<'a, 't, R: SymbolRecorder, T: TraceSink> AstVisitor<'a, 't, R, T> {
    pub fn with_trace(
        recorder: &'a mut R,
        resolver: &'a Resolver<'t>,
        file_path: &str,
        source: &'a str,
        trace: T,
    ) -> Self {
        let file_id = recorder.record_file(&file_path.replace('\\', "/"));
        if file_id == 0 {
            warn!(path = file_path, "file could not be recorded; every fact of this pass will be dropped");
        }
        recorder.record_file_language(file_id, "python");
        Self {
            recorder,
            resolver,
            source,
            context_stack: vec![file_id],
            trace,
            depth: 0,
        }
    }

    /// Current nesting depth of the scope context stack. Exactly 1 before
    /// and after a full traversal of a well-formed tree.
    pub fn context_depth(&self) -> usize {
        self.context_stack.len()
    }

    /// Full pre-order/post-order pass: enter hook, children in source
    /// order, exit hook. Scope push/pop brackets exactly the nodes
    /// lexically contained in a definition.
    pub fn traverse(&mut self, node: Node<'t>) {
        self.trace.node(node.kind(), self.depth);
        let kind = NodeKind::of(&node);
        self.enter(kind, node);
        self.depth += 1;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.traverse(child);
        }
        self.depth -= 1;
        self.exit(kind);
    }

    fn enter(&mut self, kind: NodeKind, node: Node<'t>) {
        match kind {
            NodeKind::Identifier => self.enter_identifier(node),
            NodeKind::ClassDef => self.enter_definition(node, SymbolKind::Class),
            NodeKind::FuncDef => self.enter_definition(node, SymbolKind::Function),
            NodeKind::ExprStmt => self.enter_expression_statement(node),
            NodeKind::Comment => self
                .recorder
                .record_comment_location(ParseLocation::of_node(&node)),
            NodeKind::SyntaxError => {
                self.recorder
                    .record_error("syntax error", false, ParseLocation::of_node(&node))
            }
            NodeKind::Other => {}
        }
    }

    fn exit(&mut self, kind: NodeKind) {
        if matches!(kind, NodeKind::ClassDef | NodeKind::FuncDef) {
            self.context_stack.pop();
        }
    }

    /// Record a reference from the current context to the definition of a
    /// resolved name use. Definition sites record nothing here; their
    /// owning construct records them.
    fn enter_identifier(&mut self, node: Node<'t>) {
        let Some(name) = node_text(&node, self.source) else {
            return;
        };
        let candidates = self
            .resolver
            .resolve_definitions(name, node.start_position());
        // First candidate wins; ambiguity is not reported.
        let Some(definition) = candidates.first() else {
            return;
        };
        let Some(position) = definition.position else {
            // No usable definition site, commonly a builtin.
            return;
        };
        if position == node.start_position() {
            // The name is its own definition.
            return;
        }
        let Some(name_node) = definition.name_node else {
            return;
        };
        let Some(hierarchy) = hierarchy_of_node(name_node, self.source) else {
            return;
        };

        let referenced_id = self.recorder.record_symbol(&hierarchy);
        if referenced_id == 0 {
            warn!(symbol = %hierarchy.display_string(), "referenced symbol could not be recorded");
            return;
        }
        let context_id = self.context_stack.last().copied().unwrap_or(0);
        let reference_id =
            self.recorder
                .record_reference(context_id, referenced_id, ReferenceKind::Call);
        if reference_id == 0 {
            warn!(symbol = %hierarchy.display_string(), "reference could not be recorded");
            return;
        }
        self.recorder
            .record_reference_location(reference_id, ParseLocation::of_node(&node));
    }

    /// Shared enter hook for class and function definitions: record the
    /// symbol with its name and scope spans, then push it as the enclosing
    /// context for everything lexically inside.
    fn enter_definition(&mut self, node: Node<'t>, kind: SymbolKind) {
        let symbol_id = match hierarchy_of_node(node, self.source) {
            Some(hierarchy) => {
                let id = self.recorder.record_symbol(&hierarchy);
                if id == 0 {
                    warn!(symbol = %hierarchy.display_string(), "symbol could not be recorded");
                } else {
                    self.recorder
                        .record_symbol_definition_kind(id, DefinitionKind::Explicit);
                    self.recorder.record_symbol_kind(id, kind);
                    if let Some(name_node) = node.child_by_field_name("name") {
                        self.recorder
                            .record_symbol_location(id, ParseLocation::of_node(&name_node));
                    }
                    self.recorder
                        .record_symbol_scope_location(id, ParseLocation::of_node(&node));
                }
                id
            }
            // Anonymous definition: nothing recordable, but the scope must
            // still bracket its body.
            None => 0,
        };
        self.context_stack.push(symbol_id);
    }

    /// Assignments lexically inside a class body define fields. Elsewhere
    /// the statement has no recording effect.
    fn enter_expression_statement(&mut self, node: Node<'t>) {
        if parent_of_kind(node, "class_definition").is_none() {
            return;
        }
        for name_node in assigned_names(node) {
            let Some(hierarchy) = hierarchy_of_node(name_node, self.source) else {
                continue;
            };
            let id = self.recorder.record_symbol(&hierarchy);
            if id == 0 {
                warn!(symbol = %hierarchy.display_string(), "field symbol could not be recorded");
                continue;
            }
            self.recorder
                .record_symbol_definition_kind(id, DefinitionKind::Explicit);
            self.recorder.record_symbol_kind(id, SymbolKind::Field);
            self.recorder
                .record_symbol_location(id, ParseLocation::of_node(&name_node));
        }
    }
}

/// Nearest ancestor of `kind`, walking parent links.
fn parent_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut parent = node.parent();
    while let Some(ancestor) = parent {
        if ancestor.kind() == kind {
            return Some(ancestor);
        }
        parent = ancestor.parent();
    }
    None
}

/// Names defined by an assignment-bearing expression statement, in source
/// order. Handles plain, chained, augmented and unpacking targets.
fn assigned_names<'t>(statement: Node<'t>) -> Vec<Node<'t>> {
    let mut names = Vec::new();
    let mut cursor = statement.walk();
    for child in statement.children(&mut cursor) {
        collect_assignments(child, &mut names);
    }
    names
}

fn collect_assignments<'t>(node: Node<'t>, names: &mut Vec<Node<'t>>) {
    if matches!(node.kind(), "assignment" | "augmented_assignment") {
        if let Some(left) = node.child_by_field_name("left") {
            collect_target_identifiers(left, names);
        }
        // Chained assignments nest in the right-hand side.
        if let Some(right) = node.child_by_field_name("right") {
            collect_assignments(right, names);
        }
    }
}

fn collect_target_identifiers<'t>(node: Node<'t>, names: &mut Vec<Node<'t>>) {
    match node.kind() {
        "identifier" => names.push(node),
        "pattern_list" | "tuple_pattern" | "list_pattern" => {
            let mut cursor = node.walk();
            let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
            for child in children {
                collect_target_identifiers(child, names);
            }
        }
        // Attribute and subscript targets are uses, not field definitions.
        _ => {}
    }
}
