//! Lexical definition resolver.
//!
//! Answers "where is the name at this position defined" for one parsed
//! module. Construction makes a single pass over the tree building a scope
//! tree (module, class and function scopes with their binding sites); a
//! lookup walks from the innermost scope containing the query position
//! outward and returns every matching binding, innermost first. Class
//! scopes are visible only to their direct body, mirroring Python's rule
//! that a method body cannot see class attributes unqualified.
//!
//! Names that resolve to no source binding but are Python builtins yield a
//! candidate without a position; callers that need a definition site skip
//! those.

use std::path::{Path, PathBuf};

use tree_sitter::{Node, Point};

use crate::name::node_text;

/// Builtins resolved without a source definition site.
const BUILTINS: &[&str] = &[
    "abs", "bool", "dict", "enumerate", "filter", "float", "getattr", "hasattr", "int",
    "isinstance", "iter", "len", "list", "map", "max", "min", "next", "object", "open", "print",
    "range", "repr", "reversed", "set", "setattr", "sorted", "str", "sum", "super", "tuple",
    "type", "zip", "Exception", "TypeError", "ValueError",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Module,
    Class,
    Function,
}

/// The defining occurrence of a name inside one scope.
#[derive(Debug)]
struct Binding<'t> {
    name: String,
    node: Node<'t>,
}

#[derive(Debug)]
struct Scope<'t> {
    parent: Option<usize>,
    kind: ScopeKind,
    start: Point,
    end: Point,
    bindings: Vec<Binding<'t>>,
}

impl Scope<'_> {
    fn contains(&self, position: Point) -> bool {
        let pos = (position.row, position.column);
        (self.start.row, self.start.column) <= pos && pos < (self.end.row, self.end.column)
    }
}

/// One definition candidate for a name use.
///
/// `position` and `name_node` are both absent for names resolved without a
/// tree definition (builtins).
#[derive(Debug, Clone, Copy)]
pub struct Definition<'t> {
    pub position: Option<Point>,
    pub name_node: Option<Node<'t>>,
}

/// Scope-based resolver over a single parsed module.
///
/// Built fresh per indexing pass; nothing is cached across parses.
pub struct Resolver<'t> {
    scopes: Vec<Scope<'t>>,
    working_directory: PathBuf,
}

impl<'t> Resolver<'t> {
    /// Build the scope tree for the module rooted at `root`.
    pub fn new(root: Node<'t>, source: &str, working_directory: &Path) -> Self {
        let mut resolver = Self {
            scopes: Vec::new(),
            working_directory: working_directory.to_path_buf(),
        };
        resolver.scopes.push(Scope {
            parent: None,
            kind: ScopeKind::Module,
            start: root.start_position(),
            end: root.end_position(),
            bindings: Vec::new(),
        });
        resolver.collect(root, 0, source);
        resolver
    }

    /// Root of the resolution session.
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Definition candidates for the name `name` used at `position`,
    /// innermost scope first, declaration order within a scope. Callers
    /// that follow the engine's policy take the first candidate only.
    pub fn resolve_definitions(&self, name: &str, position: Point) -> Vec<Definition<'t>> {
        let mut candidates = Vec::new();
        let start = self.innermost_scope(position);
        let mut current = Some(start);
        while let Some(idx) = current {
            let scope = &self.scopes[idx];
            // Class scopes are transparent only to their direct body.
            if scope.kind != ScopeKind::Class || idx == start {
                for binding in scope.bindings.iter().filter(|b| b.name == name) {
                    candidates.push(Definition {
                        position: Some(binding.node.start_position()),
                        name_node: Some(binding.node),
                    });
                }
            }
            current = scope.parent;
        }
        if candidates.is_empty() && BUILTINS.contains(&name) {
            candidates.push(Definition {
                position: None,
                name_node: None,
            });
        }
        candidates
    }

    fn innermost_scope(&self, position: Point) -> usize {
        // Scopes are appended in pre-order, so the last scope containing
        // the position is the innermost one.
        let mut innermost = 0;
        for (idx, scope) in self.scopes.iter().enumerate() {
            if scope.contains(position) {
                innermost = idx;
            }
        }
        innermost
    }

    fn push_scope(&mut self, parent: usize, kind: ScopeKind, node: Node<'t>) -> usize {
        self.scopes.push(Scope {
            parent: Some(parent),
            kind,
            start: node.start_position(),
            end: node.end_position(),
            bindings: Vec::new(),
        });
        self.scopes.len() - 1
    }

    fn bind(&mut self, scope: usize, node: Node<'t>, source: &str) {
        if let Some(name) = node_text(&node, source) {
            self.scopes[scope].bindings.push(Binding {
                name: name.to_string(),
                node,
            });
        }
    }

    fn collect(&mut self, node: Node<'t>, scope: usize, source: &str) {
        match node.kind() {
            "class_definition" | "function_definition" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.bind(scope, name, source);
                }
                let kind = if node.kind() == "class_definition" {
                    ScopeKind::Class
                } else {
                    ScopeKind::Function
                };
                let inner = self.push_scope(scope, kind, node);
                self.collect_children(node, inner, source);
            }
            "lambda" => {
                let inner = self.push_scope(scope, ScopeKind::Function, node);
                self.collect_children(node, inner, source);
            }
            "parameters" | "lambda_parameters" => {
                self.bind_parameters(node, scope, source);
            }
            "assignment" | "augmented_assignment" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.bind_targets(left, scope, source);
                }
                // Chained assignments nest in the right-hand side.
                if let Some(right) = node.child_by_field_name("right") {
                    self.collect(right, scope, source);
                }
            }
            "for_statement" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.bind_targets(left, scope, source);
                }
                self.collect_children(node, scope, source);
            }
            "as_pattern" => {
                if let Some(alias) = node.child_by_field_name("alias") {
                    self.bind_targets(alias, scope, source);
                }
                self.collect_children(node, scope, source);
            }
            "import_statement" => self.bind_import(node, scope, source),
            "import_from_statement" => self.bind_import_from(node, scope, source),
            _ => self.collect_children(node, scope, source),
        }
    }

    fn collect_children(&mut self, node: Node<'t>, scope: usize, source: &str) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect(child, scope, source);
        }
    }

    fn bind_parameters(&mut self, parameters: Node<'t>, scope: usize, source: &str) {
        let mut cursor = parameters.walk();
        for parameter in parameters.named_children(&mut cursor) {
            let name = match parameter.kind() {
                "identifier" => Some(parameter),
                "default_parameter" | "typed_default_parameter" => {
                    parameter.child_by_field_name("name")
                }
                "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                    parameter.named_child(0)
                }
                _ => None,
            };
            if let Some(name) = name.filter(|n| n.kind() == "identifier") {
                self.bind(scope, name, source);
            }
        }
    }

    /// Bind every identifier in an assignment or loop target, descending
    /// through unpacking patterns. Attribute and subscript targets are
    /// uses, not bindings.
    fn bind_targets(&mut self, target: Node<'t>, scope: usize, source: &str) {
        match target.kind() {
            "identifier" => self.bind(scope, target, source),
            "pattern_list" | "tuple_pattern" | "list_pattern" | "as_pattern_target" => {
                let mut cursor = target.walk();
                let children: Vec<Node<'t>> = target.children(&mut cursor).collect();
                for child in children {
                    self.bind_targets(child, scope, source);
                }
            }
            _ => {}
        }
    }

    fn bind_import(&mut self, import: Node<'t>, scope: usize, source: &str) {
        let mut cursor = import.walk();
        for child in import.named_children(&mut cursor) {
            match child.kind() {
                // `import a.b` binds `a`.
                "dotted_name" => {
                    if let Some(first) = child.named_child(0) {
                        self.bind(scope, first, source);
                    }
                }
                // `import a.b as c` binds `c`.
                "aliased_import" => {
                    if let Some(alias) = child.child_by_field_name("alias") {
                        self.bind(scope, alias, source);
                    }
                }
                _ => {}
            }
        }
    }

    fn bind_import_from(&mut self, import: Node<'t>, scope: usize, source: &str) {
        let module = import.child_by_field_name("module_name");
        let mut cursor = import.walk();
        for child in import.named_children(&mut cursor) {
            if module.is_some_and(|m| m.id() == child.id()) {
                continue;
            }
            match child.kind() {
                "dotted_name" => {
                    if let Some(first) = child.named_child(0) {
                        self.bind(scope, first, source);
                    }
                }
                "aliased_import" => {
                    if let Some(alias) = child.child_by_field_name("alias") {
                        self.bind(scope, alias, source);
                    }
                }
                _ => {}
            }
        }
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

    fn resolver<'t>(tree: &'t tree_sitter::Tree, source: &str) -> Resolver<'t> {
        Resolver::new(tree.root_node(), source, Path::new("."))
    }

    /// Point of the first occurrence of `needle` at or after `(row, col)`.
    fn point_of(source: &str, needle: &str, occurrence: usize) -> Point {
        let mut seen = 0;
        for (row, line) in source.lines().enumerate() {
            let mut from = 0;
            while let Some(col) = line[from..].find(needle) {
                if seen == occurrence {
                    return Point {
                        row,
                        column: from + col,
                    };
                }
                seen += 1;
                from += col + needle.len();
            }
        }
        panic!("needle {needle:?} occurrence {occurrence} not found");
    }

    #[test]
    fn module_binding_is_visible_from_function_body() {
        let source = "limit = 10\ndef f():\n    return limit\n";
        let tree = parse(source);
        let resolver = resolver(&tree, source);

        let uses = resolver.resolve_definitions("limit", point_of(source, "limit", 1));
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].position, Some(point_of(source, "limit", 0)));
    }

    #[test]
    fn class_scope_is_skipped_from_method_bodies() {
        let source = "class A:\n    x = 1\n    def m(self):\n        return x\n";
        let tree = parse(source);
        let resolver = resolver(&tree, source);

        let uses = resolver.resolve_definitions("x", point_of(source, "return x", 0));
        assert!(uses.is_empty());
    }

    #[test]
    fn class_scope_is_visible_to_its_direct_body() {
        let source = "class A:\n    x = 1\n    y = x\n";
        let tree = parse(source);
        let resolver = resolver(&tree, source);

        let uses = resolver.resolve_definitions("x", point_of(source, "x", 1));
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].position, Some(point_of(source, "x", 0)));
    }

    #[test]
    fn parameters_bind_in_the_function_scope() {
        let source = "def f(a, b=1, *args, **kwargs):\n    return a\n";
        let tree = parse(source);
        let resolver = resolver(&tree, source);

        for name in ["a", "b", "args", "kwargs"] {
            let uses = resolver.resolve_definitions(name, point_of(source, "return a", 0));
            assert_eq!(uses.len(), 1, "{name} should bind");
        }
    }

    #[test]
    fn innermost_shadowing_binding_comes_first() {
        let source = "x = 1\ndef f():\n    x = 2\n    return x\n";
        let tree = parse(source);
        let resolver = resolver(&tree, source);

        let uses = resolver.resolve_definitions("x", point_of(source, "return x", 0));
        assert_eq!(uses.len(), 2);
        assert_eq!(uses[0].position, Some(point_of(source, "x = 2", 0)));
    }

    #[test]
    fn builtins_resolve_without_a_position() {
        let source = "print(1)\n";
        let tree = parse(source);
        let resolver = resolver(&tree, source);

        let uses = resolver.resolve_definitions("print", point_of(source, "print", 0));
        assert_eq!(uses.len(), 1);
        assert!(uses[0].position.is_none());
        assert!(uses[0].name_node.is_none());
    }

    #[test]
    fn imports_bind_names_and_aliases() {
        let source = "import os.path\nimport json as j\nfrom sys import argv\n";
        let tree = parse(source);
        let resolver = resolver(&tree, source);
        let at_end = Point { row: 3, column: 0 };

        assert_eq!(resolver.resolve_definitions("os", at_end).len(), 1);
        assert_eq!(resolver.resolve_definitions("j", at_end).len(), 1);
        assert_eq!(resolver.resolve_definitions("argv", at_end).len(), 1);
        assert!(resolver.resolve_definitions("json", at_end).is_empty());
    }
}
