//! Integration tests for symdex
//!
//! These tests drive the public indexing entry points end to end and
//! inspect the resulting fact stream (or SQLite database) instead of any
//! internal state. Fixtures are written with tempfile where a real file or
//! database is needed.

use std::fs;
use std::path::Path;

use symdex::{
    index_file, index_source, AstVisitor, Fact, MemoryRecorder, ParseLocation, ReferenceKind,
    Resolver, SqliteRecorder, SymbolKind, SymdexError,
};

fn indexed(source: &str) -> MemoryRecorder {
    let mut recorder = MemoryRecorder::new();
    index_source(source, Path::new("."), &mut recorder, false).expect("indexing succeeds");
    recorder
}

fn symbol_kinds(recorder: &MemoryRecorder, kind: SymbolKind) -> Vec<i64> {
    recorder
        .facts
        .iter()
        .filter_map(|fact| match fact {
            Fact::SymbolKind { id, kind: k } if *k == kind => Some(*id),
            _ => None,
        })
        .collect()
}

#[test]
fn class_with_field_records_class_and_field_symbols() {
    let source = "class A:\n    x = 1\n";
    let recorder = indexed(source);

    let class_id = recorder.symbol_id("A").expect("class symbol recorded");
    let field_id = recorder.symbol_id("A.x").expect("field symbol recorded");

    assert_eq!(symbol_kinds(&recorder, SymbolKind::Class), vec![class_id]);
    assert_eq!(symbol_kinds(&recorder, SymbolKind::Field), vec![field_id]);

    // The class scope spans the whole definition, the field location just
    // the `x` token.
    assert!(recorder.facts.contains(&Fact::SymbolScopeLocation {
        id: class_id,
        file_id: 1,
        location: ParseLocation::new(1, 1, 2, 9),
    }));
    assert!(recorder.facts.contains(&Fact::SymbolLocation {
        id: class_id,
        file_id: 1,
        location: ParseLocation::new(1, 7, 1, 7),
    }));
    assert!(recorder.facts.contains(&Fact::SymbolLocation {
        id: field_id,
        file_id: 1,
        location: ParseLocation::new(2, 5, 2, 5),
    }));

    // No reference is recorded for definition-site names.
    assert!(recorder.references().is_empty());
}

#[test]
fn recursive_call_attributes_reference_to_the_function_itself() {
    let source = "def f():\n    return f()\n";
    let recorder = indexed(source);

    let f_id = recorder.symbol_id("f").expect("function symbol recorded");
    assert_eq!(recorder.references(), vec![(f_id, f_id, ReferenceKind::Call)]);

    // The reference location is the span of the used name, not the call.
    let reference_id = recorder
        .facts
        .iter()
        .find_map(|fact| match fact {
            Fact::Reference { id, .. } => Some(*id),
            _ => None,
        })
        .expect("reference recorded");
    assert!(recorder.facts.contains(&Fact::ReferenceLocation {
        id: reference_id,
        file_id: 1,
        location: ParseLocation::new(2, 12, 2, 12),
    }));
}

#[test]
fn module_level_use_attributes_reference_to_the_file() {
    let source = "class A:\n    pass\na = A()\n";
    let recorder = indexed(source);

    let class_id = recorder.symbol_id("A").expect("class symbol recorded");
    // The base context entry is the file symbol, id 1 here.
    assert_eq!(
        recorder.references(),
        vec![(1, class_id, ReferenceKind::Call)]
    );
}

#[test]
fn definition_site_names_record_no_references() {
    let recorder = indexed("def f(a, b):\n    pass\n");
    assert!(recorder.references().is_empty());
}

#[test]
fn builtin_without_definition_position_records_nothing() {
    let recorder = indexed("print(1)\n");
    assert!(recorder.references().is_empty());
    assert!(recorder.symbol_id("print").is_none());
}

#[test]
fn repeated_uses_dedup_to_one_symbol_id() {
    let source = "class A:\n    pass\na = A()\nb = A()\n";
    let recorder = indexed(source);

    let ids: Vec<i64> = recorder
        .facts
        .iter()
        .filter_map(|fact| match fact {
            Fact::Symbol { id, key } if key.contains("\"A\"") => Some(*id),
            _ => None,
        })
        .collect();
    // Recorded once at the definition and once per use, all the same id.
    assert_eq!(ids.len(), 3);
    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn indexing_twice_produces_identical_fact_streams() {
    let source = "import os\n\nclass A:\n    x = 1\n    def m(self):\n        return A()\n\ndef f():\n    return f()\n";
    let first = indexed(source);
    let second = indexed(source);
    assert_eq!(first.facts, second.facts);
    assert!(!first.facts.is_empty());
}

#[test]
fn verbose_decorator_has_no_semantic_effect() {
    let source = "class A:\n    def m(self):\n        return m\n";
    let mut quiet = MemoryRecorder::new();
    index_source(source, Path::new("."), &mut quiet, false).expect("indexing succeeds");
    let mut verbose = MemoryRecorder::new();
    index_source(source, Path::new("."), &mut verbose, true).expect("indexing succeeds");

    assert_eq!(quiet.facts, verbose.facts);
}

#[test]
fn scope_context_stack_returns_to_the_file_base_entry() {
    let source = "class A:\n    def m(self):\n        def g():\n            pass\n        return g\n";
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .expect("python grammar loads");
    let tree = parser.parse(source, None).expect("source parses");

    let resolver = Resolver::new(tree.root_node(), source, Path::new("."));
    let mut recorder = MemoryRecorder::new();
    let mut visitor = AstVisitor::new(&mut recorder, &resolver, "nested.py", source);
    assert_eq!(visitor.context_depth(), 1);
    visitor.traverse(tree.root_node());
    assert_eq!(visitor.context_depth(), 1);
}

#[test]
fn comments_record_comment_locations() {
    let recorder = indexed("# a comment\nx = 1\n");
    let comments: Vec<&Fact> = recorder
        .facts
        .iter()
        .filter(|fact| matches!(fact, Fact::CommentLocation { .. }))
        .collect();
    assert_eq!(comments.len(), 1);
}

#[test]
fn sqlite_database_round_trips_recorded_facts() {
    let dir = tempfile::tempdir().expect("tempdir creates");
    let db_path = dir.path().join("project.symdex");
    let source = "class A:\n    pass\na = A()\n";

    {
        let mut recorder = SqliteRecorder::open(&db_path).expect("database opens");
        index_source(source, dir.path(), &mut recorder, false).expect("indexing succeeds");
        let stats = recorder.stats().expect("stats query runs");
        assert_eq!(stats.files, 1);
        assert_eq!(stats.symbols, 1); // A, deduped across definition and use
        assert_eq!(stats.edges, 1);
        assert!(stats.locations > 0);
    }

    // Reopening finds a compatible database with the same facts.
    let recorder = SqliteRecorder::open(&db_path).expect("database reopens");
    assert!(recorder.is_compatible());
    assert_eq!(recorder.stats().expect("stats query runs").symbols, 1);
}

#[test]
fn index_file_reads_source_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir creates");
    let file_path = dir.path().join("mod.py");
    fs::write(&file_path, "def f():\n    return f()\n").expect("fixture writes");

    let mut recorder = MemoryRecorder::new();
    index_file(&file_path, dir.path(), &mut recorder, false).expect("indexing succeeds");

    let recorded_path = recorder.facts.iter().find_map(|fact| match fact {
        Fact::File { path, .. } => Some(path.clone()),
        _ => None,
    });
    assert!(recorded_path.is_some_and(|p| p.ends_with("mod.py") && !p.contains('\\')));
    assert!(recorder.symbol_id("f").is_some());
}

#[test]
fn missing_file_is_reported_not_panicked() {
    let mut recorder = MemoryRecorder::new();
    let result = index_file(
        Path::new("does/not/exist.py"),
        Path::new("."),
        &mut recorder,
        false,
    );
    assert!(matches!(result, Err(SymdexError::FileNotFound { .. })));
    assert!(recorder.facts.is_empty());
}
