//! Recording façade between the traversal engine and the symbol database.
//!
//! The traversal engine only ever talks to a [`SymbolRecorder`]. Recording
//! ids are opaque positive integers; zero is the failure channel and there
//! is no other error return on recording calls. A failed call means one
//! fact is lost, never that a traversal stops.

use std::collections::HashMap;

use serde::Serialize;

use crate::location::ParseLocation;
use crate::name::NameHierarchy;

pub type FileId = i64;
pub type SymbolId = i64;
pub type ReferenceId = i64;
pub type LocalSymbolId = i64;

/// Kind of a recorded symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Module,
    Class,
    Function,
    Field,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Class => "class",
            Self::Function => "function",
            Self::Field => "field",
        }
    }
}

/// Whether a definition is spelled out in source or synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Explicit,
    Implicit,
}

impl DefinitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Implicit => "implicit",
        }
    }
}

/// Kind of a recorded reference edge.
///
/// The traversal records every resolved name use as `Call`; it does not
/// distinguish call, read and write uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Call,
    Usage,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Usage => "usage",
        }
    }
}

/// Recording operations against the symbol database.
///
/// Every location-bearing call is implicitly qualified by the file
/// established by the most recent [`record_file`](Self::record_file) call;
/// implementations hold the current file id as per-pass state, so a
/// recorder must see `record_file` again before facts for a different file.
///
/// `record_symbol` is idempotent: recording the same serialized hierarchy
/// key twice yields the same id.
pub trait SymbolRecorder {
    fn record_file(&mut self, path: &str) -> FileId;
    fn record_file_language(&mut self, file_id: FileId, language: &str);
    fn record_symbol(&mut self, hierarchy: &NameHierarchy) -> SymbolId;
    fn record_symbol_kind(&mut self, symbol_id: SymbolId, kind: SymbolKind);
    fn record_symbol_definition_kind(&mut self, symbol_id: SymbolId, kind: DefinitionKind);
    fn record_symbol_location(&mut self, symbol_id: SymbolId, location: ParseLocation);
    fn record_symbol_scope_location(&mut self, symbol_id: SymbolId, location: ParseLocation);
    fn record_symbol_signature_location(&mut self, symbol_id: SymbolId, location: ParseLocation);
    fn record_reference(
        &mut self,
        context_symbol_id: SymbolId,
        referenced_symbol_id: SymbolId,
        kind: ReferenceKind,
    ) -> ReferenceId;
    fn record_reference_location(&mut self, reference_id: ReferenceId, location: ParseLocation);
    fn record_local_symbol(&mut self, name: &str) -> LocalSymbolId;
    fn record_local_symbol_location(
        &mut self,
        local_symbol_id: LocalSymbolId,
        location: ParseLocation,
    );
    fn record_comment_location(&mut self, location: ParseLocation);
    fn record_error(&mut self, message: &str, fatal: bool, location: ParseLocation);
}

/// One recorded fact, in call order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Fact {
    File {
        id: FileId,
        path: String,
    },
    FileLanguage {
        id: FileId,
        language: String,
    },
    Symbol {
        id: SymbolId,
        key: String,
    },
    SymbolKind {
        id: SymbolId,
        kind: SymbolKind,
    },
    SymbolDefinitionKind {
        id: SymbolId,
        kind: DefinitionKind,
    },
    SymbolLocation {
        id: SymbolId,
        file_id: FileId,
        location: ParseLocation,
    },
    SymbolScopeLocation {
        id: SymbolId,
        file_id: FileId,
        location: ParseLocation,
    },
    SymbolSignatureLocation {
        id: SymbolId,
        file_id: FileId,
        location: ParseLocation,
    },
    Reference {
        id: ReferenceId,
        context_id: SymbolId,
        referenced_id: SymbolId,
        kind: ReferenceKind,
    },
    ReferenceLocation {
        id: ReferenceId,
        file_id: FileId,
        location: ParseLocation,
    },
    LocalSymbol {
        id: LocalSymbolId,
        name: String,
    },
    LocalSymbolLocation {
        id: LocalSymbolId,
        file_id: FileId,
        location: ParseLocation,
    },
    CommentLocation {
        file_id: FileId,
        location: ParseLocation,
    },
    Error {
        file_id: FileId,
        message: String,
        fatal: bool,
        location: ParseLocation,
    },
}

/// In-memory recorder used by tests and embedders that inspect the fact
/// stream instead of writing a database file.
///
/// Symbols and local symbols dedup by key, matching the idempotency
/// guarantee of the SQLite writer.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    pub facts: Vec<Fact>,
    symbols_by_key: HashMap<String, SymbolId>,
    locals_by_name: HashMap<String, LocalSymbolId>,
    next_id: i64,
    current_file: FileId,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Look up a recorded symbol id by its display string, e.g. `"A.x"`.
    pub fn symbol_id(&self, display: &str) -> Option<SymbolId> {
        self.symbols_by_key.iter().find_map(|(key, id)| {
            let hierarchy = NameHierarchy::deserialize(key)?;
            (hierarchy.display_string() == display).then_some(*id)
        })
    }

    /// All recorded reference edges as (context, referenced, kind) triples.
    pub fn references(&self) -> Vec<(SymbolId, SymbolId, ReferenceKind)> {
        self.facts
            .iter()
            .filter_map(|fact| match fact {
                Fact::Reference {
                    context_id,
                    referenced_id,
                    kind,
                    ..
                } => Some((*context_id, *referenced_id, *kind)),
                _ => None,
            })
            .collect()
    }
}

impl SymbolRecorder for MemoryRecorder {
    fn record_file(&mut self, path: &str) -> FileId {
        let id = self.fresh_id();
        self.current_file = id;
        self.facts.push(Fact::File {
            id,
            path: path.to_string(),
        });
        id
    }

    fn record_file_language(&mut self, file_id: FileId, language: &str) {
        if file_id == 0 {
            return;
        }
        self.facts.push(Fact::FileLanguage {
            id: file_id,
            language: language.to_string(),
        });
    }

    fn record_symbol(&mut self, hierarchy: &NameHierarchy) -> SymbolId {
        if hierarchy.elements.is_empty() {
            return 0;
        }
        let key = hierarchy.serialize();
        let id = match self.symbols_by_key.get(&key) {
            Some(existing) => *existing,
            None => {
                let id = self.fresh_id();
                self.symbols_by_key.insert(key.clone(), id);
                id
            }
        };
        self.facts.push(Fact::Symbol { id, key });
        id
    }

    fn record_symbol_kind(&mut self, symbol_id: SymbolId, kind: SymbolKind) {
        if symbol_id == 0 {
            return;
        }
        self.facts.push(Fact::SymbolKind {
            id: symbol_id,
            kind,
        });
    }

    fn record_symbol_definition_kind(&mut self, symbol_id: SymbolId, kind: DefinitionKind) {
        if symbol_id == 0 {
            return;
        }
        self.facts.push(Fact::SymbolDefinitionKind {
            id: symbol_id,
            kind,
        });
    }

    fn record_symbol_location(&mut self, symbol_id: SymbolId, location: ParseLocation) {
        if symbol_id == 0 {
            return;
        }
        self.facts.push(Fact::SymbolLocation {
            id: symbol_id,
            file_id: self.current_file,
            location,
        });
    }

    fn record_symbol_scope_location(&mut self, symbol_id: SymbolId, location: ParseLocation) {
        if symbol_id == 0 {
            return;
        }
        self.facts.push(Fact::SymbolScopeLocation {
            id: symbol_id,
            file_id: self.current_file,
            location,
        });
    }

    fn record_symbol_signature_location(&mut self, symbol_id: SymbolId, location: ParseLocation) {
        if symbol_id == 0 {
            return;
        }
        self.facts.push(Fact::SymbolSignatureLocation {
            id: symbol_id,
            file_id: self.current_file,
            location,
        });
    }

    fn record_reference(
        &mut self,
        context_symbol_id: SymbolId,
        referenced_symbol_id: SymbolId,
        kind: ReferenceKind,
    ) -> ReferenceId {
        if context_symbol_id == 0 || referenced_symbol_id == 0 {
            return 0;
        }
        let id = self.fresh_id();
        self.facts.push(Fact::Reference {
            id,
            context_id: context_symbol_id,
            referenced_id: referenced_symbol_id,
            kind,
        });
        id
    }

    fn record_reference_location(&mut self, reference_id: ReferenceId, location: ParseLocation) {
        if reference_id == 0 {
            return;
        }
        self.facts.push(Fact::ReferenceLocation {
            id: reference_id,
            file_id: self.current_file,
            location,
        });
    }

    fn record_local_symbol(&mut self, name: &str) -> LocalSymbolId {
        let id = match self.locals_by_name.get(name) {
            Some(existing) => *existing,
            None => {
                let id = self.fresh_id();
                self.locals_by_name.insert(name.to_string(), id);
                id
            }
        };
        self.facts.push(Fact::LocalSymbol {
            id,
            name: name.to_string(),
        });
        id
    }

    fn record_local_symbol_location(
        &mut self,
        local_symbol_id: LocalSymbolId,
        location: ParseLocation,
    ) {
        if local_symbol_id == 0 {
            return;
        }
        self.facts.push(Fact::LocalSymbolLocation {
            id: local_symbol_id,
            file_id: self.current_file,
            location,
        });
    }

    fn record_comment_location(&mut self, location: ParseLocation) {
        self.facts.push(Fact::CommentLocation {
            file_id: self.current_file,
            location,
        });
    }

    fn record_error(&mut self, message: &str, fatal: bool, location: ParseLocation) {
        self.facts.push(Fact::Error {
            file_id: self.current_file,
            message: message.to_string(),
            fatal,
            location,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::{NameElement, PYTHON_DELIMITER};

    fn hierarchy(name: &str) -> NameHierarchy {
        NameHierarchy::new(NameElement::new(name), PYTHON_DELIMITER)
    }

    #[test]
    fn record_symbol_is_idempotent_by_key() {
        let mut recorder = MemoryRecorder::new();
        let first = recorder.record_symbol(&hierarchy("A"));
        let second = recorder.record_symbol(&hierarchy("A"));
        let other = recorder.record_symbol(&hierarchy("B"));

        assert!(first > 0);
        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn empty_hierarchy_fails_with_zero_id() {
        let mut recorder = MemoryRecorder::new();
        let empty = NameHierarchy {
            delimiter: PYTHON_DELIMITER.to_string(),
            elements: Vec::new(),
        };
        assert_eq!(recorder.record_symbol(&empty), 0);
        assert!(recorder.facts.is_empty());
    }

    #[test]
    fn reference_with_falsy_endpoint_fails() {
        let mut recorder = MemoryRecorder::new();
        let symbol = recorder.record_symbol(&hierarchy("A"));
        assert_eq!(recorder.record_reference(0, symbol, ReferenceKind::Call), 0);
        assert_eq!(recorder.record_reference(symbol, 0, ReferenceKind::Call), 0);
        assert!(recorder.record_reference(symbol, symbol, ReferenceKind::Call) > 0);
    }

    #[test]
    fn symbol_id_lookup_uses_display_string() {
        let mut recorder = MemoryRecorder::new();
        let mut nested = hierarchy("A");
        nested.elements.push(NameElement::new("x"));
        let id = recorder.record_symbol(&nested);

        assert_eq!(recorder.symbol_id("A.x"), Some(id));
        assert_eq!(recorder.symbol_id("A.y"), None);
    }
}
