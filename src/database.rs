//! SQLite symbol database writer.
//!
//! Persists recorded symbols, references and locations into a SQLite file
//! that navigation tools can query. Symbols dedup on their serialized name
//! key, which makes `record_symbol` idempotent across repeated definitions
//! and uses of the same entity.
//!
//! A database whose stored format version does not match
//! [`SUPPORTED_DATABASE_VERSION`] is reported to the operator and the
//! recorder then answers every call with a failure id; the traversal itself
//! still runs. Recording failures inside an open, compatible database are
//! logged and cost exactly one fact each.

use std::path::Path;

use rusqlite::{params, Connection};
use tracing::{error, warn};

use crate::error::{Result, SymdexError};
use crate::location::ParseLocation;
use crate::name::NameHierarchy;
use crate::record::{
    DefinitionKind, FileId, LocalSymbolId, ReferenceId, ReferenceKind, SymbolId, SymbolKind,
    SymbolRecorder,
};

/// Version of the database format written by this crate.
pub const SUPPORTED_DATABASE_VERSION: i64 = 1;

/// Row counts per fact table, used for the CLI summary.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct DatabaseStats {
    pub files: i64,
    pub symbols: i64,
    pub edges: i64,
    pub locations: i64,
    pub local_symbols: i64,
    pub errors: i64,
}

/// Recorder backed by a SQLite database file.
pub struct SqliteRecorder {
    conn: Connection,
    current_file_id: FileId,
    compatible: bool,
}

impl SqliteRecorder {
    /// Open (or create) a symbol database at `path`.
    ///
    /// An unopenable file is a hard error. A file with an incompatible
    /// format version opens, but the recorder reports the mismatch and
    /// drops every fact until [`clear`](Self::clear) rewrites it.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| SymdexError::DatabaseError {
            message: format!("Failed to open {}: {}", path.display(), e),
        })?;
        Self::from_connection(conn)
    }

    /// Open a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| SymdexError::DatabaseError {
            message: format!("Failed to open in-memory database: {}", e),
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        Self::create_schema(&conn)?;
        let loaded = Self::loaded_version(&conn)?;
        let compatible = loaded == SUPPORTED_DATABASE_VERSION;
        if !compatible {
            error!(
                supported = SUPPORTED_DATABASE_VERSION,
                loaded, "database format is not compatible; recorded facts will be dropped"
            );
        }
        Ok(Self {
            conn,
            current_file_id: 0,
            compatible,
        })
    }

    /// Whether the loaded database matches the supported format version.
    pub fn is_compatible(&self) -> bool {
        self.compatible
    }

    fn create_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                path TEXT NOT NULL UNIQUE,
                language TEXT
            );

            CREATE TABLE IF NOT EXISTS symbols (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                serialized_name TEXT NOT NULL UNIQUE,
                kind TEXT,
                definition_kind TEXT
            );

            CREATE TABLE IF NOT EXISTS edges (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_symbol_id INTEGER NOT NULL,
                target_symbol_id INTEGER NOT NULL,
                kind TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS local_symbols (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            -- One row per recorded span. `owner_id` points into symbols,
            -- edges or local_symbols depending on `kind`; comment spans
            -- have no owner.
            CREATE TABLE IF NOT EXISTS source_locations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_id INTEGER NOT NULL,
                owner_id INTEGER,
                kind TEXT NOT NULL,
                start_line INTEGER NOT NULL,
                start_column INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                end_column INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS errors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_id INTEGER,
                message TEXT NOT NULL,
                fatal INTEGER NOT NULL,
                start_line INTEGER NOT NULL,
                start_column INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                end_column INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_symbol_id);
            CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_symbol_id);
            CREATE INDEX IF NOT EXISTS idx_locations_file ON source_locations(file_id);
            CREATE INDEX IF NOT EXISTS idx_locations_owner ON source_locations(owner_id, kind);
            "#,
        )
        .map_err(db_error)?;
        conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('version', ?1)",
            params![SUPPORTED_DATABASE_VERSION.to_string()],
        )
        .map_err(db_error)?;
        Ok(())
    }

    fn loaded_version(conn: &Connection) -> Result<i64> {
        let raw: String = conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                row.get(0)
            })
            .map_err(db_error)?;
        raw.parse().map_err(|_| SymdexError::DatabaseError {
            message: format!("Malformed database version: {}", raw),
        })
    }

    /// Drop all recorded facts, keeping the schema, and stamp the database
    /// with the supported format version.
    pub fn clear(&mut self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
                DELETE FROM files;
                DELETE FROM symbols;
                DELETE FROM edges;
                DELETE FROM local_symbols;
                DELETE FROM source_locations;
                DELETE FROM errors;
                "#,
            )
            .map_err(db_error)?;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO meta (key, value) VALUES ('version', ?1)",
                params![SUPPORTED_DATABASE_VERSION.to_string()],
            )
            .map_err(db_error)?;
        self.current_file_id = 0;
        self.compatible = true;
        Ok(())
    }

    /// Row counts across all fact tables.
    pub fn stats(&self) -> Result<DatabaseStats> {
        let count = |table: &str| -> Result<i64> {
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })
                .map_err(db_error)
        };
        Ok(DatabaseStats {
            files: count("files")?,
            symbols: count("symbols")?,
            edges: count("edges")?,
            locations: count("source_locations")?,
            local_symbols: count("local_symbols")?,
            errors: count("errors")?,
        })
    }

    fn insert_id(&self, insert: &str, lookup: &str, key: &str) -> rusqlite::Result<i64> {
        self.conn.execute(insert, params![key])?;
        self.conn.query_row(lookup, params![key], |row| row.get(0))
    }

    fn insert_location(&self, owner_id: Option<i64>, kind: &str, location: ParseLocation) {
        if self.current_file_id == 0 {
            warn!(kind, "location recorded before any file; dropped");
            return;
        }
        let result = self.conn.execute(
            "INSERT INTO source_locations
             (file_id, owner_id, kind, start_line, start_column, end_line, end_column)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.current_file_id,
                owner_id,
                kind,
                location.start_line,
                location.start_column,
                location.end_line,
                location.end_column
            ],
        );
        if let Err(e) = result {
            warn!(kind, %location, "location could not be recorded: {e}");
        }
    }
}

impl SymbolRecorder for SqliteRecorder {
    fn record_file(&mut self, path: &str) -> FileId {
        if !self.compatible {
            return 0;
        }
        match self.insert_id(
            "INSERT OR IGNORE INTO files (path) VALUES (?1)",
            "SELECT id FROM files WHERE path = ?1",
            path,
        ) {
            Ok(id) => {
                self.current_file_id = id;
                id
            }
            Err(e) => {
                warn!(path, "file could not be recorded: {e}");
                0
            }
        }
    }

    fn record_file_language(&mut self, file_id: FileId, language: &str) {
        if !self.compatible || file_id == 0 {
            return;
        }
        let result = self.conn.execute(
            "UPDATE files SET language = ?1 WHERE id = ?2",
            params![language, file_id],
        );
        if let Err(e) = result {
            warn!(file_id, "file language could not be recorded: {e}");
        }
    }

    fn record_symbol(&mut self, hierarchy: &NameHierarchy) -> SymbolId {
        if !self.compatible {
            return 0;
        }
        if hierarchy.elements.is_empty() {
            warn!("symbol with empty hierarchy rejected");
            return 0;
        }
        let key = hierarchy.serialize();
        match self.insert_id(
            "INSERT OR IGNORE INTO symbols (serialized_name) VALUES (?1)",
            "SELECT id FROM symbols WHERE serialized_name = ?1",
            &key,
        ) {
            Ok(id) => id,
            Err(e) => {
                warn!(symbol = %hierarchy.display_string(), "symbol could not be recorded: {e}");
                0
            }
        }
    }

    fn record_symbol_kind(&mut self, symbol_id: SymbolId, kind: SymbolKind) {
        if !self.compatible || symbol_id == 0 {
            return;
        }
        let result = self.conn.execute(
            "UPDATE symbols SET kind = ?1 WHERE id = ?2",
            params![kind.as_str(), symbol_id],
        );
        if let Err(e) = result {
            warn!(symbol_id, "symbol kind could not be recorded: {e}");
        }
    }

    fn record_symbol_definition_kind(&mut self, symbol_id: SymbolId, kind: DefinitionKind) {
        if !self.compatible || symbol_id == 0 {
            return;
        }
        let result = self.conn.execute(
            "UPDATE symbols SET definition_kind = ?1 WHERE id = ?2",
            params![kind.as_str(), symbol_id],
        );
        if let Err(e) = result {
            warn!(symbol_id, "symbol definition kind could not be recorded: {e}");
        }
    }

    fn record_symbol_location(&mut self, symbol_id: SymbolId, location: ParseLocation) {
        if !self.compatible || symbol_id == 0 {
            return;
        }
        self.insert_location(Some(symbol_id), "symbol", location);
    }

    fn record_symbol_scope_location(&mut self, symbol_id: SymbolId, location: ParseLocation) {
        if !self.compatible || symbol_id == 0 {
            return;
        }
        self.insert_location(Some(symbol_id), "scope", location);
    }

    fn record_symbol_signature_location(&mut self, symbol_id: SymbolId, location: ParseLocation) {
        if !self.compatible || symbol_id == 0 {
            return;
        }
        self.insert_location(Some(symbol_id), "signature", location);
    }

    fn record_reference(
        &mut self,
        context_symbol_id: SymbolId,
        referenced_symbol_id: SymbolId,
        kind: ReferenceKind,
    ) -> ReferenceId {
        if !self.compatible || context_symbol_id == 0 || referenced_symbol_id == 0 {
            return 0;
        }
        let result = self
            .conn
            .execute(
                "INSERT INTO edges (source_symbol_id, target_symbol_id, kind) VALUES (?1, ?2, ?3)",
                params![context_symbol_id, referenced_symbol_id, kind.as_str()],
            )
            .map(|_| self.conn.last_insert_rowid());
        match result {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    context_symbol_id,
                    referenced_symbol_id, "reference could not be recorded: {e}"
                );
                0
            }
        }
    }

    fn record_reference_location(&mut self, reference_id: ReferenceId, location: ParseLocation) {
        if !self.compatible || reference_id == 0 {
            return;
        }
        self.insert_location(Some(reference_id), "reference", location);
    }

    fn record_local_symbol(&mut self, name: &str) -> LocalSymbolId {
        if !self.compatible {
            return 0;
        }
        match self.insert_id(
            "INSERT OR IGNORE INTO local_symbols (name) VALUES (?1)",
            "SELECT id FROM local_symbols WHERE name = ?1",
            name,
        ) {
            Ok(id) => id,
            Err(e) => {
                warn!(name, "local symbol could not be recorded: {e}");
                0
            }
        }
    }

    fn record_local_symbol_location(
        &mut self,
        local_symbol_id: LocalSymbolId,
        location: ParseLocation,
    ) {
        if !self.compatible || local_symbol_id == 0 {
            return;
        }
        self.insert_location(Some(local_symbol_id), "local", location);
    }

    fn record_comment_location(&mut self, location: ParseLocation) {
        if !self.compatible {
            return;
        }
        self.insert_location(None, "comment", location);
    }

    fn record_error(&mut self, message: &str, fatal: bool, location: ParseLocation) {
        if !self.compatible {
            return;
        }
        let file_id = (self.current_file_id != 0).then_some(self.current_file_id);
        let result = self.conn.execute(
            "INSERT INTO errors
             (file_id, message, fatal, start_line, start_column, end_line, end_column)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                file_id,
                message,
                fatal,
                location.start_line,
                location.start_column,
                location.end_line,
                location.end_column
            ],
        );
        if let Err(e) = result {
            warn!("error fact could not be recorded: {e}");
        }
    }
}

fn db_error(e: rusqlite::Error) -> SymdexError {
    SymdexError::DatabaseError {
        message: e.to_string(),
    }
}
