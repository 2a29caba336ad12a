// tests/support.rs
//! Test fixtures — sample databases and logical snapshots for comparison

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::Connection;
use sqlcipher_migrate::config::Config;
use sqlcipher_migrate::{Migrator, Passphrase};
use tempfile::TempDir;

#[allow(dead_code)]
pub const PASSPHRASE: &str = "correct horse battery staple";

#[allow(dead_code)]
pub fn passphrase(value: &str) -> Passphrase {
    Passphrase::new(value.to_owned())
}

#[allow(dead_code)]
pub fn migrator() -> Migrator {
    Migrator::from_config(&Config::default())
}

/// A scratch directory with a database path inside it
#[allow(dead_code)]
pub struct Workspace {
    pub dir: TempDir,
    pub db: PathBuf,
}

#[allow(dead_code)]
impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db = dir.path().join("app.db");
        Self { dir, db }
    }

    /// Every entry in the directory, so tests can spot leftover temp files
    pub fn entries(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.dir.path())
            .expect("read dir")
            .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Plain database with a bit of everything: autoincrement, blobs, NULLs,
/// reals, a foreign key, an index, a view, a trigger, an empty table,
/// an awkward table name and a user_version.
#[allow(dead_code)]
pub fn create_sample_db(path: &Path) {
    let conn = Connection::open(path).expect("open sample db");
    conn.execute_batch(
        r#"
        CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT UNIQUE,
            avatar BLOB,
            score REAL
        );
        CREATE TABLE notes (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id),
            body TEXT
        );
        CREATE TABLE audit (user_id INTEGER, action TEXT);
        CREATE TABLE empty_things (x INTEGER, y TEXT);
        CREATE TABLE "order items" ("select" TEXT, "qty""x" INTEGER);
        CREATE INDEX idx_notes_user ON notes(user_id);
        CREATE VIEW user_names AS SELECT name FROM users;
        CREATE TRIGGER users_audit AFTER INSERT ON users
        BEGIN
            INSERT INTO audit (user_id, action) VALUES (NEW.id, 'insert');
        END;

        INSERT INTO users (name, email, avatar, score)
            VALUES ('alice', 'alice@example.com', x'deadbeef', 9.5);
        INSERT INTO users (name, email, avatar, score)
            VALUES ('bob', NULL, NULL, -1.25);
        INSERT INTO users (name, email, avatar, score)
            VALUES ('carol', 'carol@example.com', x'', 0.0);
        DELETE FROM users WHERE name = 'carol';
        INSERT INTO notes (user_id, body) VALUES (1, 'it''s a note'), (2, NULL), (1, '');
        INSERT INTO "order items" VALUES ('widget', 3);

        PRAGMA user_version = 7;
        "#,
    )
    .expect("populate sample db");
}

/// Table name → sorted rows, rendered for comparison as multisets
#[allow(dead_code)]
pub type Logical = BTreeMap<String, Vec<String>>;

#[allow(dead_code)]
pub fn logical_contents(conn: &Connection) -> Logical {
    let tables: Vec<String> = conn
        .prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .expect("prepare table list")
        .query_map([], |r| r.get(0))
        .expect("query table list")
        .collect::<rusqlite::Result<_>>()
        .expect("collect table list");

    let mut out = BTreeMap::new();
    for table in tables {
        let quoted = format!("\"{}\"", table.replace('"', "\"\""));
        let mut stmt = conn
            .prepare(&format!("SELECT * FROM {quoted}"))
            .expect("prepare select");
        let width = stmt.column_count();
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let mut rows: Vec<String> = stmt
            .query_map([], |row| {
                let values = (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(format!("{values:?}"))
            })
            .expect("query rows")
            .collect::<rusqlite::Result<_>>()
            .expect("collect rows");
        rows.sort();
        rows.insert(0, format!("columns={columns:?}"));
        out.insert(table, rows);
    }
    out
}

#[allow(dead_code)]
pub fn open_plain(path: &Path) -> Connection {
    Connection::open(path).expect("open plain db")
}

#[allow(dead_code)]
pub fn open_encrypted(path: &Path, pass: &str) -> Connection {
    migrator()
        .unlock(path, &passphrase(pass))
        .expect("unlock encrypted db")
}
