// src/db/engine.rs
//! The two storage engines a migration moves between
//!
//! Both are reached through the same SQLCipher-enabled SQLite library; the
//! plain engine simply never issues a key. [`CipherEngine`] is a capability:
//! it only exists when [`CipherEngine::probe`] finds SQLCipher at runtime.

use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use tracing::debug;

use crate::aliases::Passphrase;
use crate::config::CipherSettings;
use crate::error::Result;
use crate::key_ops::apply_key;

/// Open an existing file without ever creating one
fn existing_flags() -> OpenFlags {
    OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX
}

fn create_flags() -> OpenFlags {
    existing_flags() | OpenFlags::SQLITE_OPEN_CREATE
}

/// `PRAGMA cipher_version` is silently ignored (no rows) by plain SQLite
fn cipher_version() -> rusqlite::Result<Option<String>> {
    let conn = Connection::open_in_memory()?;
    let version = conn
        .query_row("PRAGMA cipher_version", [], |row| row.get::<_, String>(0))
        .optional()?;
    Ok(version)
}

/// Unencrypted SQLite
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainEngine;

impl PlainEngine {
    pub fn open_existing<P: AsRef<Path>>(&self, path: P) -> rusqlite::Result<Connection> {
        Connection::open_with_flags(path, existing_flags())
    }

    pub fn create<P: AsRef<Path>>(&self, path: P) -> rusqlite::Result<Connection> {
        Connection::open_with_flags(path, create_flags())
    }
}

/// SQLCipher, keyed with a passphrase and the configured cipher settings
#[derive(Debug, Clone)]
pub struct CipherEngine {
    settings: CipherSettings,
    version: String,
}

impl CipherEngine {
    /// Returns `None` when the linked SQLite has no SQLCipher codec
    pub fn probe(settings: CipherSettings) -> Option<Self> {
        let version = cipher_version().ok().flatten()?;

        debug!(%version, "SQLCipher available");
        Some(Self { settings, version })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn settings(&self) -> &CipherSettings {
        &self.settings
    }

    /// Open an existing file and key it. The key is not verified here.
    pub fn open_existing<P: AsRef<Path>>(
        &self,
        path: P,
        passphrase: &Passphrase,
    ) -> Result<Connection> {
        let conn = Connection::open_with_flags(path, existing_flags())?;
        self.key(&conn, passphrase)?;
        Ok(conn)
    }

    /// Open (creating if needed) a file and key it
    pub fn create<P: AsRef<Path>>(&self, path: P, passphrase: &Passphrase) -> Result<Connection> {
        let conn = Connection::open_with_flags(path, create_flags())?;
        self.key(&conn, passphrase)?;
        Ok(conn)
    }

    fn key(&self, conn: &Connection, passphrase: &Passphrase) -> Result<()> {
        apply_key(conn, passphrase)?;
        conn.execute_batch(&self.settings.pragmas())?;
        Ok(())
    }
}
