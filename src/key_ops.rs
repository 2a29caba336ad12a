// src/key_ops.rs
//! Key application for SQLCipher connections
//!
//! The key is applied through an ordered list of strategies. The bound
//! parameter form is tried first; builds that only accept a literal directive
//! fall through to [`KeyStrategy::EscapedLiteral`]. Nothing here checks that
//! the key is *correct*; that takes a read (see [`crate::unlock`]).

use rusqlite::Connection;
use tracing::debug;

use crate::aliases::{KeyDirective, Passphrase};
use crate::consts::{KEY_BOUND_DIRECTIVE, KEY_DIRECTIVE_REJECTED};
use crate::error::{CoreError, Result};

/// One way of issuing `PRAGMA key`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// `PRAGMA key = ?1` with the passphrase bound as a parameter
    BoundParameter,
    /// `PRAGMA key = '...'` with every `'` doubled
    EscapedLiteral,
}

/// Primary strategy first, fallback second
pub const DEFAULT_KEY_STRATEGIES: [KeyStrategy; 2] =
    [KeyStrategy::BoundParameter, KeyStrategy::EscapedLiteral];

impl KeyStrategy {
    fn apply(self, conn: &Connection, passphrase: &Passphrase) -> rusqlite::Result<()> {
        match self {
            KeyStrategy::BoundParameter => {
                let mut stmt = conn.prepare(KEY_BOUND_DIRECTIVE)?;
                let mut rows = stmt.query([passphrase.expose_secret().as_str()])?;
                rows.next()?;
                Ok(())
            }
            KeyStrategy::EscapedLiteral => {
                let directive = KeyDirective::new(format!(
                    "PRAGMA key = '{}';",
                    escape_literal(passphrase.expose_secret())
                ));
                conn.execute_batch(directive.expose_secret())
                    .map_err(redact_directive_error)
            }
        }
    }
}

/// Engine errors for the literal directive can quote the SQL text, and with
/// it the passphrase. Keep only the result code.
fn redact_directive_error(err: rusqlite::Error) -> rusqlite::Error {
    match err.sqlite_error() {
        Some(code) => rusqlite::Error::SqliteFailure(*code, Some(KEY_DIRECTIVE_REJECTED.to_owned())),
        None => err,
    }
}

/// Double every single quote so the value is safe inside a SQL string literal
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Reject a missing passphrase before anything touches the engine.
///
/// SQLCipher treats an empty key as "no encryption", so an empty passphrase
/// would silently produce a plaintext file.
pub fn ensure_passphrase(passphrase: &Passphrase) -> Result<()> {
    if passphrase.expose_secret().is_empty() {
        return Err(CoreError::NullPassphrase);
    }
    Ok(())
}

/// Apply `passphrase` to a freshly opened, not yet keyed connection
pub fn apply_key(conn: &Connection, passphrase: &Passphrase) -> Result<()> {
    apply_key_with(conn, passphrase, &DEFAULT_KEY_STRATEGIES)
}

/// Try each strategy in order; when all fail, the first failure is returned
pub fn apply_key_with(
    conn: &Connection,
    passphrase: &Passphrase,
    strategies: &[KeyStrategy],
) -> Result<()> {
    ensure_passphrase(passphrase)?;

    let mut primary_error = None;
    for strategy in strategies {
        match strategy.apply(conn, passphrase) {
            Ok(()) => {
                debug!(?strategy, "key applied");
                return Ok(());
            }
            Err(err) => {
                debug!(?strategy, "key strategy rejected by engine");
                primary_error.get_or_insert(err);
            }
        }
    }

    Err(primary_error.map_or(CoreError::NoKeyStrategy, CoreError::Sql))
}
