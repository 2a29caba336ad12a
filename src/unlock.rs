// src/unlock.rs
//! Open an encrypted database and prove the passphrase by reading from it
//!
//! SQLCipher cannot tell a wrong key from a damaged file: both decrypt to
//! garbage pages. Every failure after the key is applied is therefore reported
//! as [`CoreError::InvalidPassphraseOrCorrupt`].

use std::path::Path;

use rusqlite::Connection;
use tracing::debug;

use crate::aliases::Passphrase;
use crate::consts::CATALOG_PROBE_SQL;
use crate::db::CipherEngine;
use crate::error::{CoreError, Result};
use crate::key_ops::ensure_passphrase;

/// Returns a keyed, verified connection. Closing it is the caller's job.
pub fn unlock<P: AsRef<Path>>(
    engine: &CipherEngine,
    path: P,
    passphrase: &Passphrase,
) -> Result<Connection> {
    ensure_passphrase(passphrase)?;
    let path = path.as_ref();

    let verified = engine.open_existing(path, passphrase).and_then(|conn| {
        conn.query_row(CATALOG_PROBE_SQL, [], |row| row.get::<_, i64>(0))?;
        Ok(conn)
    });

    verified.map_err(|err| {
        debug!(path = %path.display(), error = %err, "unlock failed");
        CoreError::InvalidPassphraseOrCorrupt
    })
}
