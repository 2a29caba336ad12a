// src/status.rs
//! Classify a path as absent, plain or locked — no passphrase required
//!
//! `Locked` is a heuristic: anything the plain engine cannot read lands there,
//! including corrupt plain files and files that are not databases at all.

use std::path::Path;

use tracing::debug;

use crate::consts::CATALOG_PROBE_SQL;
use crate::db::PlainEngine;
use crate::enums::DatabaseStatus;

pub fn check_status<P: AsRef<Path>>(engine: &PlainEngine, path: P) -> DatabaseStatus {
    let path = path.as_ref();
    if !path.exists() {
        return DatabaseStatus::NoDb;
    }

    let readable = engine.open_existing(path).and_then(|conn| {
        let count: i64 = conn.query_row(CATALOG_PROBE_SQL, [], |row| row.get(0))?;
        Ok(count)
    });

    match readable {
        Ok(objects) => {
            debug!(path = %path.display(), objects, "plain catalog readable");
            DatabaseStatus::Unencrypted
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, "plain catalog unreadable");
            DatabaseStatus::Locked
        }
    }
}
