// src/api.rs
//! Structured call surface
//!
//! These functions never return `Err`: every failure is folded into a tagged
//! payload carrying an [`ErrorKind`] and a message. Messages come from
//! [`CoreError`]'s `Display`, which never includes the passphrase.

use std::path::Path;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::aliases::Passphrase;
use crate::enums::DatabaseStatus;
use crate::error::{CoreError, ErrorKind};
use crate::migrate::{MigrationReport, Migrator};

/// `{"status": "NO_DB" | "UNENCRYPTED" | "LOCKED"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: DatabaseStatus,
}

/// Result of `encrypt_database` / `decrypt_database`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok { report: MigrationReport },
    Error { kind: ErrorKind, message: String },
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Ok { .. } => None,
            Outcome::Error { kind, .. } => Some(*kind),
        }
    }
}

impl From<Result<MigrationReport, CoreError>> for Outcome {
    fn from(result: Result<MigrationReport, CoreError>) -> Self {
        match result {
            Ok(report) => Outcome::Ok { report },
            Err(err) => Outcome::Error {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

/// Result of `unlock_encrypted_database`; the connection belongs to the caller
#[derive(Debug)]
pub enum UnlockOutcome {
    Ok { connection: Connection },
    Error { kind: ErrorKind, message: String },
}

impl UnlockOutcome {
    pub fn into_connection(self) -> Option<Connection> {
        match self {
            UnlockOutcome::Ok { connection } => Some(connection),
            UnlockOutcome::Error { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            UnlockOutcome::Ok { .. } => None,
            UnlockOutcome::Error { kind, .. } => Some(*kind),
        }
    }
}

pub fn check_database_status<P: AsRef<Path>>(path: P) -> StatusReport {
    StatusReport {
        status: Migrator::new().check_status(path),
    }
}

pub fn unlock_encrypted_database<P: AsRef<Path>>(
    path: P,
    passphrase: &Passphrase,
) -> UnlockOutcome {
    match Migrator::new().unlock(path, passphrase) {
        Ok(connection) => UnlockOutcome::Ok { connection },
        Err(err) => UnlockOutcome::Error {
            kind: err.kind(),
            message: err.to_string(),
        },
    }
}

pub fn encrypt_database<P: AsRef<Path>>(
    path: P,
    passphrase: &Passphrase,
    temp_path: Option<&Path>,
) -> Outcome {
    Migrator::new().encrypt(path, passphrase, temp_path).into()
}

pub fn decrypt_database<P: AsRef<Path>>(
    path: P,
    passphrase: &Passphrase,
    temp_path: Option<&Path>,
) -> Outcome {
    Migrator::new().decrypt(path, passphrase, temp_path).into()
}
