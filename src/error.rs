// src/error.rs
//! Public error type for the entire crate
//!
//! No variant ever carries the passphrase. Engine errors are wrapped as-is;
//! the key directive is never part of an engine error message because the
//! primary (bound) strategy's error is the one surfaced.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("passphrase must not be empty")]
    NullPassphrase,

    #[error("encrypted storage engine (SQLCipher) is not available in this build")]
    EngineUnavailable,

    #[error("source database not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("invalid passphrase or corrupted database")]
    InvalidPassphraseOrCorrupt,

    #[error("migration copy failed: {0}")]
    CopyFailed(String),

    #[error(
        "could not replace {} with {}: {source} (both files remain on disk)",
        .target.display(),
        .temp.display()
    )]
    ReplaceFailed {
        temp: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("temp path already exists: {}", .0.display())]
    TempPathOccupied(PathBuf),

    #[error("no key strategy was configured")]
    NoKeyStrategy,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Invalid config: {0}")]
    Config(#[from] toml::de::Error),
}

/// Serializable discriminant of [`CoreError`], used by the call surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NullPassphrase,
    EngineUnavailable,
    SourceNotFound,
    InvalidPassphraseOrCorrupt,
    CopyFailed,
    ReplaceFailed,
    TempPathOccupied,
    Internal,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NullPassphrase => ErrorKind::NullPassphrase,
            CoreError::EngineUnavailable => ErrorKind::EngineUnavailable,
            CoreError::SourceNotFound(_) => ErrorKind::SourceNotFound,
            CoreError::InvalidPassphraseOrCorrupt => ErrorKind::InvalidPassphraseOrCorrupt,
            CoreError::CopyFailed(_) => ErrorKind::CopyFailed,
            CoreError::ReplaceFailed { .. } => ErrorKind::ReplaceFailed,
            CoreError::TempPathOccupied(_) => ErrorKind::TempPathOccupied,
            CoreError::NoKeyStrategy
            | CoreError::Io(_)
            | CoreError::Sql(_)
            | CoreError::Config(_) => ErrorKind::Internal,
        }
    }

    /// Fold engine and IO failures into `CopyFailed`, keeping taxonomy variants
    pub(crate) fn into_copy_failure(self, stage: &str) -> CoreError {
        match self {
            CoreError::Sql(err) => CoreError::CopyFailed(format!("{stage}: {err}")),
            CoreError::Io(err) => CoreError::CopyFailed(format!("{stage}: {err}")),
            CoreError::NoKeyStrategy => {
                CoreError::CopyFailed(format!("{stage}: no key strategy was configured"))
            }
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
