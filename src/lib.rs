// src/lib.rs
//! sqlcipher-migrate — move a SQLite database in and out of SQLCipher encryption
//!
//! Features:
//! - Status detection without a passphrase (`NO_DB` / `UNENCRYPTED` / `LOCKED`)
//! - Passphrase verification that returns a keyed connection
//! - Full plain ⇄ encrypted migration via snapshot, copy and atomic rename
//! - Full secure-gate integration for passphrases
//!
//! The original file is either fully converted or left byte-for-byte as it was.
//! Migration assumes exclusive access to the file for the duration of the call.

pub mod aliases;
pub mod api;
pub mod config;
pub mod consts;
pub mod db;
pub mod enums;
pub mod error;
pub mod file_ops;
pub mod key_ops;
pub mod migrate;
pub mod status;
pub mod unlock;

// Re-export everything users need at the crate root
pub use aliases::Passphrase;
pub use api::{
    check_database_status, decrypt_database, encrypt_database, unlock_encrypted_database,
    Outcome, StatusReport, UnlockOutcome,
};
pub use config::load as load_config;
pub use enums::{DatabaseStatus, Direction};
pub use error::{CoreError, ErrorKind, Result as CoreResult};
pub use key_ops::{apply_key, apply_key_with, KeyStrategy};
pub use migrate::{MigrationReport, Migrator, TableReport};
