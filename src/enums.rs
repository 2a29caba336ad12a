// src/enums.rs
//! Public enum types used throughout the crate
//!
//! Central location for the small user-visible enums: database status,
//! migration direction and the SQLCipher algorithm choices.

use std::fmt;

use serde::{Deserialize, Serialize};

/// On-disk state of a database path, as seen without a passphrase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatabaseStatus {
    /// Nothing exists at the path
    NoDb,
    /// The plain engine can read the catalog
    Unencrypted,
    /// Unreadable without a key: encrypted, or corrupt, or not a database at all
    Locked,
}

/// Which way a migration converts the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// plain → encrypted
    Encrypt,
    /// encrypted → plain
    Decrypt,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Encrypt => "encrypt",
            Direction::Decrypt => "decrypt",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `PRAGMA cipher_hmac_algorithm` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HmacAlgorithm {
    #[serde(rename = "HMAC_SHA1")]
    HmacSha1,
    #[serde(rename = "HMAC_SHA256")]
    HmacSha256,
    #[default]
    #[serde(rename = "HMAC_SHA512")]
    HmacSha512,
}

impl HmacAlgorithm {
    pub fn as_pragma(self) -> &'static str {
        match self {
            HmacAlgorithm::HmacSha1 => "HMAC_SHA1",
            HmacAlgorithm::HmacSha256 => "HMAC_SHA256",
            HmacAlgorithm::HmacSha512 => "HMAC_SHA512",
        }
    }
}

/// `PRAGMA cipher_kdf_algorithm` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum KdfAlgorithm {
    #[serde(rename = "PBKDF2_HMAC_SHA1")]
    Pbkdf2HmacSha1,
    #[serde(rename = "PBKDF2_HMAC_SHA256")]
    Pbkdf2HmacSha256,
    #[default]
    #[serde(rename = "PBKDF2_HMAC_SHA512")]
    Pbkdf2HmacSha512,
}

impl KdfAlgorithm {
    pub fn as_pragma(self) -> &'static str {
        match self {
            KdfAlgorithm::Pbkdf2HmacSha1 => "PBKDF2_HMAC_SHA1",
            KdfAlgorithm::Pbkdf2HmacSha256 => "PBKDF2_HMAC_SHA256",
            KdfAlgorithm::Pbkdf2HmacSha512 => "PBKDF2_HMAC_SHA512",
        }
    }
}

/// Kind of catalog entry, from `sqlite_master.type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Table,
    Index,
    View,
    Trigger,
}

impl SchemaKind {
    pub fn from_catalog(kind: &str) -> Option<Self> {
        match kind {
            "table" => Some(SchemaKind::Table),
            "index" => Some(SchemaKind::Index),
            "view" => Some(SchemaKind::View),
            "trigger" => Some(SchemaKind::Trigger),
            _ => None,
        }
    }
}
