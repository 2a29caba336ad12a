// src/config/app.rs
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::defaults::*;
use crate::consts::{CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH};
use crate::enums::{HmacAlgorithm, KdfAlgorithm};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cipher: CipherSettings,
    pub migration: MigrationSettings,
}

/// SQLCipher parameters applied right after the key on every encrypted connection.
///
/// Changing any of these makes previously encrypted files unreadable with the
/// new settings, so encrypt and decrypt must run with the same values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CipherSettings {
    pub page_size: u32,
    pub kdf_iter: u32,
    pub hmac_algorithm: HmacAlgorithm,
    pub kdf_algorithm: KdfAlgorithm,
    pub plaintext_header_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationSettings {
    /// Compare per-table row counts in the destination before committing
    pub verify_row_counts: bool,
    /// fsync the temp artifact before it is renamed over the original
    pub sync_before_replace: bool,
    /// Give the converted file the original's permission bits
    pub preserve_permissions: bool,
}

impl Default for CipherSettings {
    fn default() -> Self {
        default_cipher()
    }
}

impl Default for MigrationSettings {
    fn default() -> Self {
        default_migration()
    }
}

impl CipherSettings {
    /// The `PRAGMA cipher_*` batch matching these settings
    pub fn pragmas(&self) -> String {
        format!(
            r#"
            PRAGMA cipher_page_size = {};
            PRAGMA kdf_iter = {};
            PRAGMA cipher_hmac_algorithm = {};
            PRAGMA cipher_kdf_algorithm = {};
            PRAGMA cipher_plaintext_header_size = {};
            "#,
            self.page_size,
            self.kdf_iter,
            self.hmac_algorithm.as_pragma(),
            self.kdf_algorithm.as_pragma(),
            self.plaintext_header_size,
        )
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load config at runtime — falls back to defaults if missing or invalid
pub fn load() -> &'static Config {
    CONFIG.get_or_init(|| {
        let config_path =
            std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        if !Path::new(&config_path).exists() {
            debug!(path = %config_path, "config file not found, using built-in defaults");
            return Config::default();
        }

        match Config::from_file(&config_path) {
            Ok(conf) => conf,
            Err(err) => {
                warn!(path = %config_path, error = %err, "ignoring unreadable config file");
                Config::default()
            }
        }
    })
}
