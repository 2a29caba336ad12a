// src/consts.rs
//! Shared constants — SQLCipher parameters, catalog names and file naming

/// Recommended KDF iterations for SQLCipher databases (SQLCipher 4 default)
// ~0.1–0.2s on modern hardware — good default
pub const DB_KDF_ITERATIONS: u32 = 256_000;

/// SQLCipher 4 default page size
pub const DB_PAGE_SIZE: u32 = 4096;

/// Names with this prefix are reserved for the engine's own bookkeeping
pub const INTERNAL_PREFIX: &str = "sqlite_";

/// AUTOINCREMENT counters live here
pub const SEQUENCE_TABLE: &str = "sqlite_sequence";

/// Trivial catalog read used to probe readability
pub const CATALOG_PROBE_SQL: &str = "SELECT count(*) FROM sqlite_master";

/// Bound-parameter form of the key directive
pub const KEY_BOUND_DIRECTIVE: &str = "PRAGMA key = ?1";

/// Replaces the engine message when the literal key directive fails
pub const KEY_DIRECTIVE_REJECTED: &str = "key directive rejected";

/// Files SQLite may leave next to a database
pub const SIDECAR_SUFFIXES: [&str; 3] = ["-journal", "-wal", "-shm"];

/// Environment variable pointing at the TOML config file
pub const CONFIG_ENV_VAR: &str = "DBCRYPT_CONFIG";

/// Config file used when `DBCRYPT_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "dbcrypt.toml";

/// Suffix of synthesized temp artifacts
pub const TEMP_SUFFIX: &str = ".tmp";
