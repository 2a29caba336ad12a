// src/config/mod.rs
//! Configuration system for sqlcipher-migrate
//!
//! Central, lazy-loaded global config with TOML + env overrides.

pub use app::{load, CipherSettings, Config, MigrationSettings};

mod app;
mod defaults;
