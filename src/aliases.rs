// src/aliases.rs
//! Re-exports secure-gate's ergonomic secret types
//!
//! These are the canonical secret types used throughout sqlcipher-migrate.

pub use secure_gate::dynamic_alias;

// Dynamic secrets
dynamic_alias!(Passphrase, String); // User-supplied database passphrase
dynamic_alias!(KeyDirective, String); // `PRAGMA key = '...'` with the passphrase embedded
