// src/db/mod.rs
//! Storage engines and catalog access

pub mod catalog;
pub mod engine;

pub use catalog::{SchemaObject, TableSnapshot};
pub use engine::{CipherEngine, PlainEngine};
