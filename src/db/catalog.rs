// src/db/catalog.rs
//! Catalog introspection and table snapshots
//!
//! Everything here works on a single connection at a time; the migrator pairs
//! a source read with a destination write.

use std::collections::HashSet;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::consts::{INTERNAL_PREFIX, SEQUENCE_TABLE};
use crate::enums::SchemaKind;

/// One CREATE statement harvested from `sqlite_master`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaObject {
    pub kind: SchemaKind,
    pub name: String,
    pub table: String,
    pub sql: String,
}

/// Quote an identifier for interpolation into SQL
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn is_internal(name: &str) -> bool {
    name.starts_with(INTERNAL_PREFIX)
}

/// Tables a virtual table module created for its own storage (FTS5 `_data`, `_idx`, ...).
/// Recreating the virtual table recreates them.
fn shadow_tables(conn: &Connection) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare("PRAGMA main.table_list")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>("name")?, row.get::<_, String>("type")?))
    })?;

    let mut shadows = HashSet::new();
    for row in rows {
        let (name, kind) = row?;
        if kind == "shadow" {
            shadows.insert(name);
        }
    }
    Ok(shadows)
}

/// User schema objects in catalog order.
///
/// Skips internal `sqlite_*` objects, entries without SQL (automatic indexes)
/// and shadow tables.
pub fn schema_objects(conn: &Connection) -> rusqlite::Result<Vec<SchemaObject>> {
    let shadows = shadow_tables(conn)?;

    let mut stmt =
        conn.prepare("SELECT type, name, tbl_name, sql FROM sqlite_master WHERE sql IS NOT NULL")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut objects = Vec::new();
    for row in rows {
        let (kind, name, table, sql) = row?;
        let Some(kind) = SchemaKind::from_catalog(&kind) else {
            continue;
        };
        if is_internal(&name) || shadows.contains(&name) {
            continue;
        }
        objects.push(SchemaObject {
            kind,
            name,
            table,
            sql,
        });
    }
    Ok(objects)
}

/// Columns that accept an INSERT: generated and hidden columns are excluded
pub fn insertable_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name, hidden FROM pragma_table_xinfo(?1) ORDER BY cid")?;
    let rows = stmt.query_map([table], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut columns = Vec::new();
    for row in rows {
        let (name, hidden) = row?;
        if hidden == 0 {
            columns.push(name);
        }
    }
    Ok(columns)
}

/// A table's column list and full row set, read in one pass
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl TableSnapshot {
    pub fn read(conn: &Connection, table: &str) -> rusqlite::Result<Self> {
        let columns = insertable_columns(conn, table)?;
        if columns.is_empty() {
            return Ok(Self {
                table: table.to_owned(),
                columns,
                rows: Vec::new(),
            });
        }

        let sql = format!(
            "SELECT {} FROM {}",
            column_list(&columns),
            quote_ident(table)
        );
        let mut stmt = conn.prepare(&sql)?;
        let width = columns.len();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Self {
            table: table.to_owned(),
            columns,
            rows,
        })
    }

    /// Insert every row into the same-named table on `conn`, binding by position
    pub fn insert_into(&self, conn: &Connection) -> rusqlite::Result<usize> {
        if self.rows.is_empty() {
            return Ok(0);
        }

        let placeholders = (1..=self.columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.table),
            column_list(&self.columns),
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        for row in &self.rows {
            stmt.execute(params_from_iter(row.iter()))?;
        }
        Ok(self.rows.len())
    }
}

fn column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn row_count(conn: &Connection, table: &str) -> rusqlite::Result<u64> {
    let count: i64 = conn.query_row(
        &format!("SELECT count(*) FROM {}", quote_ident(table)),
        [],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

/// AUTOINCREMENT counters, empty when no table uses AUTOINCREMENT
pub fn read_sequences(conn: &Connection) -> rusqlite::Result<Vec<(String, i64)>> {
    let exists = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [SEQUENCE_TABLE],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !exists {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare("SELECT name, seq FROM sqlite_sequence")?;
    let sequences = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(sequences)
}

/// Carry counters over so deleted ids are not reused after migration
pub fn restore_sequences(conn: &Connection, sequences: &[(String, i64)]) -> rusqlite::Result<()> {
    for (name, seq) in sequences {
        let updated = conn.execute(
            "UPDATE sqlite_sequence SET seq = ?2 WHERE name = ?1",
            params![name, seq],
        )?;
        if updated == 0 {
            conn.execute(
                "INSERT INTO sqlite_sequence (name, seq) VALUES (?1, ?2)",
                params![name, seq],
            )?;
        }
    }
    Ok(())
}

/// `user_version` and `application_id` live in the file header, not the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderFields {
    pub user_version: i64,
    pub application_id: i64,
}

impl HeaderFields {
    pub fn read(conn: &Connection) -> rusqlite::Result<Self> {
        Ok(Self {
            user_version: conn.pragma_query_value(None, "user_version", |row| row.get(0))?,
            application_id: conn.pragma_query_value(None, "application_id", |row| row.get(0))?,
        })
    }

    pub fn write(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.pragma_update(None, "user_version", self.user_version)?;
        conn.pragma_update(None, "application_id", self.application_id)?;
        Ok(())
    }
}
