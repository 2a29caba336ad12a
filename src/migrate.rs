// src/migrate.rs
//! Snapshot-copy-and-swap migration between plain and encrypted storage
//!
//! Both directions run the same pipeline:
//!
//! 1. check the cipher capability, passphrase and source
//! 2. open the source (decrypt: through [`unlock`], so a bad passphrase
//!    surfaces before any file is created)
//! 3. create a temp artifact beside the source and open it under the
//!    destination engine
//! 4. copy tables, rows, secondary objects and header fields inside one
//!    destination transaction
//! 5. commit, close, fsync, then rename the artifact over the source
//!
//! Every failure before the rename drops the connections and the artifact,
//! leaving the source exactly as it was.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aliases::Passphrase;
use crate::config::{self, Config, MigrationSettings};
use crate::db::catalog::{self, HeaderFields, TableSnapshot};
use crate::db::{CipherEngine, PlainEngine};
use crate::enums::{DatabaseStatus, Direction, SchemaKind};
use crate::error::{CoreError, Result};
use crate::file_ops::TempArtifact;
use crate::key_ops::ensure_passphrase;
use crate::status::check_status;
use crate::unlock::unlock;

/// Rows copied for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    pub name: String,
    pub rows: u64,
}

/// What a successful migration did
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    pub direction: Direction,
    pub tables: Vec<TableReport>,
    pub schema_objects: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl MigrationReport {
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

struct CopySummary {
    tables: Vec<TableReport>,
    schema_objects: usize,
}

/// Owns both engines. The cipher engine is optional: a build or runtime
/// without SQLCipher yields [`CoreError::EngineUnavailable`] from every
/// operation that needs it.
#[derive(Debug, Clone)]
pub struct Migrator {
    plain: PlainEngine,
    cipher: Option<CipherEngine>,
    settings: MigrationSettings,
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Migrator {
    /// Built from the global config (see [`config::load`])
    pub fn new() -> Self {
        Self::from_config(config::load())
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            plain: PlainEngine,
            cipher: CipherEngine::probe(config.cipher.clone()),
            settings: config.migration.clone(),
        }
    }

    /// A migrator with no encrypted engine
    pub fn without_cipher(settings: MigrationSettings) -> Self {
        Self {
            plain: PlainEngine,
            cipher: None,
            settings,
        }
    }

    pub fn cipher(&self) -> Option<&CipherEngine> {
        self.cipher.as_ref()
    }

    fn require_cipher(&self) -> Result<&CipherEngine> {
        self.cipher.as_ref().ok_or(CoreError::EngineUnavailable)
    }

    pub fn check_status<P: AsRef<Path>>(&self, path: P) -> DatabaseStatus {
        check_status(&self.plain, path)
    }

    pub fn unlock<P: AsRef<Path>>(&self, path: P, passphrase: &Passphrase) -> Result<Connection> {
        unlock(self.require_cipher()?, path, passphrase)
    }

    /// Replace the plain database at `source` with an encrypted copy
    pub fn encrypt<P: AsRef<Path>>(
        &self,
        source: P,
        passphrase: &Passphrase,
        temp_path: Option<&Path>,
    ) -> Result<MigrationReport> {
        self.migrate(Direction::Encrypt, source.as_ref(), passphrase, temp_path)
    }

    /// Replace the encrypted database at `source` with a plain copy
    pub fn decrypt<P: AsRef<Path>>(
        &self,
        source: P,
        passphrase: &Passphrase,
        temp_path: Option<&Path>,
    ) -> Result<MigrationReport> {
        self.migrate(Direction::Decrypt, source.as_ref(), passphrase, temp_path)
    }

    #[tracing::instrument(skip_all, fields(source = %source.display(), direction = %direction))]
    fn migrate(
        &self,
        direction: Direction,
        source: &Path,
        passphrase: &Passphrase,
        temp_path: Option<&Path>,
    ) -> Result<MigrationReport> {
        let cipher = self.require_cipher()?;
        ensure_passphrase(passphrase)?;
        if !source.exists() {
            return Err(CoreError::SourceNotFound(source.to_path_buf()));
        }

        let started_at = Utc::now();
        info!("starting migration");

        let source_conn = match direction {
            Direction::Encrypt => self
                .plain
                .open_existing(source)
                .map_err(|err| CoreError::from(err).into_copy_failure("opening source"))?,
            Direction::Decrypt => unlock(cipher, source, passphrase)?,
        };

        let artifact = match temp_path {
            Some(path) => TempArtifact::claim(path, source),
            None => TempArtifact::beside(source, direction),
        }
        .map_err(|err| err.into_copy_failure("creating temp artifact"))?;

        let dest_conn = match direction {
            Direction::Encrypt => cipher.create(artifact.path(), passphrase),
            Direction::Decrypt => self.plain.create(artifact.path()).map_err(CoreError::from),
        }
        .map_err(|err| err.into_copy_failure("opening destination"))?;

        let summary = self.copy_and_close(source_conn, dest_conn)?;
        self.finalize(&artifact, source)?;
        artifact.promote(source)?;

        let report = MigrationReport {
            direction,
            tables: summary.tables,
            schema_objects: summary.schema_objects,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            tables = report.tables.len(),
            rows = report.total_rows(),
            "migration complete"
        );
        Ok(report)
    }

    fn copy_and_close(&self, source: Connection, mut dest: Connection) -> Result<CopySummary> {
        let summary = copy_database(&source, &mut dest, &self.settings)?;

        dest.close()
            .map_err(|(_, err)| CoreError::from(err).into_copy_failure("closing destination"))?;
        if let Err((_, err)) = source.close() {
            warn!(error = %err, "source connection did not close cleanly");
        }
        Ok(summary)
    }

    fn finalize(&self, artifact: &TempArtifact, source: &Path) -> Result<()> {
        // Sync first: copied permissions may drop the write bit
        if self.settings.sync_before_replace {
            artifact
                .sync()
                .map_err(|err| CoreError::from(err).into_copy_failure("syncing temp artifact"))?;
        }
        if self.settings.preserve_permissions {
            if let Err(err) = artifact.copy_permissions_from(source) {
                warn!(error = %err, "could not copy source permissions");
            }
        }
        Ok(())
    }
}

/// Copy schema and data from `source` into the empty `dest`, committing once at the end
fn copy_database(
    source: &Connection,
    dest: &mut Connection,
    settings: &MigrationSettings,
) -> Result<CopySummary> {
    let objects = catalog::schema_objects(source)
        .map_err(|err| CoreError::from(err).into_copy_failure("reading catalog"))?;
    let (tables, secondary): (Vec<_>, Vec<_>) = objects
        .iter()
        .partition(|object| object.kind == SchemaKind::Table);

    // Rows arrive table by table, so references may point at rows not yet copied
    dest.pragma_update(None, "foreign_keys", false)
        .map_err(|err| copy_failed("disabling foreign key checks", err))?;

    let tx = dest
        .transaction()
        .map_err(|err| CoreError::from(err).into_copy_failure("starting transaction"))?;

    for table in &tables {
        debug!(table = %table.name, "creating table");
        tx.execute_batch(&table.sql)
            .map_err(|err| copy_failed(&format!("creating table {}", table.name), err))?;
    }

    let mut reports = Vec::with_capacity(tables.len());
    for table in &tables {
        let stage = format!("copying table {}", table.name);
        let snapshot =
            TableSnapshot::read(source, &table.name).map_err(|err| copy_failed(&stage, err))?;
        let rows = snapshot
            .insert_into(&tx)
            .map_err(|err| copy_failed(&stage, err))? as u64;

        if settings.verify_row_counts {
            let copied =
                catalog::row_count(&tx, &table.name).map_err(|err| copy_failed(&stage, err))?;
            if copied != snapshot.rows.len() as u64 {
                return Err(CoreError::CopyFailed(format!(
                    "{stage}: expected {} rows, destination has {copied}",
                    snapshot.rows.len()
                )));
            }
        }

        debug!(table = %table.name, rows, "table copied");
        reports.push(TableReport {
            name: table.name.clone(),
            rows,
        });
    }

    let sequences = catalog::read_sequences(source)
        .map_err(|err| copy_failed("reading autoincrement counters", err))?;
    catalog::restore_sequences(&tx, &sequences)
        .map_err(|err| copy_failed("restoring autoincrement counters", err))?;

    // Triggers are created last so they never fire on copied rows
    for object in &secondary {
        debug!(name = %object.name, kind = ?object.kind, "creating schema object");
        tx.execute_batch(&object.sql)
            .map_err(|err| copy_failed(&format!("creating {}", object.name), err))?;
    }

    HeaderFields::read(source)
        .and_then(|header| header.write(&tx))
        .map_err(|err| copy_failed("copying header fields", err))?;

    tx.commit()
        .map_err(|err| copy_failed("committing destination", err))?;

    Ok(CopySummary {
        tables: reports,
        schema_objects: objects.len(),
    })
}

fn copy_failed(stage: &str, err: rusqlite::Error) -> CoreError {
    CoreError::CopyFailed(format!("{stage}: {err}"))
}
