// src/file_ops.rs
//! Temp artifact ownership and the final atomic replace
//!
//! A [`TempArtifact`] lives next to the database it will replace, so the
//! promotion is a same-filesystem rename. Until [`TempArtifact::promote`]
//! succeeds, dropping the artifact deletes it along with any SQLite sidecar
//! files (`-journal`, `-wal`, `-shm`).

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::{debug, warn};

use crate::consts::{SIDECAR_SUFFIXES, TEMP_SUFFIX};
use crate::enums::Direction;
use crate::error::{CoreError, Result};

/// Directory holding `path`; `.` for a bare file name
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[derive(Debug)]
pub struct TempArtifact {
    path: Option<TempPath>,
    /// Sidecar files this artifact may leave behind and must clean up
    sidecars: Vec<PathBuf>,
}

fn all_sidecars(path: &Path) -> Vec<PathBuf> {
    SIDECAR_SUFFIXES.iter().map(|suffix| sidecar(path, suffix)).collect()
}

impl TempArtifact {
    /// Synthesize a uniquely named sibling of `source`, e.g. `.app.db.encrypt-XXXXXX.tmp`
    pub fn beside(source: &Path, direction: Direction) -> Result<Self> {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "database".to_owned());
        let prefix = format!(".{file_name}.{direction}-");

        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(parent_dir(source))?;
        let path = file.into_temp_path();

        debug!(temp = %path.display(), "temp artifact created");
        Ok(Self {
            sidecars: all_sidecars(&path),
            path: Some(path),
        })
    }

    /// Take ownership of a caller-chosen path. It must not exist yet: an
    /// existing file is never adopted, and therefore never deleted.
    pub fn claim(path: &Path, source: &Path) -> Result<Self> {
        if path == source {
            return Err(CoreError::TempPathOccupied(path.to_path_buf()));
        }
        if parent_dir(path) != parent_dir(source) {
            warn!(
                temp = %path.display(),
                source = %source.display(),
                "temp path is outside the source directory; the final rename may not be atomic"
            );
        }

        // Sidecars that predate the claim belong to someone else
        let sidecars = all_sidecars(path)
            .into_iter()
            .filter(|side| !side.exists())
            .collect();

        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(CoreError::TempPathOccupied(path.to_path_buf()));
            }
            Err(err) => return Err(err.into()),
        }

        let temp = match TempPath::try_from_path(path) {
            Ok(temp) => temp,
            Err(err) => {
                if let Err(remove_err) = fs::remove_file(path) {
                    warn!(temp = %path.display(), error = %remove_err, "could not remove temp artifact");
                }
                return Err(err.into());
            }
        };

        Ok(Self {
            path: Some(temp),
            sidecars,
        })
    }

    pub fn path(&self) -> &Path {
        match &self.path {
            Some(path) => path,
            None => Path::new(""),
        }
    }

    /// Flush the finished copy to stable storage
    pub fn sync(&self) -> io::Result<()> {
        OpenOptions::new().write(true).open(self.path())?.sync_all()
    }

    /// Give the artifact the permission bits of `source`
    pub fn copy_permissions_from(&self, source: &Path) -> io::Result<()> {
        let permissions = fs::metadata(source)?.permissions();
        fs::set_permissions(self.path(), permissions)
    }

    /// Rename over `target` in one filesystem operation.
    ///
    /// On failure the artifact is kept on disk and its path is reported in
    /// [`CoreError::ReplaceFailed`] so the caller can retry or restore.
    pub fn promote(mut self, target: &Path) -> Result<()> {
        let Some(path) = self.path.take() else {
            return Ok(());
        };
        let temp = path.to_path_buf();

        match path.persist(target) {
            Ok(()) => {
                debug!(temp = %temp.display(), target = %target.display(), "temp artifact promoted");
                sync_dir(parent_dir(target));
                Ok(())
            }
            Err(err) => {
                // Dropping `err.path` would delete the only complete copy
                if let Err(keep_err) = err.path.keep() {
                    warn!(temp = %temp.display(), error = %keep_err.error, "could not keep temp artifact");
                }
                Err(CoreError::ReplaceFailed {
                    temp,
                    target: target.to_path_buf(),
                    source: err.error,
                })
            }
        }
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };

        for side in &self.sidecars {
            match fs::remove_file(side) {
                Ok(()) => debug!(path = %side.display(), "removed sidecar"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => warn!(path = %side.display(), error = %err, "could not remove sidecar"),
            }
        }

        let shown = path.display().to_string();
        match path.close() {
            Ok(()) => debug!(temp = %shown, "temp artifact removed"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(temp = %shown, error = %err, "could not remove temp artifact"),
        }
    }
}

/// Make a rename durable. Best effort; only meaningful on unix.
fn sync_dir(dir: &Path) {
    #[cfg(unix)]
    if let Err(err) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        debug!(dir = %dir.display(), error = %err, "directory sync skipped");
    }
    #[cfg(not(unix))]
    let _ = dir;
}
