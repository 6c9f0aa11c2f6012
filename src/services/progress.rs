// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resumable upload checkpoints.
//!
//! A small JSON object mapping an export archive's absolute path to the
//! index of the last record that was uploaded (or rejected as a duplicate).

use crate::error::{AppError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

type ProgressMap = BTreeMap<String, u64>;

/// JSON-file-backed progress store.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored index for `export_path`, or 0 if there is none.
    pub fn get_progress(&self, export_path: &str) -> Result<u64> {
        Ok(self.load()?.get(export_path).copied().unwrap_or(0))
    }

    /// Record `index` for `export_path`.
    ///
    /// The entry never moves backwards: a smaller index than the one on disk
    /// leaves the file untouched. The file is replaced atomically.
    pub fn record_progress(&self, export_path: &str, index: u64) -> Result<()> {
        let mut map = self.load()?;
        let entry = map.entry(export_path.to_string()).or_insert(0);
        if *entry > index {
            tracing::debug!(
                export = export_path,
                stored = *entry,
                index,
                "Keeping larger stored progress index"
            );
            return Ok(());
        }
        *entry = index;
        self.store(&map)
    }

    fn load(&self) -> Result<ProgressMap> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ProgressMap::new()),
            Err(e) => return Err(progress_err(&self.path, e)),
        };
        if data.trim().is_empty() {
            return Ok(ProgressMap::new());
        }
        serde_json::from_str(&data).map_err(|e| progress_err(&self.path, e))
    }

    fn store(&self, map: &ProgressMap) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| progress_err(&self.path, e))?;

        // Write next to the target so the rename stays on one filesystem.
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| progress_err(&self.path, e))?;
        serde_json::to_writer(&mut tmp, map).map_err(|e| progress_err(&self.path, e))?;
        tmp.flush().map_err(|e| progress_err(&self.path, e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| progress_err(&self.path, e))?;
        tmp.persist(&self.path)
            .map_err(|e| progress_err(&self.path, e.error))?;
        Ok(())
    }
}

fn progress_err(path: &Path, err: impl std::fmt::Display) -> AppError {
    AppError::Progress(format!("{}: {}", path.display(), err))
}

/// Where to restart, given the stored index and the user's answer.
///
/// The last recorded record is attempted again in case it only partly
/// went through.
pub fn resume_offset(stored: u64, resume: bool) -> u64 {
    if stored > 0 && resume {
        stored - 1
    } else {
        0
    }
}
