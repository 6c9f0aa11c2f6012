// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Runkeeper export archive handling: validation, extraction, record
//! enumeration and cleanup of the working directory.

use crate::error::{AppError, Result};
use crate::models::{ActivityRecord, RecordSource};
use serde::Deserialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Summary table Runkeeper puts at the top of the archive.
pub const MANIFEST_FILE: &str = "cardioActivities.csv";

const DISTANCE_MILES_COLUMN: &str = "Distance (mi)";
const DISTANCE_KM_COLUMN: &str = "Distance (km)";

/// Strava will not take more than this many uploads in one sitting.
pub const MAX_RECORDS_PER_RUN: usize = 1000;

/// Check that `path` is an existing, readable ZIP archive.
pub fn validate_archive(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(AppError::Input(format!(
            "{} does not exist or is not a file",
            path.display()
        )));
    }
    let file = File::open(path)?;
    zip::ZipArchive::new(file).map_err(|e| {
        AppError::Input(format!("{} is not a valid ZIP file: {}", path.display(), e))
    })?;
    Ok(())
}

/// Reject runs that are empty or exceed [`MAX_RECORDS_PER_RUN`].
pub fn check_record_count(count: usize) -> Result<()> {
    if count == 0 {
        return Err(AppError::Input(
            "no activities found in the specified file".to_string(),
        ));
    }
    if count > MAX_RECORDS_PER_RUN {
        return Err(AppError::Input(format!(
            "only a maximum of {} activities can be uploaded at once; the file contained {}",
            MAX_RECORDS_PER_RUN, count
        )));
    }
    Ok(())
}

/// Outcome of [`ExportWorkspace::cleanup`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub skipped: usize,
}

/// Working directory an export is extracted into.
#[derive(Debug, Clone)]
pub struct ExportWorkspace {
    dir: PathBuf,
}

impl ExportWorkspace {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Extract `archive` into the working directory, clearing leftovers from
    /// an earlier run first.
    pub fn extract(&self, archive: &Path) -> Result<()> {
        validate_archive(archive)?;
        fs::create_dir_all(&self.dir)?;
        self.cleanup();

        let mut zip = zip::ZipArchive::new(File::open(archive)?).map_err(|e| {
            AppError::Input(format!("{} is not a valid ZIP file: {}", archive.display(), e))
        })?;
        let entries = zip.len();
        zip.extract(&self.dir)
            .map_err(|e| AppError::Input(format!("unable to extract ZIP file: {}", e)))?;

        tracing::info!(
            archive = %archive.display(),
            dir = %self.dir.display(),
            entries,
            "Export extracted"
        );
        Ok(())
    }

    /// Enumerate activity records in export order.
    ///
    /// Uses the manifest when the export has one, otherwise every GPX file
    /// in the archive (sorted by name).
    pub fn records(&self) -> Result<Vec<ActivityRecord>> {
        match self.find_manifest()? {
            Some(manifest) => {
                tracing::info!(manifest = %manifest.display(), "Reading activity manifest");
                read_manifest(&manifest, &self.dir)
            }
            None => {
                tracing::info!("No manifest found, discovering GPX files");
                self.discover_tracks()
            }
        }
    }

    fn find_manifest(&self) -> Result<Option<PathBuf>> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_manifest = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.eq_ignore_ascii_case(MANIFEST_FILE))
                .unwrap_or(false);
            if is_manifest && path.is_file() {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    fn discover_tracks(&self) -> Result<Vec<ActivityRecord>> {
        let mut tracks = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_gpx = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("gpx"))
                .unwrap_or(false);
            if is_gpx && path.is_file() {
                tracks.push(path);
            }
        }
        tracks.sort();

        Ok(tracks
            .into_iter()
            .enumerate()
            .map(|(index, path)| ActivityRecord {
                index,
                source: RecordSource::Track,
                start_time: None,
                activity_type: None,
                distance_miles: None,
                distance_km: None,
                duration: None,
                track_file: Some(path),
            })
            .collect())
    }

    /// Remove everything inside the working directory.
    ///
    /// Entries that cannot be removed (typically still open in another
    /// process) are logged and left behind.
    pub fn cleanup(&self) -> CleanupReport {
        let mut report = CleanupReport::default();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return report,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let result = if path.is_dir() && !path.is_symlink() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            match result {
                Ok(()) => report.removed += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Could not remove file, skipping");
                    report.skipped += 1;
                }
            }
        }

        tracing::debug!(
            removed = report.removed,
            skipped = report.skipped,
            "Working directory cleaned"
        );
        report
    }
}

/// One row of `cardioActivities.csv`; unknown columns are ignored.
#[derive(Debug, Deserialize)]
struct ManifestRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Type")]
    activity_type: String,
    #[serde(rename = "Distance (mi)", default)]
    distance_miles: Option<f64>,
    #[serde(rename = "Distance (km)", default)]
    distance_km: Option<f64>,
    #[serde(rename = "Duration", default)]
    duration: Option<String>,
    #[serde(rename = "GPX File", default)]
    gpx_file: Option<String>,
}

fn read_manifest(path: &Path, base_dir: &Path) -> Result<Vec<ActivityRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|e| AppError::Input(format!("unable to read {}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| AppError::Input(format!("unable to read {}: {}", path.display(), e)))?;
    if !headers
        .iter()
        .any(|h| h == DISTANCE_MILES_COLUMN || h == DISTANCE_KM_COLUMN)
    {
        tracing::warn!(
            manifest = %path.display(),
            "Manifest has no distance column, activities will be uploaded without distance"
        );
    }

    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<ManifestRow>().enumerate() {
        let row = row.map_err(|e| {
            AppError::Input(format!("{} row {}: {}", MANIFEST_FILE, index + 1, e))
        })?;
        records.push(ActivityRecord {
            index,
            source: RecordSource::Manifest,
            start_time: Some(row.date),
            activity_type: Some(row.activity_type),
            distance_miles: row.distance_miles,
            distance_km: row.distance_km,
            duration: row.duration.filter(|d| !d.is_empty()),
            track_file: row
                .gpx_file
                .filter(|f| !f.is_empty())
                .map(|f| base_dir.join(f)),
        });
    }
    Ok(records)
}
