// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity records read from the export and the requests built from them.

use std::path::PathBuf;

/// Where a record was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    /// A row of `cardioActivities.csv`
    Manifest,
    /// A bare GPX file found in the archive
    Track,
}

/// One exported workout, exactly as Runkeeper wrote it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRecord {
    /// Position in the export (0-based, before any resume offset)
    pub index: usize,
    pub source: RecordSource,
    /// Local start time, e.g. "13/04/2020 15:33:38"
    pub start_time: Option<String>,
    /// Runkeeper activity name ("Running", "Cycling", ...)
    pub activity_type: Option<String>,
    /// Distance in miles (imperial accounts)
    pub distance_miles: Option<f64>,
    /// Distance in kilometres (metric accounts)
    pub distance_km: Option<f64>,
    /// Formatted duration, e.g. "1:02:05"
    pub duration: Option<String>,
    /// Extracted GPX file, if the workout has one
    pub track_file: Option<PathBuf>,
}

impl ActivityRecord {
    /// Human-readable label used in log lines.
    pub fn label(&self) -> String {
        match &self.track_file {
            Some(path) => path.display().to_string(),
            None => format!("manifest row {}", self.index + 1),
        }
    }
}

/// GPX payload attached to an upload.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPayload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Strava-shaped request derived from an [`ActivityRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    /// Title, e.g. "Afternoon Ride"
    pub name: String,
    /// Normalized Strava type ("ride", "walk", "run")
    pub activity_type: &'static str,
    /// ISO 8601 local start time, whole seconds
    pub start_date_local: String,
    pub elapsed_seconds: u64,
    pub distance_meters: f64,
    pub trainer: bool,
    pub commute: bool,
    pub description: String,
    /// Lets Strava recognise re-uploads of the same record
    pub external_id: String,
    pub track: Option<TrackPayload>,
}
