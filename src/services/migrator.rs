// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Upload orchestration for one export archive.
//!
//! Strictly sequential: extract, enumerate, apply the resume offset, then
//! convert and upload one record at a time with a fixed pause in between.
//! Every failure is fatal except unreadable tracks, unknown activity types
//! and malformed fields (the record is skipped) and duplicate rejections
//! (the record counts as done).

use crate::convert::{
    activity_title, distance_to_meters, duration_to_seconds, format_iso,
    normalize_activity_type, parse_local_time,
};
use crate::error::{AppError, Result};
use crate::models::{ActivityRecord, UploadRequest};
use crate::services::export::{check_record_count, ExportWorkspace};
use crate::services::gpx::{start_from_file_name, TrackFile};
use crate::services::progress::{resume_offset, ProgressStore};
use crate::services::strava::{StravaClient, UploadOutcome};
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Duration;

/// Description attached to every migrated activity.
pub const DEFAULT_DESCRIPTION: &str = "Migrated from Runkeeper by runkeeper2strava";

/// Rough wall-clock cost of one record, used for the up-front estimate.
pub const ESTIMATED_SECS_PER_RECORD: u64 = 10;

/// Yes/no questions asked during a run.
pub trait Prompt {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Answers every question the same way (`--yes`, tests).
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Prompt for AutoConfirm {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        tracing::debug!(question, answer = self.0, "Auto-answering prompt");
        Ok(self.0)
    }
}

/// Knobs for a migration run.
#[derive(Debug, Clone)]
pub struct MigrationSettings {
    /// Fixed pause between uploads
    pub upload_delay: Duration,
    pub description: String,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            upload_delay: Duration::from_secs(crate::config::DEFAULT_UPLOAD_DELAY_SECS),
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }
}

/// What a completed run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// First record index processed in this run
    pub start_index: u64,
    /// Records considered after the resume offset
    pub total: usize,
    pub created: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

/// Drives the migration of one export archive.
pub struct Migrator<P: Prompt> {
    client: StravaClient,
    access_token: String,
    progress: ProgressStore,
    workspace: ExportWorkspace,
    prompt: P,
    settings: MigrationSettings,
    progress_bar: ProgressBar,
}

impl<P: Prompt> Migrator<P> {
    pub fn new(
        client: StravaClient,
        access_token: String,
        progress: ProgressStore,
        workspace: ExportWorkspace,
        prompt: P,
        settings: MigrationSettings,
    ) -> Self {
        Self {
            client,
            access_token,
            progress,
            workspace,
            prompt,
            settings,
            progress_bar: ProgressBar::hidden(),
        }
    }

    /// Report per-record progress on `bar` (hidden by default).
    pub fn with_progress_bar(mut self, bar: ProgressBar) -> Self {
        self.progress_bar = bar;
        self
    }

    /// Migrate every remaining record of `export_path`.
    ///
    /// The working directory is cleaned afterwards whether or not the run
    /// succeeded.
    pub async fn run(&mut self, export_path: &Path) -> Result<RunSummary> {
        let result = self.migrate(export_path).await;
        let report = self.workspace.cleanup();
        if report.skipped > 0 {
            tracing::warn!(
                skipped = report.skipped,
                "Some extracted files could not be removed"
            );
        }
        result
    }

    async fn migrate(&mut self, export_path: &Path) -> Result<RunSummary> {
        crate::services::export::validate_archive(export_path)?;
        let export_key = export_key(export_path)?;

        let stored = self.progress.get_progress(&export_key)?;
        let resume = stored > 0
            && self.prompt.confirm(
                "It looks like you already started uploading activities from this export. \
                 Continue from where you left off?",
            )?;
        let offset = resume_offset(stored, resume);
        tracing::info!(export = %export_key, stored, offset, "Resume point computed");

        self.workspace.extract(export_path)?;
        let records: Vec<ActivityRecord> = self
            .workspace
            .records()?
            .into_iter()
            .skip(offset as usize)
            .collect();
        check_record_count(records.len())?;

        let minutes = records.len() as u64 * ESTIMATED_SECS_PER_RECORD / 60;
        if !self.prompt.confirm(&format!(
            "Found {} activities to upload. This will take about {} minutes. Continue?",
            records.len(),
            minutes
        ))? {
            return Err(AppError::Aborted);
        }

        let mut summary = RunSummary {
            start_index: offset,
            total: records.len(),
            ..RunSummary::default()
        };

        self.progress_bar.set_length(records.len() as u64);
        tracing::info!(count = records.len(), "Beginning upload");

        for (i, record) in records.iter().enumerate() {
            let position = offset + i as u64;
            self.progress_bar.set_position(i as u64);

            let request = match build_upload_request(record, &self.settings.description) {
                Ok(request) => request,
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(record = %record.label(), error = %e, "Skipping record");
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.client.upload(&self.access_token, &request).await {
                Ok(UploadOutcome::Created { id }) => {
                    tracing::info!(record = %record.label(), name = %request.name, upload_id = ?id, "Uploaded");
                    summary.created += 1;
                }
                Ok(UploadOutcome::Duplicate { message }) => {
                    tracing::warn!(record = %record.label(), message = %message, "Duplicate activity, skipping");
                    summary.duplicates += 1;
                }
                Err(AppError::Upload { status, body }) => {
                    tracing::error!(record = %record.label(), status, body = %body, "Upload failed");
                    return Err(AppError::Upload { status, body });
                }
                Err(e) => return Err(e),
            }

            self.progress.record_progress(&export_key, position)?;

            if i + 1 < records.len() && !self.settings.upload_delay.is_zero() {
                tokio::time::sleep(self.settings.upload_delay).await;
            }
        }

        self.progress_bar.finish_and_clear();
        tracing::info!(
            created = summary.created,
            duplicates = summary.duplicates,
            skipped = summary.skipped,
            "Upload complete"
        );
        Ok(summary)
    }
}

/// Key under which progress for `export_path` is stored.
pub fn export_key(export_path: &Path) -> Result<String> {
    let absolute = export_path.canonicalize().map_err(|e| {
        AppError::Input(format!("{}: {}", export_path.display(), e))
    })?;
    Ok(absolute.to_string_lossy().into_owned())
}

/// Convert one exported record into a Strava request.
///
/// Manifest values win; the track file fills in whatever the manifest
/// lacks (activity type from the track name, start from the file name or
/// else the first point).
pub fn build_upload_request(record: &ActivityRecord, description: &str) -> Result<UploadRequest> {
    let track = record
        .track_file
        .as_ref()
        .map(TrackFile::load)
        .transpose()?;

    let raw_type = record
        .activity_type
        .as_deref()
        .or_else(|| track.as_ref().and_then(|t| t.summary.activity_type()))
        .ok_or_else(|| AppError::UnknownActivityType("<none>".to_string()))?;
    let activity_type = normalize_activity_type(raw_type)?;

    let start = match record.start_time.as_deref() {
        Some(raw) => parse_local_time(raw)?,
        // File names carry local time; track points are UTC.
        None => record
            .track_file
            .as_deref()
            .and_then(start_from_file_name)
            .or_else(|| track.as_ref().and_then(|t| t.summary.start_time))
            .ok_or_else(|| {
                AppError::Format(format!("no start time for {}", record.label()))
            })?,
    };

    let elapsed_seconds = record
        .duration
        .as_deref()
        .map(duration_to_seconds)
        .transpose()?
        .unwrap_or(0);
    let distance_meters = record
        .distance_miles
        .map(distance_to_meters)
        .or_else(|| record.distance_km.map(|km| km * 1000.0))
        .unwrap_or(0.0);

    Ok(UploadRequest {
        name: activity_title(&start, activity_type),
        activity_type,
        start_date_local: format_iso(&start),
        elapsed_seconds,
        distance_meters,
        trainer: false,
        commute: false,
        description: description.to_string(),
        external_id: format!("uploaded_{}", record.index),
        track: track.map(|t| t.payload),
    })
}
