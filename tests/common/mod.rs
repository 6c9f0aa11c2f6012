// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use runkeeper2strava::error::Result;
use runkeeper2strava::services::{
    ExportWorkspace, MigrationSettings, Migrator, ProgressStore, Prompt, StravaClient,
};
use std::collections::VecDeque;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;
use zip::write::SimpleFileOptions;

pub const ACCESS_TOKEN: &str = "test_access_token";

pub const MANIFEST_HEADER: &str =
    "Activity Id,Date,Type,Route Name,Distance (mi),Duration,Average Pace,GPX File";

/// Scratch area for one migration test: an archive path, a progress file
/// and a working directory, all inside one temp dir.
#[allow(dead_code)]
pub struct TestEnv {
    pub dir: TempDir,
    pub archive: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let archive = dir.path().join("runkeeper-export.zip");
        Self { dir, archive }
    }

    pub fn progress(&self) -> ProgressStore {
        ProgressStore::new(self.dir.path().join("progress.json"))
    }

    pub fn workspace(&self) -> ExportWorkspace {
        ExportWorkspace::new(self.dir.path().join("export"))
    }

    pub fn write_export(&self, files: &[(&str, String)]) {
        write_zip(&self.archive, files);
    }

    /// Build a migrator against `server` that never sleeps.
    pub fn migrator<P: Prompt>(&self, server: &MockServer, prompt: P) -> Migrator<P> {
        Migrator::new(
            test_client(server),
            ACCESS_TOKEN.to_string(),
            self.progress(),
            self.workspace(),
            prompt,
            MigrationSettings {
                upload_delay: Duration::ZERO,
                ..MigrationSettings::default()
            },
        )
    }
}

/// Write a ZIP archive containing `files`.
#[allow(dead_code)]
pub fn write_zip(path: &Path, files: &[(&str, String)]) {
    let mut zip = zip::ZipWriter::new(File::create(path).expect("Failed to create archive"));
    for (name, body) in files {
        zip.start_file(*name, SimpleFileOptions::default())
            .expect("Failed to start zip entry");
        zip.write_all(body.as_bytes())
            .expect("Failed to write zip entry");
    }
    zip.finish().expect("Failed to finish archive");
}

/// A `cardioActivities.csv` with the given data rows.
#[allow(dead_code)]
pub fn manifest(rows: &[String]) -> String {
    let mut out = String::from(MANIFEST_HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    out
}

/// One manifest row. `day` picks the date in April 2020.
#[allow(dead_code)]
pub fn manifest_row(day: u32, activity: &str, gpx_file: &str) -> String {
    format!(
        "id{day},{day:02}/04/2020 08:00:00,{activity},,3.1,28:30,9:11,{gpx_file}",
        day = day,
        activity = activity,
        gpx_file = gpx_file
    )
}

/// A small but valid Runkeeper-style GPX track.
#[allow(dead_code)]
pub fn gpx_track(name: &str, start: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="Runkeeper - http://www.runkeeper.com" xmlns="http://www.topografix.com/GPX/1/1">
<trk>
  <name><![CDATA[{name}]]></name>
  <time>{start}</time>
  <trkseg>
    <trkpt lat="37.373619000" lon="-122.181129000"><ele>108.0</ele><time>{start}</time></trkpt>
    <trkpt lat="37.373700000" lon="-122.181200000"><ele>108.4</ele><time>{start}</time></trkpt>
  </trkseg>
</trk>
</gpx>
"#,
        name = name,
        start = start
    )
}

/// Strava client pointed at the mock server.
#[allow(dead_code)]
pub fn test_client(server: &MockServer) -> StravaClient {
    StravaClient::new("test_client_id".to_string(), "test_secret".to_string())
        .with_base_url(&server.uri())
}

/// Answers prompts from a script and remembers what was asked.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    pub answers: VecDeque<bool>,
    pub asked: Vec<String>,
}

#[allow(dead_code)]
impl ScriptedPrompt {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompt for &mut ScriptedPrompt {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.asked.push(question.to_string());
        Ok(self
            .answers
            .pop_front()
            .expect("Prompt asked more questions than scripted"))
    }
}
