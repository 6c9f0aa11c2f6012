// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Minimal GPX reading: enough to validate a track file and label it.

use crate::error::{AppError, Result};
use crate::models::TrackPayload;
use chrono::{DateTime, NaiveDateTime};
use roxmltree::{Document, Node, NodeType};
use std::fs;
use std::path::Path;

/// Metadata pulled out of a GPX document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSummary {
    /// `<trk><name>`, e.g. "Running 4/13/20 3:33 pm"
    pub name: Option<String>,
    /// Timestamp of the first track point (or of `<metadata><time>`)
    pub start_time: Option<NaiveDateTime>,
    pub point_count: usize,
}

impl TrackSummary {
    /// Runkeeper names tracks "<Activity> <date> <time>"; the first word is
    /// the activity type.
    pub fn activity_type(&self) -> Option<&str> {
        self.name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
    }
}

/// A parsed track together with its raw bytes for upload.
#[derive(Debug, Clone)]
pub struct TrackFile {
    pub summary: TrackSummary,
    pub payload: TrackPayload,
}

impl TrackFile {
    /// Read and parse a GPX file. Any failure is a recoverable
    /// [`AppError::Parse`] scoped to this file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let parse_err = |reason: String| AppError::Parse {
            path: path.display().to_string(),
            reason,
        };

        let bytes = fs::read(path).map_err(|e| parse_err(e.to_string()))?;
        let text = std::str::from_utf8(&bytes).map_err(|e| parse_err(e.to_string()))?;
        let summary = parse_gpx(text).map_err(parse_err)?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "activity.gpx".to_string());

        Ok(Self {
            summary,
            payload: TrackPayload { file_name, bytes },
        })
    }
}

/// Parse GPX text into a [`TrackSummary`].
pub fn parse_gpx(text: &str) -> std::result::Result<TrackSummary, String> {
    let doc = Document::parse(text).map_err(|e| e.to_string())?;
    let root = doc.root_element();
    if root.tag_name().name() != "gpx" {
        return Err(format!(
            "root element is <{}>, expected <gpx>",
            root.tag_name().name()
        ));
    }

    let mut summary = TrackSummary::default();
    let mut metadata_time = None;

    for node in root.descendants() {
        if node.node_type() != NodeType::Element {
            continue;
        }
        match node.tag_name().name() {
            "name" if summary.name.is_none() && parent_is(&node, "trk") => {
                summary.name = node.text().map(|t| t.trim().to_string());
            }
            "time" if metadata_time.is_none() && parent_is(&node, "metadata") => {
                metadata_time = node.text().and_then(parse_gpx_time);
            }
            "trkpt" => {
                summary.point_count += 1;
                if summary.start_time.is_none() {
                    summary.start_time = node
                        .children()
                        .find(|c| c.is_element() && c.tag_name().name() == "time")
                        .and_then(|c| c.text())
                        .and_then(parse_gpx_time);
                }
            }
            _ => {}
        }
    }

    if summary.start_time.is_none() {
        summary.start_time = metadata_time;
    }

    Ok(summary)
}

fn parent_is(node: &Node, tag: &str) -> bool {
    node.parent_element()
        .map(|p| p.tag_name().name() == tag)
        .unwrap_or(false)
}

fn parse_gpx_time(text: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|dt| dt.naive_local())
}

/// Runkeeper names exported tracks after their start, e.g.
/// `2020-04-13-153338.gpx`.
pub fn start_from_file_name(path: &Path) -> Option<NaiveDateTime> {
    let stem = path.file_stem()?.to_str()?;
    NaiveDateTime::parse_from_str(stem, "%Y-%m-%d-%H%M%S").ok()
}
