// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Unit and format conversions between Runkeeper and Strava conventions.

use crate::error::{AppError, Result};
use chrono::{NaiveDateTime, Timelike};

/// Statute mile in kilometres.
pub const KM_PER_MILE: f64 = 1.60934;

/// Runkeeper activity names and their Strava equivalents.
const KNOWN_ACTIVITIES: [(&str, &str); 3] =
    [("cycling", "ride"), ("walking", "walk"), ("running", "run")];

/// Layouts accepted for manifest timestamps, tried in order.
const LOCAL_TIME_FORMATS: [&str; 2] = ["%d/%m/%Y %H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse a local (timezone-less) manifest timestamp.
///
/// Runs of whitespace anywhere in the input are treated as a single space.
pub fn parse_local_time(raw: &str) -> Result<NaiveDateTime> {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    LOCAL_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
        .ok_or_else(|| AppError::Format(format!("unrecognized date/time {:?}", raw)))
}

/// Convert `DD/MM/YYYY HH:MM:SS` to ISO 8601 (`YYYY-MM-DDTHH:MM:SS`).
pub fn time_to_iso(raw: &str) -> Result<String> {
    parse_local_time(raw).map(|dt| format_iso(&dt))
}

/// Format a local timestamp as ISO 8601 truncated to whole seconds.
pub fn format_iso(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Miles to metres. No rounding.
pub fn distance_to_meters(miles: f64) -> f64 {
    miles * KM_PER_MILE * 1000.0
}

/// Map a Runkeeper activity name onto the Strava activity type.
pub fn normalize_activity_type(name: &str) -> Result<&'static str> {
    let lowered = name.trim().to_lowercase();
    KNOWN_ACTIVITIES
        .iter()
        .find(|(runkeeper, _)| *runkeeper == lowered)
        .map(|(_, strava)| *strava)
        .ok_or_else(|| AppError::UnknownActivityType(name.to_string()))
}

/// Convert `[[HH:]MM:]SS` to a number of seconds.
pub fn duration_to_seconds(text: &str) -> Result<u64> {
    let parts = text
        .split(':')
        .map(|p| {
            p.trim()
                .parse::<u64>()
                .map_err(|_| AppError::Format(format!("bad duration {:?}", text)))
        })
        .collect::<Result<Vec<_>>>()?;

    let (h, m, s) = match parts.as_slice() {
        [s] => (0, 0, *s),
        [m, s] => (0, *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(AppError::Format(format!("bad duration {:?}", text))),
    };

    h.checked_mul(3600)
        .and_then(|hs| m.checked_mul(60).and_then(|ms| hs.checked_add(ms)))
        .and_then(|hms| hms.checked_add(s))
        .ok_or_else(|| AppError::Format(format!("duration {:?} is out of range", text)))
}

/// "Morning" before noon, "Afternoon" from noon on.
pub fn time_of_day_label(start: &NaiveDateTime) -> &'static str {
    if start.hour() > 11 {
        "Afternoon"
    } else {
        "Morning"
    }
}

/// Strava's capitalized sport type ("ride" -> "Ride").
pub fn sport_type(activity_type: &str) -> String {
    let mut chars = activity_type.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Activity title shown on Strava, e.g. "Afternoon Ride".
pub fn activity_title(start: &NaiveDateTime, activity_type: &str) -> String {
    format!("{} {}", time_of_day_label(start), sport_type(activity_type))
}
