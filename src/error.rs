// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.

use crate::config::ConfigError;

/// Every failure the migration can hit.
///
/// Most variants are fatal and end the run. `Parse`, `UnknownActivityType`
/// and `Format` are scoped to a single record and only cause that record to
/// be skipped (see [`AppError::is_recoverable`]).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("Invalid export: {0}")]
    Input(String),

    #[error("Unreadable track file {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Unknown activity type: {0}")]
    UnknownActivityType(String),

    #[error("Unexpected format: {0}")]
    Format(String),

    #[error("Upload failed with HTTP {status}: {body}")]
    Upload { status: u16, body: String },

    #[error("Progress file error: {0}")]
    Progress(String),

    #[error("Aborted by user")]
    Aborted,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for errors that only invalidate the current record.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Parse { .. } | AppError::UnknownActivityType(_) | AppError::Format(_)
        )
    }

    /// Process exit code reported by the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) => 2,
            AppError::Aborted => 130,
            _ => 1,
        }
    }
}

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, AppError>;
