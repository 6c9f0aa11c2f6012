// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod oauth;

pub use activity::{ActivityRecord, RecordSource, TrackPayload, UploadRequest};
pub use oauth::OAuthCallback;
