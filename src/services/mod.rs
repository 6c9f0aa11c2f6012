// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod callback;
pub mod export;
pub mod gpx;
pub mod migrator;
pub mod oauth;
pub mod progress;
pub mod strava;

pub use callback::{CallbackReceiver, PendingCallback, ReceiverState};
pub use export::ExportWorkspace;
pub use migrator::{AutoConfirm, MigrationSettings, Migrator, Prompt, RunSummary};
pub use progress::ProgressStore;
pub use strava::{StravaClient, UploadOutcome};
