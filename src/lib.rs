// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! runkeeper2strava: move a Runkeeper activity export onto Strava
//!
//! The crate authorizes against Strava through a local OAuth redirect,
//! reads a Runkeeper export archive, converts each workout to Strava's
//! conventions and uploads them one at a time, recording progress so an
//! interrupted run can pick up where it stopped.

pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod models;
pub mod services;

pub use error::{AppError, Result};
