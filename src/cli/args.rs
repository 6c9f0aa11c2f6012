// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Command-line argument definitions using clap

use clap::Parser;
use std::path::PathBuf;

/// Upload a Runkeeper activity export to Strava.
///
/// Credentials are read from R2S_STRAVA_CLIENT_ID and
/// R2S_STRAVA_CLIENT_SECRET (a .env file is honoured).
#[derive(Parser, Debug)]
#[command(name = "runkeeper2strava")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Runkeeper export archive (.zip). Prompted for when omitted.
    pub export: Option<PathBuf>,

    /// Answer yes to every confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Print the authorization URL instead of opening a browser
    #[arg(long)]
    pub no_browser: bool,
}
