// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! runkeeper2strava
//!
//! Authorizes against Strava, then uploads every workout in a Runkeeper
//! activity export, resuming where an earlier run stopped.

use clap::Parser;
use runkeeper2strava::{
    cli::{browser::open_browser, progress::upload_progress_bar, prompts, Cli, TerminalPrompt},
    config::Config,
    error::{AppError, Result},
    services::{
        oauth, AutoConfirm, ExportWorkspace, MigrationSettings, Migrator, ProgressStore,
        RunSummary, StravaClient,
    },
};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Set R2S_STRAVA_CLIENT_ID and R2S_STRAVA_CLIENT_SECRET (or put them in .env).");
            return ExitCode::from(AppError::from(e).exit_code());
        }
    };

    init_logging(&config.data_dir, &config.error_log_file());
    tracing::info!(data_dir = %config.data_dir.display(), "Starting runkeeper2strava");

    match run(cli, config).await {
        Ok(summary) => {
            println!(
                "Done: {} uploaded, {} already on Strava, {} skipped.",
                summary.created, summary.duplicates, summary.skipped
            );
            ExitCode::SUCCESS
        }
        Err(AppError::Aborted) => {
            println!("Nothing uploaded.");
            ExitCode::from(AppError::Aborted.exit_code())
        }
        Err(e) => {
            tracing::error!(error = %e, "Migration failed");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli, config: Config) -> Result<RunSummary> {
    let client = StravaClient::from_config(&config);

    let no_browser = cli.no_browser;
    let grant = oauth::authorize(&client, &config, |url| {
        println!("Authorize runkeeper2strava on Strava by visiting:\n\n    {}\n", url);
        if !no_browser {
            if let Err(e) = open_browser(url) {
                tracing::warn!(error = %e, "Could not open a browser");
            }
        }
    })
    .await?;
    println!("Authorized as {}.", grant.athlete.display_name());

    let export = match cli.export {
        Some(path) => path,
        None => prompts::ask_export_path()?,
    };

    let settings = MigrationSettings {
        upload_delay: config.upload_delay,
        ..MigrationSettings::default()
    };
    let progress = ProgressStore::new(config.progress_file());
    let workspace = ExportWorkspace::new(config.work_dir());

    if cli.yes {
        Migrator::new(
            client,
            grant.access_token,
            progress,
            workspace,
            AutoConfirm(true),
            settings,
        )
        .with_progress_bar(upload_progress_bar())
        .run(&export)
        .await
    } else {
        Migrator::new(
            client,
            grant.access_token,
            progress,
            workspace,
            TerminalPrompt,
            settings,
        )
        .with_progress_bar(upload_progress_bar())
        .run(&export)
        .await
    }
}

/// Human-readable logs on stderr; warnings and errors also go to `error_log`.
fn init_logging(data_dir: &Path, error_log: &Path) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("runkeeper2strava=info,warn"));

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file = fs::create_dir_all(data_dir)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(error_log));
    let error_file = match file {
        Ok(file) => Some(
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(false)
                .flatten_event(true)
                .with_writer(Mutex::new(file))
                .with_filter(LevelFilter::WARN),
        ),
        Err(e) => {
            eprintln!("Warning: cannot open {}: {}", error_log.display(), e);
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(error_file)
        .init();
}
