// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Configuration loaded from environment variables (and an optional `.env`).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default Strava REST API root.
pub const DEFAULT_API_BASE_URL: &str = "https://www.strava.com/api/v3";

/// Port the OAuth redirect comes back to.
pub const DEFAULT_OAUTH_PORT: u16 = 8556;

/// Pause between uploads, in seconds.
pub const DEFAULT_UPLOAD_DELAY_SECS: u64 = 10;

/// How long to wait for the browser to come back with a code.
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 300;

const CLIENT_ID_VAR: &str = "R2S_STRAVA_CLIENT_ID";
const CLIENT_SECRET_VAR: &str = "R2S_STRAVA_CLIENT_SECRET";

/// Runtime configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Strava OAuth client ID
    pub strava_client_id: String,
    /// Strava OAuth client secret
    pub strava_client_secret: String,
    /// Strava REST API root (overridable for testing)
    pub api_base_url: String,
    /// Local port for the OAuth callback
    pub oauth_port: u16,
    /// Fixed pause between uploads
    pub upload_delay: Duration,
    /// Maximum wait for the OAuth callback
    pub auth_timeout: Duration,
    /// Holds progress.json, errors.log and the extraction directory
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Only the two Strava credentials are required; everything else falls
    /// back to a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            strava_client_id: required(CLIENT_ID_VAR)?,
            strava_client_secret: required(CLIENT_SECRET_VAR)?,
            api_base_url: env::var("R2S_API_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            oauth_port: parse_or("R2S_OAUTH_PORT", DEFAULT_OAUTH_PORT)?,
            upload_delay: Duration::from_secs(parse_or(
                "R2S_UPLOAD_DELAY_SECS",
                DEFAULT_UPLOAD_DELAY_SECS,
            )?),
            auth_timeout: Duration::from_secs(parse_or(
                "R2S_AUTH_TIMEOUT_SECS",
                DEFAULT_AUTH_TIMEOUT_SECS,
            )?),
            data_dir: env::var_os("R2S_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_data_dir),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            strava_client_id: "test_client_id".to_string(),
            strava_client_secret: "test_secret".to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            oauth_port: DEFAULT_OAUTH_PORT,
            upload_delay: Duration::ZERO,
            auth_timeout: Duration::from_secs(5),
            data_dir: default_data_dir(),
        }
    }

    pub fn progress_file(&self) -> PathBuf {
        self.data_dir.join("progress.json")
    }

    pub fn error_log_file(&self) -> PathBuf {
        self.data_dir.join("errors.log")
    }

    /// Directory the export archive is extracted into.
    pub fn work_dir(&self) -> PathBuf {
        self.data_dir.join("export")
    }
}

fn default_data_dir() -> PathBuf {
    env::temp_dir().join("runkeeper2strava")
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, v.clone())),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment variables are process-global; keep every env mutation in
    // this one test so parallel tests don't observe each other.
    #[test]
    fn test_config_from_env() {
        env::remove_var(CLIENT_ID_VAR);
        env::set_var(CLIENT_SECRET_VAR, "test_secret");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing(CLIENT_ID_VAR))
        ));

        env::set_var(CLIENT_ID_VAR, "   ");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing(CLIENT_ID_VAR))
        ));

        env::set_var(CLIENT_ID_VAR, "test_id");
        env::set_var("R2S_OAUTH_PORT", "not-a-port");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("R2S_OAUTH_PORT", _))
        ));
        env::remove_var("R2S_OAUTH_PORT");

        env::set_var("R2S_API_BASE_URL", "http://127.0.0.1:9999/api/");
        let config = Config::from_env().expect("Config should load");
        env::remove_var("R2S_API_BASE_URL");

        assert_eq!(config.strava_client_id, "test_id");
        assert_eq!(config.strava_client_secret, "test_secret");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9999/api");
        assert_eq!(config.oauth_port, 8556);
        assert_eq!(config.upload_delay, Duration::from_secs(10));
    }
}
