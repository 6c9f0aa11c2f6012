// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for authorizing and creating activities.
//!
//! Handles:
//! - Authorization URL construction
//! - Code-for-token exchange
//! - GPX uploads (multipart) and manual activity creation (form)
//! - Duplicate detection on rejected uploads

use crate::config::{Config, DEFAULT_API_BASE_URL};
use crate::error::{AppError, Result};
use crate::models::UploadRequest;
use reqwest::{multipart, StatusCode};
use serde::Deserialize;

/// Strava's browser-facing authorization endpoint.
pub const AUTHORIZE_URL: &str = "https://www.strava.com/oauth/authorize";

/// Scope the migration needs.
pub const WRITE_SCOPE: &str = "activity:write";

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a new Strava client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            client_id,
            client_secret,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.strava_client_id.clone(),
            config.strava_client_secret.clone(),
        )
        .with_base_url(&config.api_base_url)
    }

    /// Point the client at another API root (a mock server in tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL the user is sent to in order to grant `activity:write`.
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{}?\
             client_id={}&\
             response_type=code&\
             redirect_uri={}&\
             approval_prompt=auto&\
             scope={}&\
             state={}",
            AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(WRITE_SCOPE),
            urlencoding::encode(state)
        )
    }

    /// Exchange authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenExchangeResponse> {
        let response = self
            .http
            .post(format!("{}/oauth/token", self.base_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Token exchange failed: {}", e)))?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Strava token exchange failed");
            return Err(AppError::Auth(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to parse token response: {}", e)))
    }

    /// Send one converted record: a GPX upload if it carries a track,
    /// a manual activity otherwise.
    pub async fn upload(&self, access_token: &str, request: &UploadRequest) -> Result<UploadOutcome> {
        if request.track.is_some() {
            self.upload_track(access_token, request).await
        } else {
            self.create_activity(access_token, request).await
        }
    }

    /// POST /uploads with the GPX file and its metadata.
    pub async fn upload_track(
        &self,
        access_token: &str,
        request: &UploadRequest,
    ) -> Result<UploadOutcome> {
        let track = request.track.as_ref().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("upload_track called without a track"))
        })?;

        let file = multipart::Part::bytes(track.bytes.clone())
            .file_name(track.file_name.clone())
            .mime_str("application/gpx+xml")?;

        let form = multipart::Form::new()
            .part("file", file)
            .text("name", request.name.clone())
            .text("description", request.description.clone())
            .text("trainer", flag(request.trainer))
            .text("commute", flag(request.commute))
            .text("data_type", "gpx")
            .text("external_id", request.external_id.clone())
            .text("activity_type", request.activity_type);

        let response = self
            .http
            .post(format!("{}/uploads", self.base_url))
            .bearer_auth(access_token)
            .multipart(form)
            .send()
            .await?;

        self.check_upload_response(response).await
    }

    /// POST /activities for a record without a track.
    pub async fn create_activity(
        &self,
        access_token: &str,
        request: &UploadRequest,
    ) -> Result<UploadOutcome> {
        let sport_type = crate::convert::sport_type(request.activity_type);
        let form = [
            ("name", request.name.clone()),
            ("type", sport_type.clone()),
            ("sport_type", sport_type),
            ("start_date_local", request.start_date_local.clone()),
            ("elapsed_time", request.elapsed_seconds.to_string()),
            ("distance", request.distance_meters.to_string()),
            ("description", request.description.clone()),
            ("trainer", flag(request.trainer)),
            ("commute", flag(request.commute)),
        ];

        let response = self
            .http
            .post(format!("{}/activities", self.base_url))
            .bearer_auth(access_token)
            .form(&form)
            .send()
            .await?;

        self.check_upload_response(response).await
    }

    async fn check_upload_response(&self, response: reqwest::Response) -> Result<UploadOutcome> {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        classify_upload_response(status, &body)
    }
}

fn flag(value: bool) -> String {
    let v = if value { "1" } else { "0" };
    v.to_string()
}

/// Result of a single accepted upload call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// 201; `id` is the upload or activity id when Strava returned one.
    Created { id: Option<u64> },
    /// 400 that Strava flagged as a duplicate of an existing activity.
    Duplicate { message: String },
}

/// Interpret an upload response.
///
/// 201 is success, a 400 whose error body reports a duplicate is benign,
/// anything else is a fatal [`AppError::Upload`].
pub fn classify_upload_response(status: u16, body: &str) -> Result<UploadOutcome> {
    match status {
        201 => {
            let id = serde_json::from_str::<CreatedBody>(body)
                .ok()
                .and_then(|b| b.id);
            Ok(UploadOutcome::Created { id })
        }
        400 => match duplicate_message(body) {
            Some(message) => Ok(UploadOutcome::Duplicate { message }),
            None => Err(AppError::Upload {
                status,
                body: body.to_string(),
            }),
        },
        _ => Err(AppError::Upload {
            status,
            body: body.to_string(),
        }),
    }
}

/// Duplicate marker in a Strava error body, if any.
///
/// Uploads report `{"error": "... duplicate of activity 123"}`; the
/// activities endpoint reports `{"errors": [{"code": "duplicate", ...}]}`.
fn duplicate_message(body: &str) -> Option<String> {
    let parsed: StravaErrorBody = serde_json::from_str(body).ok()?;

    if let Some(error) = parsed.error.as_deref() {
        if error.to_lowercase().contains("duplicate") {
            return Some(error.to_string());
        }
    }

    parsed
        .errors
        .iter()
        .find(|fault| fault.code.to_lowercase().contains("duplicate"))
        .map(|fault| {
            parsed
                .message
                .clone()
                .unwrap_or_else(|| format!("{} {}", fault.resource, fault.code))
        })
}

#[derive(Debug, Deserialize)]
struct CreatedBody {
    id: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StravaErrorBody {
    message: Option<String>,
    error: Option<String>,
    errors: Vec<StravaFault>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StravaFault {
    resource: String,
    code: String,
}

/// Token exchange response from Strava OAuth (includes athlete info).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchangeResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub athlete: StravaAthlete,
}

/// Athlete info from OAuth token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaAthlete {
    pub id: u64,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
}

impl StravaAthlete {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
            .trim()
            .to_string()
    }
}
