// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Browser-based OAuth authorization: `state` nonces, the local callback
//! round trip and callback validation.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::OAuthCallback;
use crate::services::callback::CallbackReceiver;
use crate::services::strava::{StravaClient, TokenExchangeResponse, WRITE_SCOPE};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use subtle::ConstantTimeEq;

/// Generate a random, URL-safe `state` value for one authorization round trip.
pub fn generate_state() -> Result<String> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("system RNG unavailable")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Check the redirect and return the authorization code.
///
/// Denied access, a foreign `state`, a missing code, or a grant without
/// `activity:write` all abort before anything is uploaded.
pub fn verify_callback<'a>(callback: &'a OAuthCallback, expected_state: &str) -> Result<&'a str> {
    if let Some(error) = callback.error() {
        tracing::warn!(error = %error, "OAuth error from Strava");
        return Err(if error == "access_denied" {
            AppError::Auth("access to Strava was not granted".to_string())
        } else {
            AppError::Auth(format!("Strava returned error {:?}", error))
        });
    }

    let state = callback.state().unwrap_or("");
    if !bool::from(state.as_bytes().ct_eq(expected_state.as_bytes())) {
        tracing::error!("OAuth state mismatch, ignoring callback");
        return Err(AppError::Auth(
            "OAuth state mismatch; the callback did not come from this run".to_string(),
        ));
    }

    let code = callback
        .code()
        .ok_or_else(|| AppError::Auth("callback carried no authorization code".to_string()))?;

    if !callback.has_scope(WRITE_SCOPE) {
        return Err(AppError::Auth(format!("{} permission missing", WRITE_SCOPE)));
    }

    Ok(code)
}

/// Run the full authorization round trip and return the token grant.
///
/// `open_url` is handed the authorization URL once the callback receiver is
/// listening; it is expected to send the user there.
pub async fn authorize<F>(
    client: &StravaClient,
    config: &Config,
    open_url: F,
) -> Result<TokenExchangeResponse>
where
    F: FnOnce(&str),
{
    let state = generate_state()?;

    let mut receiver = CallbackReceiver::on_port(config.oauth_port);
    let addr = receiver.listen().await?;
    let pending = receiver.spawn();

    let redirect_uri = format!("http://localhost:{}/exchange_token", addr.port());
    open_url(&client.authorize_url(&redirect_uri, &state));

    let callback = pending.wait(config.auth_timeout).await?;
    let code = verify_callback(&callback, &state)?;

    tracing::info!("Authorization code received, obtaining access token");
    let grant = client.exchange_code(code).await?;
    tracing::info!(athlete_id = grant.athlete.id, "Access token obtained");
    Ok(grant)
}
