// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Browser OAuth round trip against a mock token endpoint.
//!
//! The "browser" here is a task that follows the authorization URL's
//! redirect_uri straight back to the local callback receiver.

use runkeeper2strava::config::Config;
use runkeeper2strava::error::AppError;
use runkeeper2strava::services::{oauth, StravaClient};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> Config {
    Config {
        api_base_url: server.uri(),
        oauth_port: 0,
        auth_timeout: Duration::from_secs(5),
        ..Config::test_default()
    }
}

/// Simulate the browser returning from Strava with `extra` appended to the
/// redirect. `{state}` in `extra` is replaced with the real state.
fn browser_returns(extra: &'static str) -> impl FnOnce(&str) {
    move |authorize_url: &str| {
        let url = Url::parse(authorize_url).expect("authorize URL should parse");
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let redirect = Url::parse(&params["redirect_uri"]).expect("redirect_uri should parse");
        assert_eq!(redirect.host_str(), Some("localhost"));
        assert_eq!(redirect.path(), "/exchange_token");
        assert_eq!(params["scope"], "activity:write");

        let target = format!(
            "http://127.0.0.1:{}{}?{}",
            redirect.port().expect("redirect carries a port"),
            redirect.path(),
            extra.replace("{state}", &params["state"])
        );
        tokio::spawn(async move {
            let page = reqwest::get(target).await.expect("callback request");
            assert!(page.status().is_success());
        });
    }
}

async fn mount_token_endpoint(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("code=c0de"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("client_secret=test_secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "fresh_access_token",
            "refresh_token": "fresh_refresh_token",
            "expires_at": 1_800_000_000,
            "athlete": {"id": 42, "firstname": "Ada", "lastname": "Lovelace"}
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_authorize_exchanges_code_for_token() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;
    let config = test_config(&server);
    let client = StravaClient::from_config(&config);

    let grant = oauth::authorize(
        &client,
        &config,
        browser_returns("state={state}&code=c0de&scope=read,activity:write"),
    )
    .await
    .expect("authorization should succeed");

    assert_eq!(grant.access_token, "fresh_access_token");
    assert_eq!(grant.refresh_token.as_deref(), Some("fresh_refresh_token"));
    assert_eq!(grant.athlete.id, 42);
    assert_eq!(grant.athlete.display_name(), "Ada Lovelace");
}

#[tokio::test]
async fn test_authorize_denied_by_user() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 0).await;
    let config = test_config(&server);
    let client = StravaClient::from_config(&config);

    let err = oauth::authorize(
        &client,
        &config,
        browser_returns("state={state}&error=access_denied"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Auth(ref m) if m.contains("not granted")));
}

#[tokio::test]
async fn test_authorize_without_write_scope() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 0).await;
    let config = test_config(&server);
    let client = StravaClient::from_config(&config);

    let err = oauth::authorize(
        &client,
        &config,
        browser_returns("state={state}&code=c0de&scope=read"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Auth(ref m) if m.contains("activity:write")));
}

#[tokio::test]
async fn test_authorize_rejects_foreign_state() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 0).await;
    let config = test_config(&server);
    let client = StravaClient::from_config(&config);

    let err = oauth::authorize(
        &client,
        &config,
        browser_returns("state=forged&code=c0de&scope=activity:write"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Auth(ref m) if m.contains("state mismatch")));
}

#[tokio::test]
async fn test_authorize_token_endpoint_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Bad Request",
            "errors": [{"resource": "Application", "field": "client_id", "code": "invalid"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let config = test_config(&server);
    let client = StravaClient::from_config(&config);

    let err = oauth::authorize(
        &client,
        &config,
        browser_returns("state={state}&code=c0de&scope=activity:write"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Auth(ref m) if m.contains("401")));
}

#[tokio::test]
async fn test_authorize_times_out_without_callback() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 0).await;
    let config = Config {
        auth_timeout: Duration::from_millis(200),
        ..test_config(&server)
    };
    let client = StravaClient::from_config(&config);

    let err = oauth::authorize(&client, &config, |_url: &str| {})
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Auth(ref m) if m.contains("no OAuth callback")));
}

#[tokio::test]
async fn test_authorize_fails_when_port_is_taken() {
    let server = MockServer::start().await;
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = Config {
        oauth_port: occupied.local_addr().unwrap().port(),
        ..test_config(&server)
    };
    let client = StravaClient::from_config(&config);

    let err = oauth::authorize(&client, &config, |_url: &str| {
        panic!("browser must not be opened when the receiver cannot listen")
    })
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Auth(ref m) if m.contains("unable to listen")));
}
