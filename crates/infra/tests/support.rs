#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use rollcall_common::auth::SessionEvent;
use rollcall_common::testing::MockKeychainProvider;
use rollcall_domain::Config;
use rollcall_infra::api::HttpAuthEndpoints;
use rollcall_infra::SessionService;
use serde_json::json;
use tokio::sync::broadcast;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Config pointing every route at `server`, with short timeouts.
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.api.base_url = format!("{}/api", server.uri());
    config.api.timeout_secs = 5;
    config.auth.refresh_timeout_secs = 5;
    config
}

/// A service speaking real HTTP to `server`, persisting into `keychain`.
pub fn service_for(server: &MockServer, keychain: &MockKeychainProvider) -> SessionService {
    let config = config_for(server);
    let endpoints = HttpAuthEndpoints::new(&config.api).expect("auth endpoints");
    SessionService::with_backends(&config, Arc::new(endpoints), Arc::new(keychain.clone()))
        .expect("session service")
}

pub fn token_body(access: &str, refresh: &str) -> serde_json::Value {
    json!({ "accessToken": access, "refreshToken": refresh })
}

/// Mount a login route that always issues `access`/`refresh`.
pub async fn mount_login(server: &MockServer, access: &str, refresh: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(access, refresh)))
        .mount(server)
        .await;
}

/// Mount a refresh route answering after `delay`, expected exactly `times`.
pub async fn mount_refresh(
    server: &MockServer,
    response: ResponseTemplate,
    delay: Duration,
    times: u64,
) {
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(response.set_delay(delay))
        .expect(times)
        .mount(server)
        .await;
}

/// Matches requests that carry no `Authorization` header at all.
pub struct NoAuthorization;

impl Match for NoAuthorization {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

/// Everything broadcast so far, without waiting.
pub fn drain(events: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}
