//! HTTP implementation of the auth routes
//!
//! These calls go straight through [`HttpClient`] and never carry the
//! session's bearer token (except logout, which identifies the session it
//! revokes). Keeping them off the request pipeline means a 401 from login or
//! refresh is reported as a rejection instead of triggering another refresh.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, Response, StatusCode};
use rollcall_common::auth::{
    AuthEndpoints, AuthError, Credentials, RefreshRequest, TokenPair, TokenResponse,
};
use rollcall_domain::constants::BEARER_PREFIX;
use rollcall_domain::{ApiConfig, RollcallError};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::http::HttpClient;

#[derive(Debug, Clone)]
pub struct HttpAuthEndpoints {
    http: HttpClient,
    config: ApiConfig,
}

impl HttpAuthEndpoints {
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &ApiConfig) -> Result<Self, RollcallError> {
        Ok(Self::with_client(HttpClient::from_config(config)?, config.clone()))
    }

    pub fn with_client(http: HttpClient, config: ApiConfig) -> Self {
        Self { http, config }
    }

    async fn post<B>(
        &self,
        route: &str,
        body: Option<&B>,
        bearer: Option<&str>,
    ) -> Result<Response, AuthError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = self.config.url_for(route);
        let mut request = self.http.request(Method::POST, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = bearer {
            request = request.header(AUTHORIZATION, format!("{BEARER_PREFIX}{token}"));
        }

        let timeout = self.http.timeout();
        let response = match tokio::time::timeout(timeout, self.http.send(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Err(AuthError::Network(err.to_string())),
            Err(_) => return Err(AuthError::Timeout(timeout)),
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(%url, %status, "auth route refused request");
        Err(classify_status(status, &body))
    }

    async fn token_pair(response: Response) -> Result<TokenPair, AuthError> {
        let payload: TokenResponse = response.json().await.map_err(|e| {
            AuthError::MalformedResponse(format!("Failed to parse token response: {e}"))
        })?;
        TokenPair::try_from(payload)
    }
}

#[async_trait]
impl AuthEndpoints for HttpAuthEndpoints {
    #[instrument(skip_all, fields(email = %credentials.email))]
    async fn login(&self, credentials: &Credentials) -> Result<TokenPair, AuthError> {
        let response = self.post(&self.config.routes.login, Some(credentials), None).await?;
        Self::token_pair(response).await
    }

    #[instrument(skip_all, fields(email = %credentials.email))]
    async fn register(&self, credentials: &Credentials) -> Result<Value, AuthError> {
        let response = self.post(&self.config.routes.register, Some(credentials), None).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::Network(format!("Failed to read response body: {e}")))?;

        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|e| {
            AuthError::MalformedResponse(format!("Failed to parse signup response: {e}"))
        })
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let body = RefreshRequest { refresh_token };
        let response = self.post(&self.config.routes.refresh, Some(&body), None).await?;
        Self::token_pair(response).await
    }

    #[instrument(skip_all)]
    async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        let Some(route) = self.config.routes.logout.as_deref() else {
            return Ok(());
        };
        self.post::<Value>(route, None, Some(access_token)).await?;
        Ok(())
    }
}

fn classify_status(status: StatusCode, body: &str) -> AuthError {
    let message = error_message(status, body);
    if status.is_server_error() {
        AuthError::Server { status: status.as_u16(), message }
    } else {
        AuthError::Rejected { status: status.as_u16(), message }
    }
}

/// Prefer the backend's `message`/`error` field, then the raw body, then the
/// status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(Value::String(message)) = fields.get(key) {
                return message.clone();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        trimmed.to_string()
    }
}
