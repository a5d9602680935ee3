//! Authenticated request pipeline
//!
//! Every call to the backend outside the auth routes goes through
//! [`ApiClient`]. It attaches the session's current access token, and when
//! the backend answers `401` it asks the [`RefreshCoordinator`] for a fresh
//! token and re-issues the identical request exactly once.
//!
//! Expiry is recognised by status `401` alone; the body is not inspected.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use rollcall_common::auth::{RefreshCoordinator, SessionState};
use rollcall_domain::constants::BEARER_PREFIX;
use rollcall_domain::ApiConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::errors::ApiError;
use crate::http::HttpClient;

/// A request as the caller describes it, before authentication is applied.
///
/// Kept whole so the pipeline can replay it after a refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Route relative to the API base URL (absolute URLs pass through)
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), body: None, headers: HeaderMap::new() }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    /// `ApiError::Client` if the body cannot be serialized
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Client(format!("Failed to serialize body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// A fully-read HTTP response, any status.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    /// `ApiError::Decode` if the body is not the expected shape
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ApiError::Decode(format!("Failed to parse response: {e}")))
    }
}

/// API client that keeps the session authenticated
#[derive(Clone)]
pub struct ApiClient {
    http_client: HttpClient,
    config: ApiConfig,
    session: Arc<SessionState>,
    refresher: Arc<RefreshCoordinator>,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HttpClient cannot be created
    pub fn new(
        config: ApiConfig,
        session: Arc<SessionState>,
        refresher: Arc<RefreshCoordinator>,
    ) -> Result<Self, ApiError> {
        let http_client = HttpClient::from_config(&config)
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {e}")))?;

        Ok(Self { http_client, config, session, refresher })
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    /// Send a request, refreshing the session once if it is rejected.
    ///
    /// Any status is returned as-is. A `401` triggers one refresh and one
    /// replay; if the refresh fails the original `401` is returned and the
    /// session has already been invalidated.
    ///
    /// # Errors
    ///
    /// Transport failures only (`Network`, `Timeout`)
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let token = self.session.access_token();
        let response = self.execute(&request, token.as_deref()).await?;

        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("Request rejected with 401, refreshing session");
        let refreshed = match token.as_deref() {
            Some(rejected) => self.refresher.ensure_fresh_token_after(rejected).await,
            None => self.refresher.ensure_fresh_token().await,
        };

        match refreshed {
            Ok(fresh) => {
                debug!("Replaying request with refreshed token");
                self.execute(&request, Some(&fresh)).await
            }
            Err(e) => {
                warn!(error = %e, "Session refresh failed, returning original response");
                Ok(response)
            }
        }
    }

    /// Execute a GET request and decode the JSON response
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(ApiRequest::get(path)).await?;
        let result = self.decode(path, &response)?;
        info!(path = %path, "GET request successful");
        Ok(result)
    }

    /// Execute a POST request with a JSON body and decode the JSON response
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(ApiRequest::post(path).json(body)?).await?;
        let result = self.decode(path, &response)?;
        info!(path = %path, "POST request successful");
        Ok(result)
    }

    async fn execute(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.config.url_for(&request.path);
        let mut builder =
            self.http_client.request(request.method.clone(), &url).headers(request.headers.clone());

        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("{BEARER_PREFIX}{token}"));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let timeout = self.http_client.timeout();
        let response = match tokio::time::timeout(timeout, self.http_client.send(builder)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Err(ApiError::from(err)),
            Err(_) => return Err(ApiError::Timeout(timeout)),
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read response body: {e}")))?
            .to_vec();

        debug!(%url, %status, bytes = body.len(), "response received");
        Ok(ApiResponse { status, headers, body })
    }

    fn decode<T: DeserializeOwned>(
        &self,
        path: &str,
        response: &ApiResponse,
    ) -> Result<T, ApiError> {
        let status = response.status;
        if !status.is_success() {
            // A 401 that survived the pipeline with no session left means the
            // refresh failed and the user must sign in again
            if status == StatusCode::UNAUTHORIZED && !self.session.is_authenticated() {
                return Err(ApiError::SessionExpired);
            }
            let url = self.config.url_for(path);
            return Err(Self::map_status_error(status, &url, response.text()));
        }

        // Handle 204/205 No Content responses
        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            // No body by definition
            return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                let code = status.as_u16();
                ApiError::Decode(format!(
                    "No content response ({code}), but response type cannot be deserialized from empty body"
                ))
            });
        }

        response.json()
    }

    fn map_status_error(status: StatusCode, url: &str, body: String) -> ApiError {
        let message = if body.is_empty() {
            format!("{url} returned status {status}")
        } else {
            format!("{url} returned status {status}: {body}")
        };

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            ApiError::Auth(message)
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            ApiError::RateLimit(message)
        } else if status.is_server_error() {
            ApiError::Server(message)
        } else if status.is_client_error() {
            ApiError::Client(message)
        } else {
            ApiError::Network(message)
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.config.base_url).finish_non_exhaustive()
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiConfig>,
    session: Option<Arc<SessionState>>,
    refresher: Option<Arc<RefreshCoordinator>>,
}

impl ApiClientBuilder {
    /// Set the API configuration
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the session whose token is attached to requests
    pub fn session(mut self, session: Arc<SessionState>) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the coordinator consulted when a request is rejected
    pub fn refresher(mut self, refresher: Arc<RefreshCoordinator>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if required fields are missing or client creation fails
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let session =
            self.session.ok_or_else(|| ApiError::Config("Session state not set".to_string()))?;
        let refresher = self
            .refresher
            .ok_or_else(|| ApiError::Config("Refresh coordinator not set".to_string()))?;

        ApiClient::new(config, session, refresher)
    }
}
