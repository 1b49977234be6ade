//! Authenticated API gateway.
//!
//! Every outgoing request goes through [`ApiClient`]. Bearer-mode requests
//! are stamped with the stored access token; an authorization failure
//! triggers at most one refresh-and-replay cycle per request, and
//! concurrent failures share a single refresh (single-flight). When the
//! refresh cycle itself fails, all credentials are cleared and a
//! `LoggedOut` event forces the embedder back to the login view.

use std::sync::Arc;

use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::session::types::AuthResponse;
use crate::session::SessionHandle;
use crate::store::{StoreError, TokenStore};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{}", display_unauthorized(.message))]
    Unauthorized { message: Option<String> },

    #[error("{}", display_server(.status, .message))]
    Server { status: u16, message: Option<String> },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

fn display_unauthorized(message: &Option<String>) -> String {
    message
        .clone()
        .unwrap_or_else(|| "Authorization failed".to_string())
}

fn display_server(status: &u16, message: &Option<String>) -> String {
    message
        .clone()
        .unwrap_or_else(|| format!("Request failed (HTTP {})", status))
}

impl ApiError {
    /// The server-supplied error message, when the response body carried
    /// one (`{"error": ...}` or `{"message": ...}`).
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message } | ApiError::Server { message, .. } => {
                message.as_deref()
            }
            _ => None,
        }
    }
}

/// Whether a request carries the stored bearer token and participates in
/// refresh-and-replay. The auth endpoints themselves use [`AuthMode::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMode {
    Bearer,
    None,
}

/// One outgoing request, described as a value. A fresh wire request is
/// built from it for every attempt, so the replay never mutates shared
/// state.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(&'static str, String)>,
    body: Option<serde_json::Value>,
    auth: AuthMode,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            auth: AuthMode::Bearer,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Send without a bearer token and without refresh-and-replay.
    pub fn unauthenticated(mut self) -> Self {
        self.auth = AuthMode::None;
        self
    }
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    store: Arc<TokenStore>,
    session: SessionHandle,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, store: Arc<TokenStore>, session: SessionHandle) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            store,
            session,
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Execute a request and decode the JSON response body.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.send(&request).await?;
        Self::decode(response).await
    }

    /// Execute a request whose success response carries no useful body.
    pub async fn execute_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        let response = self.send(&request).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from(response).await)
        }
    }

    async fn send(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        let token = match request.auth {
            AuthMode::Bearer => self.store.access_token().await?,
            AuthMode::None => None,
        };

        let response = self.dispatch(request, token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED || request.auth == AuthMode::None {
            return Ok(response);
        }

        // One refresh-and-replay cycle for this request. A second 401 on
        // the replay is surfaced, never re-refreshed.
        match self.refresh_credentials(token.as_deref()).await {
            Ok(()) => {
                let fresh = self.store.access_token().await?;
                tracing::debug!("Replaying {} {}", request.method, request.path);
                Ok(self.dispatch(request, fresh.as_deref()).await?)
            }
            Err(refresh_error) => {
                tracing::warn!("Token refresh failed: {}", refresh_error);
                let original = Self::error_from(response).await;
                self.force_logout().await;
                Err(original)
            }
        }
    }

    /// Renew the credential bundle with the stored refresh token.
    ///
    /// `stale_token` is the access token the caller's failed attempt used;
    /// if the store already holds a different one, another caller refreshed
    /// while we waited on the gate and no second refresh request is made.
    pub(crate) async fn refresh_credentials(
        &self,
        stale_token: Option<&str>,
    ) -> Result<(), ApiError> {
        let _gate = self.refresh_gate.lock().await;

        if let Some(current) = self.store.access_token().await? {
            if stale_token != Some(current.as_str()) {
                return Ok(());
            }
        }

        let refresh_token =
            self.store
                .refresh_token()
                .await?
                .ok_or_else(|| ApiError::Unauthorized {
                    message: Some("No refresh token available".to_string()),
                })?;

        let request = ApiRequest::post("/auth/refresh")
            .json(serde_json::json!({ "refreshToken": refresh_token }))
            .unauthenticated();

        let response = self.dispatch(&request, None).await?;
        let auth: AuthResponse = Self::decode(response).await?;

        self.store.save(&auth).await?;
        self.session.set_user(Some(auth.user));
        tracing::info!("Access token refreshed");
        Ok(())
    }

    async fn force_logout(&self) {
        if let Err(e) = self.store.clear().await {
            tracing::error!("Failed to clear credentials: {}", e);
        }
        self.session.clear();
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<Response, reqwest::Error> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        builder.send().await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            Err(Self::error_from(response).await)
        }
    }

    async fn error_from(response: Response) -> ApiError {
        let status = response.status();
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| {
                body.get("error")
                    .or_else(|| body.get("message"))
                    .and_then(|v| v.as_str())
                    .map(String::from)
            });

        if status == StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized { message }
        } else {
            ApiError::Server {
                status: status.as_u16(),
                message,
            }
        }
    }
}
