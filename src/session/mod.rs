//! Session state and lifecycle.
//!
//! [`SessionHandle`] is the process-wide session value: the current user and
//! an event channel the embedding UI subscribes to for navigation
//! (login/register land on the dashboard, logout lands on the login view).
//! It is constructed once at wiring time and injected into every component
//! that needs it. [`SessionManager`] drives the Anonymous/Authenticated
//! state machine over the API client.

pub mod types;

use std::sync::{Arc, RwLock};

use thiserror::Error;
use tokio::sync::broadcast;

use crate::api::{ApiClient, ApiError, ApiRequest};
use crate::store::{StoreError, TokenStore};
use self::types::{AuthResponse, LoginRequest, RegisterRequest, User};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Session lifecycle events, consumed by the embedder for navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
}

/// Shared, process-wide session state. Cheap to clone; all clones observe
/// the same user and event stream.
#[derive(Clone)]
pub struct SessionHandle {
    user: Arc<RwLock<Option<User>>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// A fresh anonymous session.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            user: Arc::new(RwLock::new(None)),
            events,
        }
    }

    pub fn user(&self) -> Option<User> {
        self.user.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn set_user(&self, user: Option<User>) {
        *self.user.write().unwrap_or_else(|e| e.into_inner()) = user;
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No receivers is fine; events are advisory.
        let _ = self.events.send(event);
    }

    /// Drop to Anonymous and notify subscribers.
    pub(crate) fn clear(&self) {
        self.set_user(None);
        self.emit(SessionEvent::LoggedOut);
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    /// The server rejected the operation; carries the message to display.
    #[error("{0}")]
    Rejected(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Register/login/logout/refresh over the API client.
pub struct SessionManager {
    api: Arc<ApiClient>,
    store: Arc<TokenStore>,
    session: SessionHandle,
}

impl SessionManager {
    pub fn new(api: Arc<ApiClient>, store: Arc<TokenStore>, session: SessionHandle) -> Self {
        Self {
            api,
            store,
            session,
        }
    }

    /// Load the persisted user profile into the shared session, if one was
    /// saved by a previous run. Emits no event.
    pub async fn restore(&self) -> Result<Option<User>, StoreError> {
        let user = self.store.user().await?;
        self.session.set_user(user.clone());
        Ok(user)
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, SessionError> {
        let mut body = serde_json::json!({
            "email": request.email,
            "password": request.password,
        });
        if let Some(name) = &request.full_name {
            body["fullName"] = serde_json::json!(name);
        }

        self.authenticate("/auth/register", body, "Registration failed")
            .await
    }

    pub async fn login(&self, request: LoginRequest) -> Result<User, SessionError> {
        let body = serde_json::json!({
            "email": request.email,
            "password": request.password,
        });

        self.authenticate("/auth/login", body, "Login failed").await
    }

    async fn authenticate(
        &self,
        path: &str,
        body: serde_json::Value,
        fallback: &str,
    ) -> Result<User, SessionError> {
        let request = ApiRequest::post(path).json(body).unauthenticated();

        match self.api.execute::<AuthResponse>(request).await {
            Ok(auth) => {
                self.store.save(&auth).await?;
                self.session.set_user(Some(auth.user.clone()));
                self.session.emit(SessionEvent::LoggedIn);
                tracing::info!("Authenticated as {}", auth.user.email);
                Ok(auth.user)
            }
            Err(ApiError::Store(e)) => Err(e.into()),
            Err(e) => {
                let message = e.server_message().unwrap_or(fallback).to_string();
                tracing::warn!("{}: {}", fallback, e);
                Err(SessionError::Rejected(message))
            }
        }
    }

    /// Drop to Anonymous. Succeeds without a network call; the storage
    /// result is reported but the in-memory session is cleared regardless.
    pub async fn logout(&self) -> Result<(), StoreError> {
        let result = self.store.clear().await;
        self.session.clear();
        tracing::info!("Logged out");
        result
    }

    /// Renew the credential bundle with the stored refresh token. Any
    /// failure lands in Anonymous; repeated failures are idempotent.
    pub async fn refresh(&self) -> Result<(), SessionError> {
        let current = self.store.access_token().await?;

        match self.api.refresh_credentials(current.as_deref()).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let message = e.server_message().unwrap_or("Session expired").to_string();
                if let Err(clear_err) = self.logout().await {
                    tracing::error!("Failed to clear credentials on logout: {}", clear_err);
                }
                Err(SessionError::Rejected(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::CryptoService;
    use crate::db::Database;
    use chrono::Utc;
    use httpmock::prelude::*;
    use serde_json::json;

    async fn harness(base_url: &str) -> (SessionManager, Arc<TokenStore>, SessionHandle) {
        let db = Arc::new(Database::in_memory().await.unwrap());
        let crypto = CryptoService::from_key([3u8; 32]).unwrap();
        let store = Arc::new(TokenStore::new(db, crypto));
        let session = SessionHandle::new();
        let api = Arc::new(ApiClient::new(
            base_url,
            store.clone(),
            session.clone(),
        ));
        (
            SessionManager::new(api, store.clone(), session.clone()),
            store,
            session,
        )
    }

    fn auth_body(access: &str, refresh: &str) -> serde_json::Value {
        json!({
            "accessToken": access,
            "refreshToken": refresh,
            "expiresAt": Utc::now().to_rfc3339(),
            "user": { "id": "u1", "email": "anna@example.com", "fullName": "Anna" }
        })
    }

    #[tokio::test]
    async fn test_login_success_persists_and_emits() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/login")
                .json_body(json!({ "email": "anna@example.com", "password": "hunter2" }));
            then.status(200).json_body(auth_body("at-1", "rt-1"));
        });

        let (manager, store, session) = harness(&server.base_url()).await;
        let mut events = session.subscribe();

        let user = manager
            .login(LoginRequest {
                email: "anna@example.com".into(),
                password: "hunter2".into(),
            })
            .await
            .unwrap();

        mock.assert();
        assert_eq!(user.email, "anna@example.com");
        assert!(session.is_authenticated());
        assert_eq!(store.access_token().await.unwrap().unwrap(), "at-1");
        assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedIn);
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_server_message() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(401).json_body(json!({ "message": "Invalid credentials" }));
        });

        let (manager, _store, session) = harness(&server.base_url()).await;

        let err = manager
            .login(LoginRequest {
                email: "anna@example.com".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Rejected(ref m) if m == "Invalid credentials"));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_failure_generic_fallback() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(500);
        });

        let (manager, _store, _session) = harness(&server.base_url()).await;

        let err = manager
            .login(LoginRequest {
                email: "anna@example.com".into(),
                password: "pw".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Rejected(ref m) if m == "Login failed"));
    }

    #[tokio::test]
    async fn test_register_sends_full_name_when_present() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/auth/register").json_body(json!({
                "email": "anna@example.com",
                "password": "hunter2",
                "fullName": "Anna Svensson"
            }));
            then.status(200).json_body(auth_body("at-1", "rt-1"));
        });

        let (manager, _store, _session) = harness(&server.base_url()).await;
        manager
            .register(RegisterRequest {
                email: "anna@example.com".into(),
                password: "hunter2".into(),
                full_name: Some("Anna Svensson".into()),
            })
            .await
            .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_logout_clears_store_and_emits() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(200).json_body(auth_body("at-1", "rt-1"));
        });

        let (manager, store, session) = harness(&server.base_url()).await;
        manager
            .login(LoginRequest {
                email: "anna@example.com".into(),
                password: "pw".into(),
            })
            .await
            .unwrap();

        let mut events = session.subscribe();
        manager.logout().await.unwrap();

        assert!(!session.is_authenticated());
        assert!(store.access_token().await.unwrap().is_none());
        assert!(store.refresh_token().await.unwrap().is_none());
        assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedOut);
    }

    #[tokio::test]
    async fn test_refresh_without_token_fails_and_logs_out() {
        let server = MockServer::start_async().await;
        let refresh_mock = server.mock(|when, then| {
            when.method(POST).path("/auth/refresh");
            then.status(200).json_body(auth_body("at-2", "rt-2"));
        });

        let (manager, _store, session) = harness(&server.base_url()).await;
        let mut events = session.subscribe();

        assert!(manager.refresh().await.is_err());
        assert_eq!(refresh_mock.hits(), 0);
        assert!(!session.is_authenticated());
        assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedOut);

        // Repeated failure is idempotent: still Anonymous, still an error.
        assert!(manager.refresh().await.is_err());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_success_replaces_bundle() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(200).json_body(auth_body("at-1", "rt-1"));
        });
        let refresh_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/refresh")
                .json_body(json!({ "refreshToken": "rt-1" }));
            then.status(200).json_body(auth_body("at-2", "rt-2"));
        });

        let (manager, store, session) = harness(&server.base_url()).await;
        manager
            .login(LoginRequest {
                email: "anna@example.com".into(),
                password: "pw".into(),
            })
            .await
            .unwrap();

        manager.refresh().await.unwrap();

        refresh_mock.assert();
        assert_eq!(store.access_token().await.unwrap().unwrap(), "at-2");
        assert_eq!(store.refresh_token().await.unwrap().unwrap(), "rt-2");
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_server_failure_forces_logout() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(200).json_body(auth_body("at-1", "rt-1"));
        });
        server.mock(|when, then| {
            when.method(POST).path("/auth/refresh");
            then.status(401).json_body(json!({ "error": "Refresh token revoked" }));
        });

        let (manager, store, session) = harness(&server.base_url()).await;
        manager
            .login(LoginRequest {
                email: "anna@example.com".into(),
                password: "pw".into(),
            })
            .await
            .unwrap();

        let err = manager.refresh().await.unwrap_err();

        assert!(matches!(err, SessionError::Rejected(ref m) if m == "Refresh token revoked"));
        assert!(!session.is_authenticated());
        assert!(store.access_token().await.unwrap().is_none());
        assert!(store.refresh_token().await.unwrap().is_none());
    }
}
