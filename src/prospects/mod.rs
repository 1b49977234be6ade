//! Prospect endpoints and the in-memory prospect directory.

pub mod chat;
pub mod types;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::api::{ApiClient, ApiError, ApiRequest};
use self::types::{
    BatchOutcome, ChatRequest, ChatResponse, CreateProspectRequest, EmailDraft, EmailDraftKind,
    PendingProspect, Prospect, ResearchProvider, SendEmailResponse, SoftCompanyData,
    UpdateProspectRequest,
};

/// Typed wrappers over the prospect REST surface.
pub struct ProspectService {
    api: Arc<ApiClient>,
}

impl ProspectService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<Prospect>, ApiError> {
        self.api.execute(ApiRequest::get("/prospects")).await
    }

    pub async fn get(&self, id: &str) -> Result<Prospect, ApiError> {
        self.api
            .execute(ApiRequest::get(format!("/prospects/{}", id)))
            .await
    }

    pub async fn create(&self, request: &CreateProspectRequest) -> Result<Prospect, ApiError> {
        let body = serde_json::to_value(request)?;
        self.api
            .execute(ApiRequest::post("/prospects").json(body))
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        request: &UpdateProspectRequest,
    ) -> Result<Prospect, ApiError> {
        let body = serde_json::to_value(request)?;
        self.api
            .execute(ApiRequest::put(format!("/prospects/{}", id)).json(body))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.api
            .execute_empty(ApiRequest::delete(format!("/prospects/{}", id)))
            .await
    }

    pub async fn generate_email_draft(
        &self,
        id: &str,
        kind: Option<EmailDraftKind>,
    ) -> Result<EmailDraft, ApiError> {
        let mut request = ApiRequest::post(format!("/prospects/{}/email/draft", id))
            .json(serde_json::json!({}));
        if let Some(kind) = kind {
            request = request.query("type", kind.as_str());
        }
        self.api.execute(request).await
    }

    pub async fn send_email(&self, id: &str) -> Result<SendEmailResponse, ApiError> {
        self.api
            .execute(
                ApiRequest::post(format!("/prospects/{}/email/send", id))
                    .json(serde_json::json!({})),
            )
            .await
    }

    pub async fn chat(&self, id: &str, request: &ChatRequest) -> Result<ChatResponse, ApiError> {
        let body = serde_json::to_value(request)?;
        self.api
            .execute(ApiRequest::post(format!("/prospects/{}/chat", id)).json(body))
            .await
    }

    pub async fn reset_chat(&self, id: &str) -> Result<(), ApiError> {
        self.api
            .execute_empty(ApiRequest::post(format!("/prospects/{}/chat/reset", id)))
            .await
    }

    pub async fn generate_soft_data(
        &self,
        id: &str,
        provider: Option<ResearchProvider>,
    ) -> Result<SoftCompanyData, ApiError> {
        let mut request = ApiRequest::post(format!("/prospects/{}/soft-data/generate", id));
        if let Some(provider) = provider {
            request = request.query("provider", provider.as_str());
        }
        self.api.execute(request).await
    }

    /// One server call for the whole id list; the batching is server-side.
    pub async fn generate_soft_data_batch(
        &self,
        ids: &[String],
        provider: ResearchProvider,
    ) -> Result<BatchOutcome<SoftCompanyData>, ApiError> {
        let body = serde_json::json!({
            "prospectIds": ids,
            "provider": provider.as_str(),
        });
        self.api
            .execute(ApiRequest::post("/prospects/batch/soft-data/generate").json(body))
            .await
    }

    pub async fn generate_email_batch(
        &self,
        ids: &[String],
        kind: Option<EmailDraftKind>,
        auto_generate_soft_data: bool,
        soft_data_provider: ResearchProvider,
    ) -> Result<BatchOutcome<EmailDraft>, ApiError> {
        let mut body = serde_json::json!({
            "prospectIds": ids,
            "autoGenerateSoftData": auto_generate_soft_data,
            "softDataProvider": soft_data_provider.as_str(),
        });
        if let Some(kind) = kind {
            body["type"] = serde_json::json!(kind.as_str());
        }
        self.api
            .execute(ApiRequest::post("/prospects/batch/email/generate").json(body))
            .await
    }

    pub async fn pending(&self) -> Result<Vec<PendingProspect>, ApiError> {
        self.api.execute(ApiRequest::get("/prospects/pending")).await
    }

    pub async fn claim(&self, id: &str) -> Result<Prospect, ApiError> {
        self.api
            .execute(ApiRequest::post(format!("/prospects/{}/claim", id)))
            .await
    }

    pub async fn reject_pending(&self, id: &str) -> Result<(), ApiError> {
        self.api
            .execute_empty(ApiRequest::post(format!("/prospects/{}/pending/reject", id)))
            .await
    }
}

/// Owns the in-memory prospect list the view models read.
///
/// Reads record their failure in `last_error` and return quietly; mutations
/// record it and re-raise so callers can react.
pub struct ProspectDirectory {
    service: Arc<ProspectService>,
    prospects: RwLock<Vec<Prospect>>,
    loading: AtomicBool,
    error: Mutex<Option<String>>,
}

impl ProspectDirectory {
    pub fn new(service: Arc<ProspectService>) -> Self {
        Self {
            service,
            prospects: RwLock::new(Vec::new()),
            loading: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    /// Snapshot of the current list.
    pub fn prospects(&self) -> Vec<Prospect> {
        self.prospects
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn last_error(&self) -> Option<String> {
        self.error.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_error(&self, message: Option<String>) {
        *self.error.lock().unwrap_or_else(|e| e.into_inner()) = message;
    }

    /// Replace the list with the server's. Failures land in `last_error`.
    pub async fn refresh(&self) {
        self.loading.store(true, Ordering::SeqCst);
        self.set_error(None);

        match self.service.list().await {
            Ok(list) => {
                *self.prospects.write().unwrap_or_else(|e| e.into_inner()) = list;
            }
            Err(e) => {
                tracing::error!("Failed to fetch prospects: {}", e);
                self.set_error(Some(e.to_string()));
            }
        }

        self.loading.store(false, Ordering::SeqCst);
    }

    pub async fn create(&self, request: &CreateProspectRequest) -> Result<Prospect, ApiError> {
        self.set_error(None);
        match self.service.create(request).await {
            Ok(prospect) => {
                self.prospects
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(prospect.clone());
                Ok(prospect)
            }
            Err(e) => {
                self.set_error(Some(e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn update(
        &self,
        id: &str,
        request: &UpdateProspectRequest,
    ) -> Result<Prospect, ApiError> {
        self.set_error(None);
        match self.service.update(id, request).await {
            Ok(updated) => {
                let mut list = self.prospects.write().unwrap_or_else(|e| e.into_inner());
                if let Some(slot) = list.iter_mut().find(|p| p.id == id) {
                    *slot = updated.clone();
                }
                Ok(updated)
            }
            Err(e) => {
                self.set_error(Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Terminal removal; no tombstone is kept client-side.
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.set_error(None);
        match self.service.delete(id).await {
            Ok(()) => {
                self.prospects
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .retain(|p| p.id != id);
                Ok(())
            }
            Err(e) => {
                self.set_error(Some(e.to_string()));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::CryptoService;
    use crate::db::Database;
    use crate::session::SessionHandle;
    use crate::store::TokenStore;
    use httpmock::prelude::*;
    use serde_json::json;

    async fn service(base_url: &str) -> Arc<ProspectService> {
        let db = Arc::new(Database::in_memory().await.unwrap());
        let crypto = CryptoService::from_key([2u8; 32]).unwrap();
        let store = Arc::new(TokenStore::new(db, crypto));
        let api = Arc::new(ApiClient::new(base_url, store, SessionHandle::new()));
        Arc::new(ProspectService::new(api))
    }

    fn prospect_json(id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "isFromCrm": false,
            "crmId": null,
            "isPending": false,
            "status": 0,
            "createdUtc": "2026-02-01T08:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_email_draft_type_query() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/prospects/p1/email/draft")
                .query_param("type", "WebSearch");
            then.status(200).json_body(json!({ "mailTitle": "Intro" }));
        });

        let service = service(&server.base_url()).await;
        let draft = service
            .generate_email_draft("p1", Some(EmailDraftKind::WebSearch))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(draft.mail_title.as_deref(), Some("Intro"));
    }

    #[tokio::test]
    async fn test_email_batch_body_shape() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/prospects/batch/email/generate")
                .json_body(json!({
                    "prospectIds": ["a", "b"],
                    "autoGenerateSoftData": false,
                    "softDataProvider": "Claude",
                    "type": "UseCollectedData"
                }));
            then.status(200).json_body(json!({
                "successes": [],
                "failures": [],
                "totalCount": 2,
                "successCount": 2,
                "failureCount": 0
            }));
        });

        let service = service(&server.base_url()).await;
        let outcome = service
            .generate_email_batch(
                &["a".to_string(), "b".to_string()],
                Some(EmailDraftKind::UseCollectedData),
                false,
                ResearchProvider::Claude,
            )
            .await
            .unwrap();

        mock.assert();
        assert_eq!(outcome.success_count, 2);
    }

    #[tokio::test]
    async fn test_directory_refresh_and_crud() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/prospects");
            then.status(200)
                .json_body(json!([prospect_json("p1", "Acme AB")]));
        });
        server.mock(|when, then| {
            when.method(POST).path("/prospects");
            then.status(200).json_body(prospect_json("p2", "Nordic Co"));
        });
        server.mock(|when, then| {
            when.method(PUT).path("/prospects/p1");
            then.status(200).json_body(prospect_json("p1", "Acme Renamed"));
        });
        server.mock(|when, then| {
            when.method(DELETE).path("/prospects/p2");
            then.status(204);
        });

        let directory = ProspectDirectory::new(service(&server.base_url()).await);

        directory.refresh().await;
        assert_eq!(directory.prospects().len(), 1);
        assert!(directory.last_error().is_none());
        assert!(!directory.is_loading());

        directory
            .create(&CreateProspectRequest {
                name: "Nordic Co".into(),
                websites: None,
                email_addresses: None,
                phone_numbers: None,
                notes: None,
            })
            .await
            .unwrap();
        assert_eq!(directory.prospects().len(), 2);

        directory
            .update(
                "p1",
                &UpdateProspectRequest {
                    name: Some("Acme Renamed".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(directory.prospects()[0].name, "Acme Renamed");

        directory.delete("p2").await.unwrap();
        assert_eq!(directory.prospects().len(), 1);
    }

    #[tokio::test]
    async fn test_directory_read_failure_sets_error_quietly() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/prospects");
            then.status(500).json_body(json!({ "error": "db down" }));
        });

        let directory = ProspectDirectory::new(service(&server.base_url()).await);
        directory.refresh().await;

        assert!(directory.prospects().is_empty());
        assert_eq!(directory.last_error().as_deref(), Some("db down"));
        assert!(!directory.is_loading());
    }

    #[tokio::test]
    async fn test_directory_mutation_failure_sets_error_and_raises() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(DELETE).path("/prospects/p1");
            then.status(409).json_body(json!({ "error": "prospect is locked" }));
        });

        let directory = ProspectDirectory::new(service(&server.base_url()).await);
        let err = directory.delete("p1").await.unwrap_err();

        assert!(matches!(err, ApiError::Server { status: 409, .. }));
        assert_eq!(directory.last_error().as_deref(), Some("prospect is locked"));
    }
}
