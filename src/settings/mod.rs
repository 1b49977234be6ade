//! Settings endpoints: email prompt management and company info.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, ApiError, ApiRequest};

/// Instruction template used by server-side email generation. At most one
/// prompt is active at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailPrompt {
    pub id: String,
    pub instructions: String,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmailPromptRequest {
    pub instructions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmailPromptRequest {
    pub instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseDetail {
    pub name: String,
    pub industry: String,
    pub challenge: String,
    pub solution: String,
    pub result: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStudy {
    pub page_title: String,
    pub page_type: String,
    pub case: CaseDetail,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub methods_or_tech: Vec<String>,
    #[serde(default)]
    pub values_or_tone: Vec<String>,
}

/// Company background the email generator personalizes against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub overview: String,
    #[serde(default)]
    pub cases: Vec<CaseStudy>,
}

pub struct SettingsService {
    api: Arc<ApiClient>,
}

impl SettingsService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// The currently active email prompt. A 404 means none is configured,
    /// which is an absence, not an error.
    pub async fn active_email_prompt(&self) -> Result<Option<EmailPrompt>, ApiError> {
        match self
            .api
            .execute::<EmailPrompt>(ApiRequest::get("/settings/email-prompt"))
            .await
        {
            Ok(prompt) => Ok(Some(prompt)),
            Err(ApiError::Server { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn email_prompts(&self) -> Result<Vec<EmailPrompt>, ApiError> {
        self.api
            .execute(ApiRequest::get("/settings/email-prompts"))
            .await
    }

    pub async fn create_email_prompt(
        &self,
        request: &CreateEmailPromptRequest,
    ) -> Result<EmailPrompt, ApiError> {
        let body = serde_json::to_value(request)?;
        self.api
            .execute(ApiRequest::post("/settings/email-prompts").json(body))
            .await
    }

    pub async fn update_email_prompt(
        &self,
        id: &str,
        request: &UpdateEmailPromptRequest,
    ) -> Result<EmailPrompt, ApiError> {
        let body = serde_json::to_value(request)?;
        self.api
            .execute(ApiRequest::put(format!("/settings/email-prompts/{}", id)).json(body))
            .await
    }

    /// Make this prompt the active one; the server deactivates the rest.
    pub async fn activate_email_prompt(&self, id: &str) -> Result<EmailPrompt, ApiError> {
        self.api
            .execute(ApiRequest::post(format!(
                "/settings/email-prompts/{}/activate",
                id
            )))
            .await
    }

    pub async fn delete_email_prompt(&self, id: &str) -> Result<(), ApiError> {
        self.api
            .execute_empty(ApiRequest::delete(format!("/settings/email-prompts/{}", id)))
            .await
    }

    pub async fn company_info(&self) -> Result<CompanyInfo, ApiError> {
        self.api
            .execute(ApiRequest::get("/settings/company-info"))
            .await
    }
}
