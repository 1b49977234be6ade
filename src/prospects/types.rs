use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Prospect lifecycle status. A closed, ordered enumeration, serialized as
/// its integer code on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ProspectStatus {
    New = 0,
    Researched = 1,
    Drafted = 2,
    Emailed = 3,
    Responded = 4,
    Archived = 5,
}

impl ProspectStatus {
    pub const ALL: [ProspectStatus; 6] = [
        ProspectStatus::New,
        ProspectStatus::Researched,
        ProspectStatus::Drafted,
        ProspectStatus::Emailed,
        ProspectStatus::Responded,
        ProspectStatus::Archived,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ProspectStatus::New),
            1 => Some(ProspectStatus::Researched),
            2 => Some(ProspectStatus::Drafted),
            3 => Some(ProspectStatus::Emailed),
            4 => Some(ProspectStatus::Responded),
            5 => Some(ProspectStatus::Archived),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProspectStatus::New => "New",
            ProspectStatus::Researched => "Researched",
            ProspectStatus::Drafted => "Drafted",
            ProspectStatus::Emailed => "Emailed",
            ProspectStatus::Responded => "Responded",
            ProspectStatus::Archived => "Archived",
        }
    }
}

impl Serialize for ProspectStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for ProspectStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        ProspectStatus::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown prospect status: {}", code)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    pub url: Option<String>,
    pub service: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddress {
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    pub number: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmTag {
    pub id: i64,
    pub name: String,
    pub data_tag: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmCustomField {
    pub id: i64,
    pub field_name: Option<String>,
    pub field_definition_id: Option<i64>,
    pub value: Option<String>,
    pub tag_id: Option<i64>,
}

/// A sales-lead record. Created by the server (which assigns the id),
/// mutated via partial updates, removed terminally by delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prospect {
    pub id: String,
    pub name: String,
    pub is_from_crm: bool,
    pub crm_id: Option<i64>,
    pub is_pending: bool,
    pub about: Option<String>,
    #[serde(default)]
    pub websites: Vec<Website>,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub tags: Vec<CrmTag>,
    #[serde(default)]
    pub custom_fields: Vec<CrmCustomField>,
    #[serde(rename = "pictureURL")]
    pub picture_url: Option<String>,
    pub crm_created_at: Option<DateTime<Utc>>,
    pub crm_updated_at: Option<DateTime<Utc>>,
    pub last_contacted_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub status: ProspectStatus,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: Option<DateTime<Utc>>,
    pub mail_title: Option<String>,
    pub mail_body_plain: Option<String>,
    #[serde(rename = "mailBodyHTML")]
    pub mail_body_html: Option<String>,
    pub owner_id: Option<String>,
    pub soft_company_data: Option<SoftCompanyData>,
}

impl Prospect {
    /// Whether at least one contact email address is present.
    pub fn has_email(&self) -> bool {
        !self.email_addresses.is_empty()
    }

    /// First contact email address, used as the sort key for contact email.
    pub fn primary_email(&self) -> Option<&str> {
        self.email_addresses.iter().find_map(|e| e.address.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProspectRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub websites: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_addresses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_numbers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update: only supplied fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProspectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub websites: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_addresses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_numbers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProspectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_body_plain: Option<String>,
    #[serde(rename = "mailBodyHTML", skip_serializing_if = "Option::is_none")]
    pub mail_body_html: Option<String>,
}

/// A prospect surfaced by the CRM but not yet claimed into the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingProspect {
    pub id: String,
    pub name: String,
    pub crm_id: i64,
    pub about: Option<String>,
    #[serde(rename = "pictureURL")]
    pub picture_url: Option<String>,
    #[serde(default)]
    pub websites: Vec<Website>,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDraft {
    pub mail_title: Option<String>,
    pub mail_body_plain: Option<String>,
    #[serde(rename = "mailBodyHTML")]
    pub mail_body_html: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub user_input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_body_plain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_web_search: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub ai_message: String,
    pub improved_mail: bool,
    pub mail_title: Option<String>,
    pub mail_body_plain: Option<String>,
    #[serde(rename = "mailBodyHTML")]
    pub mail_body_html: Option<String>,
}

/// Backend used for server-side research generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResearchProvider {
    #[serde(rename = "OpenAI")]
    OpenAi,
    #[default]
    Claude,
    Hybrid,
}

impl ResearchProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchProvider::OpenAi => "OpenAI",
            ResearchProvider::Claude => "Claude",
            ResearchProvider::Hybrid => "Hybrid",
        }
    }
}

/// Strategy for server-side email draft generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailDraftKind {
    WebSearch,
    UseCollectedData,
}

impl EmailDraftKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailDraftKind::WebSearch => "WebSearch",
            EmailDraftKind::UseCollectedData => "UseCollectedData",
        }
    }
}

/// Per-item outcome envelope returned by the batch endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome<T> {
    #[serde(default)]
    pub successes: Vec<BatchItemSuccess<T>>,
    #[serde(default)]
    pub failures: Vec<BatchItemFailure>,
    pub total_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemSuccess<T> {
    pub prospect_id: String,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemFailure {
    pub prospect_id: String,
    pub error: String,
}

/// Server-generated company research attached to a prospect. The list
/// columns arrive as JSON strings and parse leniently via
/// [`ParsedSoftCompanyData`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftCompanyData {
    pub id: String,
    pub prospect_id: String,
    pub hooks_json: Option<String>,
    pub recent_events_json: Option<String>,
    pub news_items_json: Option<String>,
    pub social_activity_json: Option<String>,
    pub sources_json: Option<String>,
    pub researched_at: DateTime<Utc>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: Option<DateTime<Utc>>,
}

pub const DEFAULT_RESEARCH_MAX_AGE_DAYS: i64 = 7;

impl SoftCompanyData {
    pub fn age_days(&self) -> i64 {
        (Utc::now() - self.researched_at).num_days()
    }

    /// Whether the research is older than `max_age_days`.
    pub fn is_stale(&self, max_age_days: i64) -> bool {
        self.age_days() > max_age_days
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookRelevance {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizationHook {
    pub text: String,
    pub source: String,
    pub date: String,
    pub relevance: HookRelevance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyEvent {
    pub title: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub headline: String,
    pub date: String,
    pub source: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialActivity {
    pub platform: String,
    pub text: String,
    pub date: String,
    pub url: String,
}

/// Structured view over [`SoftCompanyData`]. Malformed or absent JSON
/// columns become empty lists rather than errors.
#[derive(Debug, Clone)]
pub struct ParsedSoftCompanyData {
    pub hooks: Vec<PersonalizationHook>,
    pub events: Vec<CompanyEvent>,
    pub news: Vec<NewsItem>,
    pub social_activity: Vec<SocialActivity>,
    pub sources: Vec<String>,
    pub researched_at: DateTime<Utc>,
}

impl ParsedSoftCompanyData {
    pub fn from_dto(dto: &SoftCompanyData) -> Self {
        Self {
            hooks: parse_list(&dto.hooks_json),
            events: parse_list(&dto.recent_events_json),
            news: parse_list(&dto.news_items_json),
            social_activity: parse_list(&dto.social_activity_json),
            sources: parse_list(&dto.sources_json),
            researched_at: dto.researched_at,
        }
    }
}

fn parse_list<T: DeserializeOwned>(raw: &Option<String>) -> Vec<T> {
    let Some(raw) = raw.as_deref() else {
        return Vec::new();
    };
    match serde_json::from_str(raw) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("Discarding malformed research payload: {}", e);
            Vec::new()
        }
    }
}
