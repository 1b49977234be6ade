//! Client-side transcript of the per-prospect email improvement chat.

use chrono::{DateTime, Utc};

use super::types::ChatResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// Draft fields carried by an assistant turn that improved the mail.
#[derive(Debug, Clone)]
pub struct ChatMailData {
    pub mail_title: Option<String>,
    pub mail_body_plain: Option<String>,
    pub mail_body_html: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub improved_mail: bool,
    pub mail_data: Option<ChatMailData>,
}

impl ChatMessage {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            improved_mail: false,
            mail_data: None,
        }
    }
}

/// Ordered transcript for one prospect's chat. Cleared on reset.
#[derive(Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(ChatRole::User, content));
    }

    /// Record an assistant turn, keeping the improved-mail payload when the
    /// server produced one.
    pub fn push_assistant(&mut self, response: &ChatResponse) {
        let mut message = ChatMessage::new(ChatRole::Assistant, response.ai_message.clone());
        message.improved_mail = response.improved_mail;
        if response.improved_mail {
            message.mail_data = Some(ChatMailData {
                mail_title: response.mail_title.clone(),
                mail_body_plain: response.mail_body_plain.clone(),
                mail_body_html: response.mail_body_html.clone(),
            });
        }
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
