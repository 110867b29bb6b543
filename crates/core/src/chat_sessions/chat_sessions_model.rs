//! Chat session domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};
use crate::stores::ScopedRecord;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for ChatRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown chat role '{}'",
                other
            )))),
        }
    }
}

/// One turn of a conversation. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A conversation owned by one user. Messages only ever grow at the end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub started: DateTime<Utc>,
    pub model_id: String,
    pub model_name: String,
    pub user_id: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Input model for starting a chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChatSession {
    #[serde(default)]
    pub id: Option<String>,
    pub model_id: String,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl NewChatSession {
    pub fn validate(&self) -> Result<()> {
        if self.model_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "modelId".to_string(),
            )));
        }
        Ok(())
    }
}

impl From<NewChatSession> for ChatSession {
    fn from(new_session: NewChatSession) -> Self {
        let model_id = new_session.model_id.trim().to_string();
        let model_name = new_session
            .model_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| model_id.clone());
        Self {
            id: new_session.id.unwrap_or_default(),
            started: Utc::now(),
            model_id,
            model_name,
            user_id: String::new(),
            messages: new_session.messages,
        }
    }
}

/// The only changes a session accepts: switch model, append messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSessionUpdate {
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub append_messages: Vec<ChatMessage>,
}

impl ChatSessionUpdate {
    pub fn append(messages: Vec<ChatMessage>) -> Self {
        Self {
            append_messages: messages,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if matches!(&self.model_id, Some(id) if id.trim().is_empty()) {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Model id cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}

impl ScopedRecord for ChatSession {
    type Patch = ChatSessionUpdate;
    const KIND: &'static str = "chat-sessions";
    const NEWEST_FIRST: bool = true;

    fn id(&self) -> &str {
        &self.id
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn assign_owner(&mut self, id: String, user_id: String) {
        self.id = id;
        self.user_id = user_id;
    }

    fn apply_patch(&mut self, patch: ChatSessionUpdate) {
        if let Some(model_id) = patch.model_id {
            self.model_id = model_id.trim().to_string();
        }
        if let Some(model_name) = patch.model_name {
            self.model_name = model_name;
        }
        self.messages.extend(patch.append_messages);
    }
}
