//! Model profile domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api_keys::validate_provider;
use crate::constants::DEFAULT_SYSTEM_PROMPT;
use crate::errors::{Error, Result, ValidationError};
use crate::stores::ScopedRecord;

/// User-owned configuration binding a model id to a provider and prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub api_key_id: Option<String>,
    pub provider: String,
    pub system_prompt: String,
    /// Upstream model string; falls back to the registry, then to `id`.
    #[serde(default)]
    pub model: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Blank prompts become the default prompt.
pub fn normalize_system_prompt(prompt: Option<&str>) -> String {
    match prompt.map(str::trim) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => DEFAULT_SYSTEM_PROMPT.to_string(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Input model for creating a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModelProfile {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub api_key_id: Option<String>,
    pub provider: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl NewModelProfile {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Profile name cannot be empty".to_string(),
            )));
        }
        validate_provider(&self.provider)?;
        Ok(())
    }
}

impl From<NewModelProfile> for ModelProfile {
    fn from(new_profile: NewModelProfile) -> Self {
        let now = Utc::now();
        Self {
            id: new_profile.id.map(|id| id.trim().to_string()).unwrap_or_default(),
            name: new_profile.name.trim().to_string(),
            description: new_profile.description.unwrap_or_default(),
            api_key_id: non_blank(new_profile.api_key_id),
            provider: new_profile.provider.trim().to_lowercase(),
            system_prompt: normalize_system_prompt(new_profile.system_prompt.as_deref()),
            model: non_blank(new_profile.model),
            user_id: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update. For `api_key_id` and `model`, an empty string clears the
/// value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub api_key_id: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl ModelProfileUpdate {
    pub fn validate(&self) -> Result<()> {
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Profile name cannot be empty".to_string(),
            )));
        }
        if let Some(provider) = &self.provider {
            validate_provider(provider)?;
        }
        Ok(())
    }
}

impl ScopedRecord for ModelProfile {
    type Patch = ModelProfileUpdate;
    const KIND: &'static str = "model-profiles";
    const NEWEST_FIRST: bool = false;

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

    fn apply_patch(&mut self, patch: ModelProfileUpdate) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(api_key_id) = patch.api_key_id {
            self.api_key_id = non_blank(Some(api_key_id));
        }
        if let Some(provider) = patch.provider {
            self.provider = provider.trim().to_lowercase();
        }
        if let Some(prompt) = patch.system_prompt {
            self.system_prompt = normalize_system_prompt(Some(&prompt));
        }
        if let Some(model) = patch.model {
            self.model = non_blank(Some(model));
        }
        self.updated_at = Utc::now();
    }
}
