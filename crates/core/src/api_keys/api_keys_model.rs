//! API key domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::SUPPORTED_PROVIDERS;
use crate::errors::{Error, Result, ValidationError};
use crate::stores::ScopedRecord;

/// A provider credential owned by one user.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyRecord {
    pub id: String,
    pub provider: String,
    pub key: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApiKeyRecord {
    /// First four characters of the key followed by an ellipsis.
    pub fn masked_key(&self) -> String {
        mask_secret(&self.key)
    }
}

impl std::fmt::Debug for ApiKeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyRecord")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("key", &self.masked_key())
            .field("user_id", &self.user_id)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Shorten a secret for display or logging.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    if prefix.is_empty() {
        String::new()
    } else {
        format!("{}…", prefix)
    }
}

/// Normalize a provider tag and check it is one we know.
pub fn validate_provider(provider: &str) -> Result<String> {
    let tag = provider.trim().to_lowercase();
    if tag.is_empty() {
        return Err(Error::Validation(ValidationError::MissingField(
            "provider".to_string(),
        )));
    }
    if !SUPPORTED_PROVIDERS.contains(&tag.as_str()) {
        return Err(Error::Validation(ValidationError::UnsupportedProvider(tag)));
    }
    Ok(tag)
}

/// Input model for creating an API key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApiKey {
    #[serde(default)]
    pub id: Option<String>,
    pub provider: String,
    pub key: String,
}

impl NewApiKey {
    pub fn validate(&self) -> Result<()> {
        validate_provider(&self.provider)?;
        if self.key.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "API key cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}

impl From<NewApiKey> for ApiKeyRecord {
    fn from(new_key: NewApiKey) -> Self {
        let now = Utc::now();
        Self {
            id: new_key.id.unwrap_or_default(),
            provider: new_key.provider.trim().to_lowercase(),
            key: new_key.key.trim().to_string(),
            user_id: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyUpdate {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

impl ApiKeyUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(provider) = &self.provider {
            validate_provider(provider)?;
        }
        if matches!(&self.key, Some(k) if k.trim().is_empty()) {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "API key cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}

impl ScopedRecord for ApiKeyRecord {
    type Patch = ApiKeyUpdate;
    const KIND: &'static str = "api-keys";
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

    fn apply_patch(&mut self, patch: ApiKeyUpdate) {
        if let Some(provider) = patch.provider {
            self.provider = provider.trim().to_lowercase();
        }
        if let Some(key) = patch.key {
            self.key = key.trim().to_string();
        }
        self.updated_at = Utc::now();
    }
}
