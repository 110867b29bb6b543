//! User and session domain models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A signed-in user as seen by the rest of the system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar_url: String,
}

/// Raw user payload returned by the identity service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Option<Value>,
}

impl From<IdentityUser> for User {
    fn from(raw: IdentityUser) -> Self {
        let email = raw.email.unwrap_or_default();
        let metadata_str = |key: &str| {
            raw.user_metadata
                .as_ref()
                .and_then(|m| m.get(key))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let name = metadata_str("full_name")
            .or_else(|| metadata_str("name"))
            .unwrap_or_else(|| email.clone());
        let avatar_url = metadata_str("avatar_url").unwrap_or_default();

        Self {
            id: raw.id.unwrap_or_default(),
            email,
            name,
            avatar_url,
        }
    }
}

/// Tokens issued by the identity service for one sign-in.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl AuthSession {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// Both tokens must be present for the session to count.
    pub fn is_complete(&self) -> bool {
        !self.access_token.trim().is_empty() && !self.refresh_token.trim().is_empty()
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Auth state transitions reported by the identity layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}
