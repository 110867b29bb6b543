//! Identity service client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use bigstep_core::users::{IdentityProviderTrait, IdentityUser, User};
use bigstep_core::{Error, Result};

const IDENTITY_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves access tokens against a Supabase-style `/auth/v1/user` endpoint.
pub struct HttpIdentityProvider {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl HttpIdentityProvider {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(IDENTITY_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url,
            anon_key: anon_key.into(),
        }
    }
}

#[async_trait]
impl IdentityProviderTrait for HttpIdentityProvider {
    async fn get_user(&self, access_token: &str) -> Result<Option<User>> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Error::Identity(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::Identity(format!("HTTP {}", status)));
        }

        let raw: IdentityUser = response
            .json()
            .await
            .map_err(|e| Error::Identity(e.to_string()))?;
        let user = User::from(raw);
        Ok(Some(user).filter(|u| !u.id.is_empty()))
    }
}

/// Used when no identity service is configured: nobody is ever signed in.
pub struct AnonymousIdentityProvider;

#[async_trait]
impl IdentityProviderTrait for AnonymousIdentityProvider {
    async fn get_user(&self, _access_token: &str) -> Result<Option<User>> {
        Ok(None)
    }
}
