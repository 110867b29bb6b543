use log::debug;
use std::sync::Arc;

use super::api_keys_model::{ApiKeyRecord, ApiKeyUpdate, NewApiKey};
use super::api_keys_traits::{ApiKeyRepository, ApiKeyServiceTrait};
use crate::errors::{Error, Result};
use crate::stores::prepare_for_insert;

/// Service for managing a user's provider keys
pub struct ApiKeyService {
    repository: Arc<ApiKeyRepository>,
}

impl ApiKeyService {
    pub fn new(repository: Arc<ApiKeyRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait::async_trait]
impl ApiKeyServiceTrait for ApiKeyService {
    fn list_api_keys(&self, user_id: &str) -> Result<Vec<ApiKeyRecord>> {
        self.repository.list_for_user(user_id)
    }

    fn get_api_key(&self, user_id: &str, id: &str) -> Result<ApiKeyRecord> {
        self.repository
            .get_for_user(user_id, id)?
            .ok_or_else(|| Error::not_found(format!("api key {}", id)))
    }

    async fn create_api_key(&self, user_id: &str, new_key: NewApiKey) -> Result<ApiKeyRecord> {
        new_key.validate()?;
        let record = prepare_for_insert(ApiKeyRecord::from(new_key), user_id);
        debug!(
            "Creating {} key {} for user {}",
            record.provider,
            record.masked_key(),
            user_id
        );
        self.repository.insert(record).await
    }

    async fn update_api_key(
        &self,
        user_id: &str,
        id: &str,
        update: ApiKeyUpdate,
    ) -> Result<ApiKeyRecord> {
        update.validate()?;
        self.repository.update(user_id, id, update).await
    }

    async fn delete_api_key(&self, user_id: &str, id: &str) -> Result<()> {
        match self.repository.delete(user_id, id).await? {
            0 => Err(Error::not_found(format!("api key {}", id))),
            _ => Ok(()),
        }
    }
}
