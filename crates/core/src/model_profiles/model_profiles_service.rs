use log::debug;
use std::sync::Arc;

use super::model_profiles_model::{ModelProfile, ModelProfileUpdate, NewModelProfile};
use super::model_profiles_traits::{ModelProfileRepository, ModelProfileServiceTrait};
use crate::api_keys::ApiKeyRepository;
use crate::errors::{Error, Result, ValidationError};
use crate::stores::prepare_for_insert;

/// Service for managing a user's model profiles
pub struct ModelProfileService {
    repository: Arc<ModelProfileRepository>,
    api_key_repository: Arc<ApiKeyRepository>,
}

impl ModelProfileService {
    pub fn new(
        repository: Arc<ModelProfileRepository>,
        api_key_repository: Arc<ApiKeyRepository>,
    ) -> Self {
        Self {
            repository,
            api_key_repository,
        }
    }

    /// A linked key must belong to the same user.
    fn check_api_key_link(&self, user_id: &str, api_key_id: Option<&str>) -> Result<()> {
        let Some(key_id) = api_key_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return Ok(());
        };
        match self.api_key_repository.get_for_user(user_id, key_id)? {
            Some(_) => Ok(()),
            None => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "API key '{}' does not exist",
                key_id
            )))),
        }
    }
}

#[async_trait::async_trait]
impl ModelProfileServiceTrait for ModelProfileService {
    fn list_profiles(&self, user_id: &str) -> Result<Vec<ModelProfile>> {
        self.repository.list_for_user(user_id)
    }

    fn get_profile(&self, user_id: &str, id: &str) -> Result<ModelProfile> {
        self.repository
            .get_for_user(user_id, id)?
            .ok_or_else(|| Error::not_found(format!("model profile {}", id)))
    }

    async fn create_profile(
        &self,
        user_id: &str,
        new_profile: NewModelProfile,
    ) -> Result<ModelProfile> {
        new_profile.validate()?;
        self.check_api_key_link(user_id, new_profile.api_key_id.as_deref())?;
        let profile = prepare_for_insert(ModelProfile::from(new_profile), user_id);
        debug!(
            "Creating model profile {} ({}) for user {}",
            profile.id, profile.provider, user_id
        );
        self.repository.insert(profile).await
    }

    async fn update_profile(
        &self,
        user_id: &str,
        id: &str,
        update: ModelProfileUpdate,
    ) -> Result<ModelProfile> {
        update.validate()?;
        self.check_api_key_link(user_id, update.api_key_id.as_deref())?;
        self.repository.update(user_id, id, update).await
    }

    async fn delete_profile(&self, user_id: &str, id: &str) -> Result<()> {
        match self.repository.delete(user_id, id).await? {
            0 => Err(Error::not_found(format!("model profile {}", id))),
            _ => Ok(()),
        }
    }
}
