use crate::api_keys::api_keys_model::{ApiKeyRecord, ApiKeyUpdate, NewApiKey};
use crate::errors::Result;
use crate::stores::UserScopedRepository;
use async_trait::async_trait;

/// Repository for API key rows.
pub type ApiKeyRepository = dyn UserScopedRepository<ApiKeyRecord>;

/// Trait for API key service operations
#[async_trait]
pub trait ApiKeyServiceTrait: Send + Sync {
    fn list_api_keys(&self, user_id: &str) -> Result<Vec<ApiKeyRecord>>;
    fn get_api_key(&self, user_id: &str, id: &str) -> Result<ApiKeyRecord>;
    async fn create_api_key(&self, user_id: &str, new_key: NewApiKey) -> Result<ApiKeyRecord>;
    async fn update_api_key(
        &self,
        user_id: &str,
        id: &str,
        update: ApiKeyUpdate,
    ) -> Result<ApiKeyRecord>;
    async fn delete_api_key(&self, user_id: &str, id: &str) -> Result<()>;
}
