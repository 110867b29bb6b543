use crate::errors::Result;
use crate::model_profiles::model_profiles_model::{
    ModelProfile, ModelProfileUpdate, NewModelProfile,
};
use crate::stores::UserScopedRepository;
use async_trait::async_trait;

/// Repository for model profile rows, keyed by `(user_id, id)`.
pub type ModelProfileRepository = dyn UserScopedRepository<ModelProfile>;

/// Trait for model profile service operations
#[async_trait]
pub trait ModelProfileServiceTrait: Send + Sync {
    fn list_profiles(&self, user_id: &str) -> Result<Vec<ModelProfile>>;
    fn get_profile(&self, user_id: &str, id: &str) -> Result<ModelProfile>;
    async fn create_profile(
        &self,
        user_id: &str,
        new_profile: NewModelProfile,
    ) -> Result<ModelProfile>;
    async fn update_profile(
        &self,
        user_id: &str,
        id: &str,
        update: ModelProfileUpdate,
    ) -> Result<ModelProfile>;
    async fn delete_profile(&self, user_id: &str, id: &str) -> Result<()>;
}
