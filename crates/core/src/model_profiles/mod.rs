//! Model profiles module - per-user model configuration.

mod model_profiles_model;
mod model_profiles_service;
mod model_profiles_traits;

pub use model_profiles_model::{
    normalize_system_prompt, ModelProfile, ModelProfileUpdate, NewModelProfile,
};
pub use model_profiles_service::ModelProfileService;
pub use model_profiles_traits::{ModelProfileRepository, ModelProfileServiceTrait};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_keys::{ApiKeyRecord, ApiKeyService, ApiKeyServiceTrait, NewApiKey};
    use crate::constants::DEFAULT_SYSTEM_PROMPT;
    use crate::errors::{Error, ValidationError};
    use crate::stores::{InMemoryRepository, LocalStore, MemoryLocalStorage, UserScopedStore};
    use std::sync::Arc;

    fn services() -> (ModelProfileService, ApiKeyService) {
        let keys = Arc::new(InMemoryRepository::<ApiKeyRecord>::new());
        let profiles = Arc::new(InMemoryRepository::<ModelProfile>::new());
        (
            ModelProfileService::new(profiles, keys.clone()),
            ApiKeyService::new(keys),
        )
    }

    fn new_profile(id: &str, provider: &str) -> NewModelProfile {
        NewModelProfile {
            id: Some(id.to_string()),
            name: format!("{} profile", id),
            description: None,
            api_key_id: None,
            provider: provider.to_string(),
            system_prompt: None,
            model: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_system_prompt() {
        let (service, _) = services();
        let profile = service
            .create_profile("u1", new_profile("gpt-4", "openai"))
            .await
            .unwrap();
        assert_eq!(profile.id, "gpt-4");
        assert_eq!(profile.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(profile.user_id, "u1");
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_provider_and_blank_name() {
        let (service, _) = services();
        let err = service
            .create_profile("u1", new_profile("m", "geminix"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::UnsupportedProvider(_))
        ));

        let mut blank = new_profile("m", "openai");
        blank.name = "  ".to_string();
        assert!(service.create_profile("u1", blank).await.is_err());
    }

    #[tokio::test]
    async fn test_same_id_for_two_users() {
        let (service, _) = services();
        service
            .create_profile("u1", new_profile("gpt-4", "openai"))
            .await
            .unwrap();
        service
            .create_profile("u2", new_profile("gpt-4", "openai"))
            .await
            .unwrap();

        let dup = service
            .create_profile("u1", new_profile("gpt-4", "openai"))
            .await
            .unwrap_err();
        assert!(matches!(dup, Error::Database(_)));
        assert_eq!(service.list_profiles("u1").unwrap().len(), 1);
        assert_eq!(service.list_profiles("u2").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_api_key_link_must_belong_to_user() {
        let (service, keys) = services();
        let key = keys
            .create_api_key(
                "u1",
                NewApiKey {
                    id: None,
                    provider: "openai".to_string(),
                    key: "sk-1".to_string(),
                },
            )
            .await
            .unwrap();

        let mut linked = new_profile("gpt-4", "openai");
        linked.api_key_id = Some(key.id.clone());
        assert!(service.create_profile("u2", linked.clone()).await.is_err());
        let profile = service.create_profile("u1", linked).await.unwrap();
        assert_eq!(profile.api_key_id.as_deref(), Some(key.id.as_str()));
    }

    #[tokio::test]
    async fn test_update_changes_only_patched_fields() {
        let (service, _) = services();
        let mut input = new_profile("gpt-4", "openai");
        input.system_prompt = Some("Be terse.".to_string());
        input.model = Some("gpt-4-0613".to_string());
        let created = service.create_profile("u1", input).await.unwrap();

        let updated = service
            .update_profile(
                "u1",
                "gpt-4",
                ModelProfileUpdate {
                    name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.system_prompt, "Be terse.");
        assert_eq!(updated.model, created.model);
        assert_eq!(updated.provider, "openai");

        let cleared = service
            .update_profile(
                "u1",
                "gpt-4",
                ModelProfileUpdate {
                    system_prompt: Some("".to_string()),
                    model: Some("".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(cleared.model, None);

        assert!(service
            .update_profile("u2", "gpt-4", ModelProfileUpdate::default())
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_local_store_appends_profiles() {
        let store: LocalStore<ModelProfile> =
            LocalStore::new(Arc::new(MemoryLocalStorage::new()));
        store
            .add(ModelProfile::from(new_profile("first", "openai")))
            .await
            .unwrap();
        store
            .add(ModelProfile::from(new_profile("second", "gemini")))
            .await
            .unwrap();
        let ids: Vec<String> = store.list().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }
}
