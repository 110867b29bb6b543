//! Chat relay: resolves the caller's model profile and forwards the
//! conversation to the profile's provider.

use log::{debug, info, warn};
use std::sync::Arc;

use bigstep_core::constants::DEFAULT_SYSTEM_PROMPT;
use bigstep_core::model_profiles::ModelProfile;
use bigstep_core::users::User;

use crate::env::RelayEnvironment;
use crate::error::RelayError;
use crate::provider::Provider;
use crate::types::{ChatCompletionRequest, ChatReply, ChatRequest, CompletionMessage};

/// Reply used when the upstream answered but carried no content.
pub const PLACEHOLDER_REPLY: &str = "...";

pub struct ChatRelayService<E: RelayEnvironment + 'static> {
    env: Arc<E>,
}

impl<E: RelayEnvironment + 'static> ChatRelayService<E> {
    pub fn new(env: Arc<E>) -> Self {
        Self { env }
    }

    /// Relay one chat turn for `user`.
    ///
    /// No upstream call is made unless a user is present, a profile exists for
    /// the requested model id and its provider is implemented.
    pub async fn relay(
        &self,
        user: Option<&User>,
        request: &ChatRequest,
    ) -> Result<ChatReply, RelayError> {
        let user = user.ok_or(RelayError::Unauthenticated)?;
        let model_id = self.normalize_model_id(&request.model_id);

        let profile = self
            .env
            .profile_repository()
            .get_for_user(&user.id, &model_id)?
            .ok_or_else(|| RelayError::ProfileNotFound(model_id.clone()))?;

        let system_prompt = resolve_system_prompt(request.custom_prompt.as_deref(), &profile);

        match Provider::from_tag(&profile.provider)? {
            Provider::OpenAi => self.relay_openai(user, &profile, system_prompt, request).await,
            Provider::Gemini => Err(RelayError::ProviderNotImplemented(
                Provider::Gemini.as_str().to_string(),
            )),
        }
    }

    fn normalize_model_id(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.env.config().default_model_id.clone()
        } else {
            trimmed.to_string()
        }
    }

    async fn relay_openai(
        &self,
        user: &User,
        profile: &ModelProfile,
        system_prompt: String,
        request: &ChatRequest,
    ) -> Result<ChatReply, RelayError> {
        let api_key = self.resolve_api_key(user, profile)?;
        let completion = ChatCompletionRequest {
            model: self.resolve_upstream_model(profile),
            messages: build_messages(system_prompt, request),
            temperature: self.env.config().temperature,
        };

        info!(
            "Relaying chat for user {} to openai model {}",
            user.id, completion.model
        );
        let content = self
            .env
            .completion_client()
            .complete(&api_key, &completion)
            .await?;

        Ok(ChatReply::new(content.unwrap_or_else(|| {
            warn!("Upstream reply had no content, answering with placeholder");
            PLACEHOLDER_REPLY.to_string()
        })))
    }

    /// Profile model, then the catalog entry for the profile id, then the id.
    fn resolve_upstream_model(&self, profile: &ModelProfile) -> String {
        if let Some(model) = profile.model.as_deref().filter(|m| !m.trim().is_empty()) {
            return model.to_string();
        }
        self.env
            .registry()
            .get_model(&profile.id)
            .map(|entry| entry.model.clone())
            .unwrap_or_else(|| profile.id.clone())
    }

    fn resolve_api_key(&self, user: &User, profile: &ModelProfile) -> Result<String, RelayError> {
        if let Some(key_id) = profile.api_key_id.as_deref() {
            match self.env.api_key_repository().get_for_user(&user.id, key_id)? {
                Some(record) if !record.key.trim().is_empty() => return Ok(record.key),
                _ => debug!(
                    "Linked API key {} unavailable for profile {}, using configured key",
                    key_id, profile.id
                ),
            }
        }
        self.env
            .config()
            .openai_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| RelayError::MissingApiKey(Provider::OpenAi.as_str().to_string()))
    }
}

/// Request prompt, then profile prompt, then the default. Blank values skip.
fn resolve_system_prompt(custom_prompt: Option<&str>, profile: &ModelProfile) -> String {
    custom_prompt
        .filter(|p| !p.trim().is_empty())
        .or_else(|| Some(profile.system_prompt.as_str()).filter(|p| !p.trim().is_empty()))
        .unwrap_or(DEFAULT_SYSTEM_PROMPT)
        .to_string()
}

fn build_messages(system_prompt: String, request: &ChatRequest) -> Vec<CompletionMessage> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    messages.push(CompletionMessage::new("system", system_prompt));
    messages.extend(
        request
            .history
            .iter()
            .map(|m| CompletionMessage::new(m.role.clone(), m.content.clone())),
    );
    messages.push(CompletionMessage::new("user", request.prompt.clone()));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::RelayConfig;
    use crate::openai::CompletionClientTrait;
    use crate::registry::ModelRegistry;
    use crate::types::HistoryMessage;
    use async_trait::async_trait;
    use bigstep_core::api_keys::{ApiKeyRecord, ApiKeyRepository, NewApiKey};
    use bigstep_core::model_profiles::{ModelProfileRepository, NewModelProfile};
    use bigstep_core::stores::{prepare_for_insert, InMemoryRepository, UserScopedRepository};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        calls: Mutex<Vec<(String, ChatCompletionRequest)>>,
        reply: Option<String>,
        fail: bool,
    }

    impl RecordingClient {
        fn replying(reply: Option<&str>) -> Self {
            Self {
                reply: reply.map(str::to_string),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<(String, ChatCompletionRequest)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClientTrait for RecordingClient {
        async fn complete(
            &self,
            api_key: &str,
            request: &ChatCompletionRequest,
        ) -> Result<Option<String>, RelayError> {
            self.calls
                .lock()
                .unwrap()
                .push((api_key.to_string(), request.clone()));
            if self.fail {
                return Err(RelayError::upstream("HTTP 500"));
            }
            Ok(self.reply.clone())
        }
    }

    struct FakeEnv {
        profiles: Arc<InMemoryRepository<ModelProfile>>,
        keys: Arc<InMemoryRepository<ApiKeyRecord>>,
        client: Arc<RecordingClient>,
        registry: Arc<ModelRegistry>,
        config: RelayConfig,
    }

    impl RelayEnvironment for FakeEnv {
        fn profile_repository(&self) -> Arc<ModelProfileRepository> {
            self.profiles.clone()
        }

        fn api_key_repository(&self) -> Arc<ApiKeyRepository> {
            self.keys.clone()
        }

        fn completion_client(&self) -> Arc<dyn CompletionClientTrait> {
            self.client.clone()
        }

        fn registry(&self) -> Arc<ModelRegistry> {
            self.registry.clone()
        }

        fn config(&self) -> &RelayConfig {
            &self.config
        }
    }

    fn env_with(client: RecordingClient) -> Arc<FakeEnv> {
        Arc::new(FakeEnv {
            profiles: Arc::new(InMemoryRepository::<ModelProfile>::new()),
            keys: Arc::new(InMemoryRepository::<ApiKeyRecord>::new()),
            client: Arc::new(client),
            registry: Arc::new(ModelRegistry::new()),
            config: RelayConfig {
                openai_api_key: Some("sk-env".to_string()),
                ..Default::default()
            },
        })
    }

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            name: id.to_string(),
            avatar_url: String::new(),
        }
    }

    fn new_profile(id: &str, provider: &str, prompt: &str, model: Option<&str>) -> NewModelProfile {
        NewModelProfile {
            id: Some(id.to_string()),
            name: id.to_string(),
            description: None,
            api_key_id: None,
            provider: provider.to_string(),
            system_prompt: Some(prompt.to_string()),
            model: model.map(str::to_string),
        }
    }

    async fn add_profile(env: &FakeEnv, owner: &str, profile: NewModelProfile) {
        env.profiles
            .insert(prepare_for_insert(ModelProfile::from(profile), owner))
            .await
            .unwrap();
    }

    fn request(prompt: &str, model_id: &str) -> ChatRequest {
        ChatRequest {
            prompt: prompt.to_string(),
            model_id: model_id.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_anonymous_request_never_reaches_upstream() {
        let env = env_with(RecordingClient::replying(Some("hi")));
        let service = ChatRelayService::new(env.clone());

        let err = service.relay(None, &request("Hi", "gpt-4")).await.unwrap_err();
        assert!(matches!(err, RelayError::Unauthenticated));
        assert_eq!(err.status_code(), 401);
        assert!(env.client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_profile_is_not_found_without_fallback() {
        let env = env_with(RecordingClient::replying(Some("hi")));
        add_profile(&env, "u2", new_profile("gpt-4", "openai", "x", None)).await;
        let service = ChatRelayService::new(env.clone());

        let err = service
            .relay(Some(&user("u1")), &request("Hi", "gpt-4"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::ProfileNotFound(ref id) if id == "gpt-4"));
        assert_eq!(err.status_code(), 404);
        assert!(env.client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_profile_prompt_and_model_are_forwarded() {
        let env = env_with(RecordingClient::replying(Some("Hello!")));
        add_profile(&env, "u1", new_profile("p1", "openai", "Be terse.", Some("gpt-4"))).await;
        let service = ChatRelayService::new(env.clone());

        let reply = service
            .relay(Some(&user("u1")), &request("Hi", "p1"))
            .await
            .unwrap();
        assert_eq!(reply.reply, "Hello!");

        let calls = env.client.calls();
        assert_eq!(calls.len(), 1);
        let (key, sent) = &calls[0];
        assert_eq!(key, "sk-env");
        assert_eq!(sent.model, "gpt-4");
        assert_eq!(
            sent.messages,
            vec![
                CompletionMessage::new("system", "Be terse."),
                CompletionMessage::new("user", "Hi"),
            ]
        );
        assert!((sent.temperature - 0.6).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_custom_prompt_wins_and_history_is_kept_in_order() {
        let env = env_with(RecordingClient::replying(Some("ok")));
        add_profile(&env, "u1", new_profile("p1", "openai", "Be terse.", Some("gpt-4"))).await;
        let service = ChatRelayService::new(env.clone());

        let mut req = request("Third", "p1");
        req.custom_prompt = Some("Override".to_string());
        req.history = vec![
            HistoryMessage {
                role: "user".to_string(),
                content: "First".to_string(),
            },
            HistoryMessage {
                role: "assistant".to_string(),
                content: "Second".to_string(),
            },
        ];
        service.relay(Some(&user("u1")), &req).await.unwrap();

        let sent = &env.client.calls()[0].1;
        let contents: Vec<&str> = sent.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["Override", "First", "Second", "Third"]);
        assert_eq!(sent.messages[2].role, "assistant");
    }

    #[tokio::test]
    async fn test_blank_custom_prompt_falls_back_to_profile() {
        let env = env_with(RecordingClient::replying(Some("ok")));
        add_profile(&env, "u1", new_profile("p1", "openai", "Be terse.", None)).await;
        let service = ChatRelayService::new(env.clone());

        let mut req = request("Hi", "p1");
        req.custom_prompt = Some("   ".to_string());
        service.relay(Some(&user("u1")), &req).await.unwrap();

        assert_eq!(env.client.calls()[0].1.messages[0].content, "Be terse.");
    }

    #[tokio::test]
    async fn test_blank_model_id_uses_default_and_catalog_model() {
        let env = env_with(RecordingClient::replying(Some("ok")));
        add_profile(&env, "u1", new_profile("gpt-3.5-turbo", "openai", "", None)).await;
        let service = ChatRelayService::new(env.clone());

        service
            .relay(Some(&user("u1")), &request("Hi", "  "))
            .await
            .unwrap();

        let sent = &env.client.calls()[0].1;
        assert_eq!(sent.model, "gpt-3.5-turbo");
        assert_eq!(sent.messages[0].content, DEFAULT_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_unknown_model_falls_back_to_profile_id() {
        let env = env_with(RecordingClient::replying(Some("ok")));
        add_profile(&env, "u1", new_profile("gpt-4o-mini", "openai", "x", None)).await;
        let service = ChatRelayService::new(env.clone());

        service
            .relay(Some(&user("u1")), &request("Hi", "gpt-4o-mini"))
            .await
            .unwrap();
        assert_eq!(env.client.calls()[0].1.model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_unsupported_and_unimplemented_providers() {
        let env = env_with(RecordingClient::replying(Some("ok")));
        add_profile(&env, "u1", new_profile("odd", "geminix", "x", None)).await;
        add_profile(&env, "u1", new_profile("gem", "gemini", "x", None)).await;
        let service = ChatRelayService::new(env.clone());

        let err = service
            .relay(Some(&user("u1")), &request("Hi", "odd"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = service
            .relay(Some(&user("u1")), &request("Hi", "gem"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 501);

        assert!(env.client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_linked_key_is_preferred() {
        let env = env_with(RecordingClient::replying(Some("ok")));
        let key = env
            .keys
            .insert(prepare_for_insert(
                ApiKeyRecord::from(NewApiKey {
                    id: None,
                    provider: "openai".to_string(),
                    key: "sk-linked".to_string(),
                }),
                "u1",
            ))
            .await
            .unwrap();
        let mut profile = new_profile("p1", "openai", "x", None);
        profile.api_key_id = Some(key.id.clone());
        add_profile(&env, "u1", profile).await;
        let service = ChatRelayService::new(env.clone());

        service
            .relay(Some(&user("u1")), &request("Hi", "p1"))
            .await
            .unwrap();
        assert_eq!(env.client.calls()[0].0, "sk-linked");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_upstream() {
        let env = Arc::new(FakeEnv {
            profiles: Arc::new(InMemoryRepository::<ModelProfile>::new()),
            keys: Arc::new(InMemoryRepository::<ApiKeyRecord>::new()),
            client: Arc::new(RecordingClient::replying(Some("ok"))),
            registry: Arc::new(ModelRegistry::new()),
            config: RelayConfig::default(),
        });
        add_profile(&env, "u1", new_profile("p1", "openai", "x", None)).await;
        let service = ChatRelayService::new(env.clone());

        let err = service
            .relay(Some(&user("u1")), &request("Hi", "p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::MissingApiKey(_)));
        assert!(env.client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_upstream_content_uses_placeholder() {
        let env = env_with(RecordingClient::replying(None));
        add_profile(&env, "u1", new_profile("p1", "openai", "x", None)).await;
        let service = ChatRelayService::new(env.clone());

        let reply = service
            .relay(Some(&user("u1")), &request("Hi", "p1"))
            .await
            .unwrap();
        assert_eq!(reply.reply, PLACEHOLDER_REPLY);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_not_retried() {
        let env = env_with(RecordingClient {
            fail: true,
            ..Default::default()
        });
        add_profile(&env, "u1", new_profile("p1", "openai", "x", None)).await;
        let service = ChatRelayService::new(env.clone());

        let err = service
            .relay(Some(&user("u1")), &request("Hi", "p1"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(env.client.calls().len(), 1);
    }
}
