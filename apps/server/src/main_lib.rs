use std::sync::Arc;

use crate::config::{Config, LogFormat};
use crate::identity::{AnonymousIdentityProvider, HttpIdentityProvider};
use bigstep_ai::{
    ChatRelayService, CompletionClientTrait, ModelRegistry, OpenAiClient, RelayConfig,
    RelayEnvironment,
};
use bigstep_core::{
    api_keys::{ApiKeyRepository, ApiKeyService, ApiKeyServiceTrait},
    chat_sessions::{ChatSessionService, ChatSessionServiceTrait},
    model_profiles::{ModelProfileRepository, ModelProfileService, ModelProfileServiceTrait},
    users::IdentityProviderTrait,
};
use bigstep_storage_sqlite as storage;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Everything the relay needs, wired over the SQLite repositories.
pub struct ServerRelayEnvironment {
    profiles: Arc<ModelProfileRepository>,
    api_keys: Arc<ApiKeyRepository>,
    client: Arc<dyn CompletionClientTrait>,
    registry: Arc<ModelRegistry>,
    config: RelayConfig,
}

impl RelayEnvironment for ServerRelayEnvironment {
    fn profile_repository(&self) -> Arc<ModelProfileRepository> {
        self.profiles.clone()
    }

    fn api_key_repository(&self) -> Arc<ApiKeyRepository> {
        self.api_keys.clone()
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

pub struct AppState {
    pub identity: Arc<dyn IdentityProviderTrait>,
    pub api_key_service: Arc<dyn ApiKeyServiceTrait>,
    pub model_profile_service: Arc<dyn ModelProfileServiceTrait>,
    pub chat_session_service: Arc<dyn ChatSessionServiceTrait>,
    pub registry: Arc<ModelRegistry>,
    pub relay: ChatRelayService<ServerRelayEnvironment>,
}

pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    // try_init: tests build several routers in one process.
    let _ = match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init(),
        LogFormat::Text => registry.with(fmt::layer()).try_init(),
    };
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let (pool, writer) = storage::open(&config.db_path)?;
    tracing::info!("Database path in use: {}", config.db_path);

    let api_key_repo: Arc<ApiKeyRepository> =
        Arc::new(storage::ApiKeyRepository::new(pool.clone(), writer.clone()));
    let profile_repo: Arc<ModelProfileRepository> =
        Arc::new(storage::ModelProfileRepository::new(pool.clone(), writer.clone()));
    let chat_session_repo = Arc::new(storage::ChatSessionRepository::new(pool, writer));

    let identity: Arc<dyn IdentityProviderTrait> = match &config.identity_url {
        Some(url) => Arc::new(HttpIdentityProvider::new(
            url.clone(),
            config.identity_anon_key.clone(),
        )),
        None => {
            tracing::warn!("No identity service configured; all requests are anonymous");
            Arc::new(AnonymousIdentityProvider)
        }
    };

    let registry = Arc::new(ModelRegistry::new());
    let relay_env = ServerRelayEnvironment {
        profiles: profile_repo.clone(),
        api_keys: api_key_repo.clone(),
        client: Arc::new(OpenAiClient::new(
            config.openai_api_url.clone(),
            config.upstream_timeout,
        )),
        registry: registry.clone(),
        config: RelayConfig {
            default_model_id: config.default_model_id.clone(),
            openai_api_key: config.openai_api_key.clone(),
            ..Default::default()
        },
    };

    Ok(Arc::new(AppState {
        identity,
        api_key_service: Arc::new(ApiKeyService::new(api_key_repo.clone())),
        model_profile_service: Arc::new(ModelProfileService::new(profile_repo, api_key_repo)),
        chat_session_service: Arc::new(ChatSessionService::new(chat_session_repo)),
        registry,
        relay: ChatRelayService::new(Arc::new(relay_env)),
    }))
}
