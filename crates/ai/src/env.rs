//! Environment abstraction for the chat relay.
//!
//! The server implements `RelayEnvironment` over its SQLite repositories and
//! the shared registry; tests implement it with in-memory fakes.

use std::sync::Arc;

use bigstep_core::api_keys::ApiKeyRepository;
use bigstep_core::model_profiles::ModelProfileRepository;

use crate::openai::CompletionClientTrait;
use crate::registry::ModelRegistry;

/// Relay settings resolved from configuration at startup.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub default_model_id: String,
    pub temperature: f32,
    /// Used when a profile has no linked API key.
    pub openai_api_key: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            default_model_id: bigstep_core::constants::DEFAULT_MODEL_ID.to_string(),
            temperature: 0.6,
            openai_api_key: None,
        }
    }
}

pub trait RelayEnvironment: Send + Sync {
    fn profile_repository(&self) -> Arc<ModelProfileRepository>;

    fn api_key_repository(&self) -> Arc<ApiKeyRepository>;

    fn completion_client(&self) -> Arc<dyn CompletionClientTrait>;

    fn registry(&self) -> Arc<ModelRegistry>;

    fn config(&self) -> &RelayConfig;
}
