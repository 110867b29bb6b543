//! API keys module - provider credentials owned by a user.

mod api_keys_model;
mod api_keys_service;
mod api_keys_traits;

pub use api_keys_model::{mask_secret, validate_provider, ApiKeyRecord, ApiKeyUpdate, NewApiKey};
pub use api_keys_service::ApiKeyService;
pub use api_keys_traits::{ApiKeyRepository, ApiKeyServiceTrait};
