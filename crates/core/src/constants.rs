/// System prompt used when neither the request nor the profile supplies one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Model id substituted when a chat request carries a blank model id.
pub const DEFAULT_MODEL_ID: &str = "gpt-3.5-turbo";

/// Prefix of every local-storage key.
pub const STORAGE_KEY_PREFIX: &str = "bigstep";

/// Namespace used for local persistence while nobody is signed in.
pub const GUEST_NAMESPACE: &str = "guest";

/// Cookie carrying the identity service access token.
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";

/// Cookie carrying the identity service refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";

/// Provider tags accepted on model profiles and API keys.
pub const PROVIDER_OPENAI: &str = "openai";
pub const PROVIDER_GEMINI: &str = "gemini";
pub const SUPPORTED_PROVIDERS: &[&str] = &[PROVIDER_OPENAI, PROVIDER_GEMINI];
