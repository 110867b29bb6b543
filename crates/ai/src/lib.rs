//! Bigstep AI - model registry and chat relay.
//!
//! # Architecture
//!
//! - `registry`: Static model catalog with in-memory prompt overrides
//! - `relay`: Resolves the caller's model profile and forwards the chat turn
//! - `openai`: OpenAI-compatible chat-completions client
//! - `provider`: Closed set of upstream providers
//! - `env`: Environment abstraction over repositories, client and config
//! - `types`: Request/response DTOs shared with the server
//!
//! # Example
//!
//! ```ignore
//! use bigstep_ai::{ChatRelayService, ChatRequest};
//!
//! let relay = ChatRelayService::new(Arc::new(env));
//! let reply = relay.relay(Some(&user), &ChatRequest {
//!     prompt: "Hi".to_string(),
//!     model_id: "gpt-4".to_string(),
//!     ..Default::default()
//! }).await?;
//! ```

pub mod env;
pub mod error;
pub mod openai;
pub mod provider;
pub mod registry;
pub mod relay;
pub mod types;

pub use env::{RelayConfig, RelayEnvironment};
pub use error::{RelayError, GENERIC_FAILURE_REPLY};
pub use openai::{CompletionClientTrait, OpenAiClient, DEFAULT_OPENAI_API_URL};
pub use provider::Provider;
pub use registry::{ModelEntry, ModelRegistry};
pub use relay::{ChatRelayService, PLACEHOLDER_REPLY};
pub use types::{ChatCompletionRequest, ChatReply, ChatRequest, CompletionMessage, HistoryMessage};
