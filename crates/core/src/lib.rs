//! Bigstep Core - Domain entities, services, and traits.
//!
//! This crate contains the domain logic of the chat relay: users and the
//! session adapter, the user-scoped store pattern, and the API-key, model
//! profile and chat session records. It is storage-agnostic and defines
//! traits that are implemented by the `storage-sqlite` crate.

pub mod api_keys;
pub mod chat_sessions;
pub mod constants;
pub mod errors;
pub mod model_profiles;
pub mod session;
pub mod stores;
pub mod users;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
