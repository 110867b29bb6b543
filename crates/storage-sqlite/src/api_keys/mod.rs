//! SQLite storage implementation for API keys.

mod model;
mod repository;

pub use model::ApiKeyDB;
pub use repository::ApiKeyRepository;
