//! SQLite storage implementation for model profiles.

mod model;
mod repository;

pub use model::ModelProfileDB;
pub use repository::ModelProfileRepository;
