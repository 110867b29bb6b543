//! SQLite storage implementation for the Bigstep chat relay.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `bigstep-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for API keys, model profiles and chat sessions
//! - Database-specific model types (with Diesel derives)
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! Reads go through the r2d2 pool; writes are serialized through a single
//! writer task that owns one connection.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod api_keys;
pub mod chat_sessions;
pub mod model_profiles;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, open, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use api_keys::ApiKeyRepository;
pub use chat_sessions::ChatSessionRepository;
pub use model_profiles::ModelProfileRepository;

// Re-export from bigstep-core for convenience
pub use bigstep_core::errors::{DatabaseError, Error, Result};
