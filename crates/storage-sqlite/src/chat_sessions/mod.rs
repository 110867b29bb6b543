//! SQLite storage implementation for chat sessions and their messages.

mod model;
mod repository;

pub use model::{ChatMessageDB, ChatSessionDB};
pub use repository::ChatSessionRepository;

// Re-export trait from core for convenience
pub use bigstep_core::chat_sessions::ChatSessionRepositoryTrait;
