//! Chat sessions module - append-only conversation history.

mod chat_sessions_model;
mod chat_sessions_service;
mod chat_sessions_traits;

pub use chat_sessions_model::{
    ChatMessage, ChatRole, ChatSession, ChatSessionUpdate, NewChatSession,
};
pub use chat_sessions_service::ChatSessionService;
pub use chat_sessions_traits::{ChatSessionRepositoryTrait, ChatSessionServiceTrait};

use crate::stores::InMemoryRepository;

impl ChatSessionRepositoryTrait for InMemoryRepository<ChatSession> {}
