use log::{debug, info};
use std::sync::Arc;

use super::chat_sessions_model::{ChatMessage, ChatSession, ChatSessionUpdate, NewChatSession};
use super::chat_sessions_traits::{ChatSessionRepositoryTrait, ChatSessionServiceTrait};
use crate::errors::{Error, Result};
use crate::stores::prepare_for_insert;

/// Service for a user's chat history
pub struct ChatSessionService {
    repository: Arc<dyn ChatSessionRepositoryTrait>,
}

impl ChatSessionService {
    pub fn new(repository: Arc<dyn ChatSessionRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait::async_trait]
impl ChatSessionServiceTrait for ChatSessionService {
    fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>> {
        self.repository.list_for_user(user_id)
    }

    fn get_session(&self, user_id: &str, id: &str) -> Result<ChatSession> {
        self.repository
            .get_for_user(user_id, id)?
            .ok_or_else(|| Error::not_found(format!("chat session {}", id)))
    }

    async fn create_session(
        &self,
        user_id: &str,
        new_session: NewChatSession,
    ) -> Result<ChatSession> {
        new_session.validate()?;
        let session = prepare_for_insert(ChatSession::from(new_session), user_id);
        debug!("Starting chat session {} on {}", session.id, session.model_id);
        self.repository.insert(session).await
    }

    async fn update_session(
        &self,
        user_id: &str,
        id: &str,
        update: ChatSessionUpdate,
    ) -> Result<ChatSession> {
        update.validate()?;
        self.repository.update(user_id, id, update).await
    }

    async fn append_messages(
        &self,
        user_id: &str,
        id: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatSession> {
        self.repository
            .update(user_id, id, ChatSessionUpdate::append(messages))
            .await
    }

    async fn delete_session(&self, user_id: &str, id: &str) -> Result<()> {
        match self.repository.delete(user_id, id).await? {
            0 => Err(Error::not_found(format!("chat session {}", id))),
            _ => Ok(()),
        }
    }

    async fn clear_sessions(&self, user_id: &str) -> Result<usize> {
        let removed = self.repository.delete_all_for_user(user_id).await?;
        info!("Cleared {} chat sessions for user {}", removed, user_id);
        Ok(removed)
    }
}
