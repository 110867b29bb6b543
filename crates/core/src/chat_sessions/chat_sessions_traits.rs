use crate::chat_sessions::chat_sessions_model::{
    ChatMessage, ChatSession, ChatSessionUpdate, NewChatSession,
};
use crate::errors::Result;
use crate::stores::UserScopedRepository;
use async_trait::async_trait;

/// Trait for chat session repository operations
#[async_trait]
pub trait ChatSessionRepositoryTrait: UserScopedRepository<ChatSession> {
    /// Remove every session the user owns, returning how many went away.
    async fn delete_all_for_user(&self, user_id: &str) -> Result<usize> {
        let mut removed = 0;
        for session in self.list_for_user(user_id)? {
            removed += self.delete(user_id, &session.id).await?;
        }
        Ok(removed)
    }
}

/// Trait for chat session service operations
#[async_trait]
pub trait ChatSessionServiceTrait: Send + Sync {
    fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>>;
    fn get_session(&self, user_id: &str, id: &str) -> Result<ChatSession>;
    async fn create_session(
        &self,
        user_id: &str,
        new_session: NewChatSession,
    ) -> Result<ChatSession>;
    async fn update_session(
        &self,
        user_id: &str,
        id: &str,
        update: ChatSessionUpdate,
    ) -> Result<ChatSession>;
    async fn append_messages(
        &self,
        user_id: &str,
        id: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatSession>;
    async fn delete_session(&self, user_id: &str, id: &str) -> Result<()>;
    async fn clear_sessions(&self, user_id: &str) -> Result<usize>;
}
