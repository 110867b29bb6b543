//! Database models for chat sessions.

use diesel::prelude::*;
use log::warn;
use uuid::Uuid;

use bigstep_core::chat_sessions::{ChatMessage, ChatRole, ChatSession};

use crate::schema::{chat_messages, chat_sessions};
use crate::utils::{from_db_timestamp, to_db_timestamp};

/// Session header row; messages live in `chat_messages`.
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = chat_sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ChatSessionDB {
    pub id: String,
    pub user_id: String,
    pub started_at: String,
    pub model_id: String,
    pub model_name: String,
}

#[derive(Queryable, Identifiable, Insertable, Selectable, Associations, Debug, Clone)]
#[diesel(belongs_to(ChatSessionDB, foreign_key = session_id))]
#[diesel(table_name = chat_messages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ChatMessageDB {
    pub id: String,
    pub session_id: String,
    pub position: i32,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

impl ChatSessionDB {
    pub fn into_domain(self, messages: Vec<ChatMessageDB>) -> ChatSession {
        ChatSession {
            id: self.id,
            started: from_db_timestamp(&self.started_at),
            model_id: self.model_id,
            model_name: self.model_name,
            user_id: self.user_id,
            messages: messages.into_iter().filter_map(message_from_db).collect(),
        }
    }
}

impl From<&ChatSession> for ChatSessionDB {
    fn from(session: &ChatSession) -> Self {
        Self {
            id: session.id.clone(),
            user_id: session.user_id.clone(),
            started_at: to_db_timestamp(&session.started),
            model_id: session.model_id.clone(),
            model_name: session.model_name.clone(),
        }
    }
}

/// Rows with an unknown role are skipped with a warning.
fn message_from_db(db: ChatMessageDB) -> Option<ChatMessage> {
    match db.role.parse::<ChatRole>() {
        Ok(role) => Some(ChatMessage {
            role,
            content: db.content,
            timestamp: from_db_timestamp(&db.created_at),
        }),
        Err(e) => {
            warn!("Skipping message {} in session {}: {}", db.id, db.session_id, e);
            None
        }
    }
}

/// Rows for `messages`, numbered from `first_position`.
pub fn messages_to_db(
    session_id: &str,
    first_position: usize,
    messages: &[ChatMessage],
) -> Vec<ChatMessageDB> {
    messages
        .iter()
        .enumerate()
        .map(|(offset, message)| ChatMessageDB {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            position: (first_position + offset) as i32,
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            created_at: to_db_timestamp(&message.timestamp),
        })
        .collect()
}
