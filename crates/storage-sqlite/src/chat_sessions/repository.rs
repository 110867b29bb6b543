use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;

use bigstep_core::chat_sessions::{ChatSession, ChatSessionRepositoryTrait, ChatSessionUpdate};
use bigstep_core::stores::{ScopedRecord, UserScopedRepository};
use bigstep_core::{Error, Result};

use super::model::{messages_to_db, ChatMessageDB, ChatSessionDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{chat_messages, chat_sessions};
use crate::utils::chunk_for_sqlite;

pub struct ChatSessionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ChatSessionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ChatSessionRepository { pool, writer }
    }
}

/// Attach ordered messages to each session header.
fn with_messages(
    conn: &mut SqliteConnection,
    headers: Vec<ChatSessionDB>,
) -> Result<Vec<ChatSession>> {
    let mut sessions = Vec::with_capacity(headers.len());
    for chunk in chunk_for_sqlite(&headers) {
        let messages = ChatMessageDB::belonging_to(chunk)
            .order((chat_messages::session_id.asc(), chat_messages::position.asc()))
            .load::<ChatMessageDB>(conn)
            .map_err(StorageError::from)?;
        let grouped = messages.grouped_by(chunk);
        sessions.extend(
            chunk
                .iter()
                .cloned()
                .zip(grouped)
                .map(|(header, messages)| header.into_domain(messages)),
        );
    }
    Ok(sessions)
}

fn find_owned(
    conn: &mut SqliteConnection,
    owner: &str,
    session_id: &str,
) -> Result<Option<ChatSession>> {
    let header = chat_sessions::table
        .filter(chat_sessions::user_id.eq(owner))
        .filter(chat_sessions::id.eq(session_id))
        .first::<ChatSessionDB>(conn)
        .optional()
        .map_err(StorageError::from)?;
    match header {
        Some(header) => Ok(with_messages(conn, vec![header])?.pop()),
        None => Ok(None),
    }
}

fn delete_sessions(conn: &mut SqliteConnection, ids: &[String]) -> Result<usize> {
    let mut removed = 0;
    for chunk in chunk_for_sqlite(ids) {
        diesel::delete(chat_messages::table.filter(chat_messages::session_id.eq_any(chunk)))
            .execute(conn)
            .map_err(StorageError::from)?;
        removed += diesel::delete(chat_sessions::table.filter(chat_sessions::id.eq_any(chunk)))
            .execute(conn)
            .map_err(StorageError::from)?;
    }
    Ok(removed)
}

#[async_trait]
impl UserScopedRepository<ChatSession> for ChatSessionRepository {
    /// Newest session first; messages in the order they were appended.
    fn list_for_user(&self, owner: &str) -> Result<Vec<ChatSession>> {
        let mut conn = get_connection(&self.pool)?;
        let headers = chat_sessions::table
            .filter(chat_sessions::user_id.eq(owner))
            .order((chat_sessions::started_at.desc(), chat_sessions::id.desc()))
            .load::<ChatSessionDB>(&mut conn)
            .map_err(StorageError::from)?;
        with_messages(&mut conn, headers)
    }

    fn get_for_user(&self, owner: &str, session_id: &str) -> Result<Option<ChatSession>> {
        let mut conn = get_connection(&self.pool)?;
        find_owned(&mut conn, owner, session_id)
    }

    async fn insert(&self, session: ChatSession) -> Result<ChatSession> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ChatSession> {
                diesel::insert_into(chat_sessions::table)
                    .values(ChatSessionDB::from(&session))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                let rows = messages_to_db(&session.id, 0, &session.messages);
                if !rows.is_empty() {
                    diesel::insert_into(chat_messages::table)
                        .values(&rows)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(session)
            })
            .await
    }

    async fn update(
        &self,
        owner: &str,
        session_id: &str,
        patch: ChatSessionUpdate,
    ) -> Result<ChatSession> {
        let owner = owner.to_string();
        let session_id = session_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ChatSession> {
                let mut session = find_owned(conn, &owner, &session_id)?
                    .ok_or_else(|| Error::not_found(format!("chat session {}", session_id)))?;
                let existing = session.messages.len();
                session.apply_patch(patch);

                diesel::update(chat_sessions::table.find(&session.id))
                    .set(&ChatSessionDB::from(&session))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let appended = messages_to_db(&session.id, existing, &session.messages[existing..]);
                if !appended.is_empty() {
                    diesel::insert_into(chat_messages::table)
                        .values(&appended)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(session)
            })
            .await
    }

    async fn delete(&self, owner: &str, session_id: &str) -> Result<usize> {
        let owner = owner.to_string();
        let session_id = session_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let owned = chat_sessions::table
                    .filter(chat_sessions::user_id.eq(&owner))
                    .filter(chat_sessions::id.eq(&session_id))
                    .select(chat_sessions::id)
                    .load::<String>(conn)
                    .map_err(StorageError::from)?;
                delete_sessions(conn, &owned)
            })
            .await
    }
}

#[async_trait]
impl ChatSessionRepositoryTrait for ChatSessionRepository {
    async fn delete_all_for_user(&self, owner: &str) -> Result<usize> {
        let owner = owner.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let owned = chat_sessions::table
                    .filter(chat_sessions::user_id.eq(&owner))
                    .select(chat_sessions::id)
                    .load::<String>(conn)
                    .map_err(StorageError::from)?;
                delete_sessions(conn, &owned)
            })
            .await
    }
}
