use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bigstep_core::chat_sessions::{ChatMessage, ChatSession, ChatSessionUpdate, NewChatSession};
use serde::{Deserialize, Serialize};

use crate::{auth::AuthUser, error::ApiResult, main_lib::AppState};

#[derive(Debug, Deserialize)]
struct AppendMessagesRequest {
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ClearSessionsResponse {
    removed: usize,
}

async fn list_sessions(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<ChatSession>>> {
    Ok(Json(state.chat_session_service.list_sessions(&user.id)?))
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<NewChatSession>,
) -> ApiResult<Json<ChatSession>> {
    let created = state
        .chat_session_service
        .create_session(&user.id, payload)
        .await?;
    Ok(Json(created))
}

async fn clear_sessions(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<ClearSessionsResponse>> {
    let removed = state.chat_session_service.clear_sessions(&user.id).await?;
    Ok(Json(ClearSessionsResponse { removed }))
}

async fn get_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<ChatSession>> {
    Ok(Json(state.chat_session_service.get_session(&user.id, &id)?))
}

async fn update_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ChatSessionUpdate>,
) -> ApiResult<Json<ChatSession>> {
    let updated = state
        .chat_session_service
        .update_session(&user.id, &id, payload)
        .await?;
    Ok(Json(updated))
}

async fn delete_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<StatusCode> {
    state.chat_session_service.delete_session(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn append_messages(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<AppendMessagesRequest>,
) -> ApiResult<Json<ChatSession>> {
    let updated = state
        .chat_session_service
        .append_messages(&user.id, &id, payload.messages)
        .await?;
    Ok(Json(updated))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/chat-sessions",
            get(list_sessions).post(create_session).delete(clear_sessions),
        )
        .route(
            "/chat-sessions/{id}",
            get(get_session).patch(update_session).delete(delete_session),
        )
        .route("/chat-sessions/{id}/messages", post(append_messages))
}
