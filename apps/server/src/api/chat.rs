use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bigstep_ai::{ChatReply, ChatRequest, GENERIC_FAILURE_REPLY};
use bigstep_core::chat_sessions::{ChatMessage, ChatRole};
use bigstep_core::users::User;

use crate::{auth::CurrentUser, main_lib::AppState};

/// Every outcome answers `{reply}`; failures carry a readable reply and the
/// matching status.
async fn chat(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!("Rejected chat body: {}", rejection);
            return (StatusCode::BAD_REQUEST, Json(ChatReply::new(GENERIC_FAILURE_REPLY)))
                .into_response();
        }
    };

    match state.relay.relay(user.as_ref(), &request).await {
        Ok(reply) => {
            if let (Some(user), Some(session_id)) = (user.as_ref(), request.session_id.as_deref()) {
                record_exchange(&state, user, session_id, &request.prompt, &reply.reply).await;
            }
            (StatusCode::OK, Json(reply)).into_response()
        }
        Err(e) => {
            tracing::warn!("Chat relay failed ({}): {}", e.code(), e);
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(ChatReply::new(e.reply()))).into_response()
        }
    }
}

/// The reply is already in hand; a failed append is logged, not surfaced.
async fn record_exchange(
    state: &AppState,
    user: &User,
    session_id: &str,
    prompt: &str,
    reply: &str,
) {
    let messages = vec![
        ChatMessage::new(ChatRole::User, prompt),
        ChatMessage::new(ChatRole::Assistant, reply),
    ];
    if let Err(e) = state
        .chat_session_service
        .append_messages(&user.id, session_id, messages)
        .await
    {
        tracing::warn!("Failed to record exchange in session {}: {}", session_id, e);
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(chat))
}
