use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bigstep_core::api_keys::{ApiKeyRecord, ApiKeyUpdate, NewApiKey};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{auth::AuthUser, error::ApiResult, main_lib::AppState};

/// API keys never leave the server in full.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiKeyView {
    id: String,
    provider: String,
    masked_key: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ApiKeyRecord> for ApiKeyView {
    fn from(record: ApiKeyRecord) -> Self {
        Self {
            masked_key: record.masked_key(),
            id: record.id,
            provider: record.provider,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

async fn list_api_keys(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<ApiKeyView>>> {
    let keys = state.api_key_service.list_api_keys(&user.id)?;
    Ok(Json(keys.into_iter().map(ApiKeyView::from).collect()))
}

async fn create_api_key(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<NewApiKey>,
) -> ApiResult<Json<ApiKeyView>> {
    let created = state.api_key_service.create_api_key(&user.id, payload).await?;
    Ok(Json(ApiKeyView::from(created)))
}

async fn get_api_key(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<ApiKeyView>> {
    let key = state.api_key_service.get_api_key(&user.id, &id)?;
    Ok(Json(ApiKeyView::from(key)))
}

async fn update_api_key(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ApiKeyUpdate>,
) -> ApiResult<Json<ApiKeyView>> {
    let updated = state
        .api_key_service
        .update_api_key(&user.id, &id, payload)
        .await?;
    Ok(Json(ApiKeyView::from(updated)))
}

async fn delete_api_key(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<StatusCode> {
    state.api_key_service.delete_api_key(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api-keys", get(list_api_keys).post(create_api_key))
        .route(
            "/api-keys/{id}",
            get(get_api_key).patch(update_api_key).delete(delete_api_key),
        )
}
