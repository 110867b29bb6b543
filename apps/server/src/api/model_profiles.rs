use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bigstep_core::model_profiles::{ModelProfile, ModelProfileUpdate, NewModelProfile};

use crate::{auth::AuthUser, error::ApiResult, main_lib::AppState};

async fn list_profiles(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<ModelProfile>>> {
    Ok(Json(state.model_profile_service.list_profiles(&user.id)?))
}

async fn create_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<NewModelProfile>,
) -> ApiResult<Json<ModelProfile>> {
    let created = state
        .model_profile_service
        .create_profile(&user.id, payload)
        .await?;
    Ok(Json(created))
}

async fn get_profile(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<ModelProfile>> {
    Ok(Json(state.model_profile_service.get_profile(&user.id, &id)?))
}

async fn update_profile(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ModelProfileUpdate>,
) -> ApiResult<Json<ModelProfile>> {
    let updated = state
        .model_profile_service
        .update_profile(&user.id, &id, payload)
        .await?;
    Ok(Json(updated))
}

async fn delete_profile(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<StatusCode> {
    state.model_profile_service.delete_profile(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/model-profiles", get(list_profiles).post(create_profile))
        .route(
            "/model-profiles/{id}",
            get(get_profile).patch(update_profile).delete(delete_profile),
        )
}
