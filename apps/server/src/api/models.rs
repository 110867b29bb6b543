use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use bigstep_ai::ModelEntry;
use serde::{Deserialize, Serialize};

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Debug, Serialize, Deserialize)]
struct PromptBody {
    prompt: String,
}

async fn list_models(State(state): State<Arc<AppState>>) -> Json<Vec<ModelEntry>> {
    Json(state.registry.list_models().to_vec())
}

async fn get_prompt(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PromptBody>> {
    state.registry.get_model(&id).ok_or(ApiError::NotFound)?;
    Ok(Json(PromptBody {
        prompt: state.registry.get_prompt_for_model(&id),
    }))
}

async fn set_prompt(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(body): Json<PromptBody>,
) -> ApiResult<Json<PromptBody>> {
    state.registry.get_model(&id).ok_or(ApiError::NotFound)?;
    tracing::info!("User {} overrode the prompt for model {}", user.id, id);
    state.registry.set_prompt_for_model(&id, body.prompt);
    Ok(Json(PromptBody {
        prompt: state.registry.get_prompt_for_model(&id),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/models", get(list_models))
        .route("/models/{id}/prompt", get(get_prompt).put(set_prompt))
}
