use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use bigstep_core::session::SessionAdapter;
use bigstep_core::users::{AuthEvent, AuthSession, User};
use serde::Deserialize;

use crate::{
    auth::{AuthUser, CookieTransport},
    error::ApiError,
    main_lib::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    refresh_token: String,
}

/// Validate the tokens with the identity service and mirror them into the
/// session cookies. Invalid tokens expire both cookies.
async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<SignInRequest>,
) -> Response {
    let transport = Arc::new(CookieTransport::new(jar));
    let adapter = SessionAdapter::new(state.identity.clone(), transport.clone());
    let session = AuthSession::new(body.access_token, body.refresh_token);
    adapter
        .handle_auth_state_change(AuthEvent::SignedIn, Some(session))
        .await;

    match adapter.current_user() {
        Some(user) => (transport.jar(), Json(user)).into_response(),
        None => (transport.jar(), ApiError::unauthorized()).into_response(),
    }
}

async fn sign_out(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let transport = Arc::new(CookieTransport::new(jar));
    let adapter = SessionAdapter::new(state.identity.clone(), transport.clone());
    adapter
        .handle_auth_state_change(AuthEvent::SignedOut, None)
        .await;
    (transport.jar(), StatusCode::NO_CONTENT)
}

async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/session", post(sign_in).delete(sign_out))
        .route("/auth/me", get(me))
}
