//! Cookie-based request authentication.
//!
//! `resolve_user` runs on every request: it reads the access token from the
//! `sb-access-token` cookie (or a bearer header), asks the identity service
//! who it belongs to and stores the answer as a `CurrentUser` extension.
//! Handlers then take `AuthUser` when a user is required or `CurrentUser`
//! when anonymous callers get their own answer.

use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{debug, warn};

use bigstep_core::constants::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use bigstep_core::session::TokenTransport;
use bigstep_core::users::User;

use crate::error::ApiError;
use crate::main_lib::AppState;

/// The user bound to this request, if any.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

/// A signed-in user. Extraction fails with 401 otherwise.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

fn bearer_token(request: &Request<Body>) -> Option<String> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

pub async fn resolve_user(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = bearer_token(&request).or_else(|| {
        jar.get(ACCESS_TOKEN_COOKIE)
            .map(|c| c.value().trim().to_string())
            .filter(|v| !v.is_empty())
    });

    let user = match token {
        Some(token) => match state.identity.get_user(&token).await {
            Ok(user) => user,
            Err(e) => {
                warn!("Identity lookup failed, treating request as anonymous: {}", e);
                None
            }
        },
        None => None,
    };
    debug!(
        "Request user: {}",
        user.as_ref().map_or("anonymous", |u| u.id.as_str())
    );

    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or_default())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .and_then(|current| current.0.clone())
            .map(AuthUser)
            .ok_or_else(ApiError::unauthorized)
    }
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn expired_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .expires(time::OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Token transport writing the session cookies into a response jar.
pub struct CookieTransport {
    jar: Mutex<CookieJar>,
}

impl CookieTransport {
    pub fn new(jar: CookieJar) -> Self {
        Self {
            jar: Mutex::new(jar),
        }
    }

    /// Jar to return with the response.
    pub fn jar(&self) -> CookieJar {
        self.jar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, f: impl FnOnce(CookieJar) -> CookieJar) {
        let mut jar = self.jar.lock().unwrap_or_else(PoisonError::into_inner);
        *jar = f(jar.clone());
    }
}

impl TokenTransport for CookieTransport {
    fn store_tokens(&self, access_token: &str, refresh_token: &str) -> bigstep_core::Result<()> {
        let access = session_cookie(ACCESS_TOKEN_COOKIE, access_token.to_string());
        let refresh = session_cookie(REFRESH_TOKEN_COOKIE, refresh_token.to_string());
        self.update(|jar| jar.add(access).add(refresh));
        Ok(())
    }

    fn expire_tokens(&self) -> bigstep_core::Result<()> {
        self.update(|jar| {
            jar.add(expired_cookie(ACCESS_TOKEN_COOKIE))
                .add(expired_cookie(REFRESH_TOKEN_COOKIE))
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_expire_tokens() {
        let transport = CookieTransport::new(CookieJar::new());
        transport.store_tokens("access", "refresh").unwrap();
        let jar = transport.jar();
        let access = jar.get(ACCESS_TOKEN_COOKIE).unwrap();
        assert_eq!(access.value(), "access");
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.same_site(), Some(SameSite::Lax));
        assert_eq!(jar.get(REFRESH_TOKEN_COOKIE).unwrap().value(), "refresh");

        transport.expire_tokens().unwrap();
        let jar = transport.jar();
        let access = jar.get(ACCESS_TOKEN_COOKIE).unwrap();
        assert_eq!(access.value(), "");
        assert_eq!(access.max_age(), Some(time::Duration::ZERO));
    }
}
