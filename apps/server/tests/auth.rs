mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{set_cookies, TestApp};

#[tokio::test]
async fn sign_in_sets_cookies_and_resolves_user() {
    let app = TestApp::new().await;

    let (status, headers, body) = app
        .send(
            Method::POST,
            "/api/auth/session",
            None,
            Some(json!({ "accessToken": "token-u1", "refreshToken": "refresh-u1" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "u1");
    assert_eq!(body["name"], "Ana Lima");

    let cookies = set_cookies(&headers);
    assert!(cookies.iter().any(|c| c.starts_with("sb-access-token=token-u1")));
    assert!(cookies.iter().any(|c| c.starts_with("sb-refresh-token=refresh-u1")));
    assert!(cookies.iter().all(|c| c.contains("HttpOnly")));

    let (status, _, me) = app.send(Method::GET, "/api/auth/me", Some("token-u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ana@example.com");
}

#[tokio::test]
async fn invalid_sign_in_expires_cookies() {
    let app = TestApp::new().await;

    let (status, headers, _) = app
        .send(
            Method::POST,
            "/api/auth/session",
            None,
            Some(json!({ "accessToken": "token-bogus", "refreshToken": "r" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let cookies = set_cookies(&headers);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
}

#[tokio::test]
async fn sign_out_expires_cookies() {
    let app = TestApp::new().await;

    let (status, headers, _) = app
        .send(Method::DELETE, "/api/auth/session", Some("token-u1"), None)
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    let cookies = set_cookies(&headers);
    assert!(cookies.iter().any(|c| c.starts_with("sb-access-token=;")));
    assert!(cookies.iter().any(|c| c.starts_with("sb-refresh-token=;")));
}

#[tokio::test]
async fn protected_routes_require_a_user() {
    let app = TestApp::new().await;

    for uri in ["/api/auth/me", "/api/api-keys", "/api/model-profiles", "/api/chat-sessions"] {
        let (status, _, body) = app.send(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["code"], 401);
    }

    let (status, _, body) = app.send(Method::GET, "/api/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn api_keys_are_masked_and_scoped() {
    let app = TestApp::new().await;

    let (status, _, created) = app
        .send(
            Method::POST,
            "/api/api-keys",
            Some("token-u1"),
            Some(json!({ "provider": "OpenAI", "key": "sk-abcdef123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["provider"], "openai");
    assert_eq!(created["maskedKey"], "sk-a…");
    assert!(!created.to_string().contains("sk-abcdef123"));

    let (_, _, mine) = app.send(Method::GET, "/api/api-keys", Some("token-u1"), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (_, _, theirs) = app.send(Method::GET, "/api/api-keys", Some("token-u2"), None).await;
    assert!(theirs.as_array().unwrap().is_empty());

    let id = created["id"].as_str().unwrap();
    let (status, _, _) = app
        .send(Method::DELETE, &format!("/api/api-keys/{}", id), Some("token-u2"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = app
        .send(Method::DELETE, &format!("/api/api-keys/{}", id), Some("token-u1"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn model_prompt_override() {
    let app = TestApp::new().await;

    let (status, _, models) = app.send(Method::GET, "/api/models", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(models[0]["id"], "gpt-3.5-turbo");
    assert_eq!(models[1]["id"], "gpt-4");

    let (_, _, prompt) = app
        .send(Method::GET, "/api/models/gpt-4/prompt", None, None)
        .await;
    assert_eq!(prompt["prompt"], "You are a highly intelligent assistant.");

    let (status, _, _) = app
        .send(
            Method::PUT,
            "/api/models/gpt-4/prompt",
            None,
            Some(json!({ "prompt": "Seja breve." })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, prompt) = app
        .send(
            Method::PUT,
            "/api/models/gpt-4/prompt",
            Some("token-u1"),
            Some(json!({ "prompt": "Seja breve." })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prompt["prompt"], "Seja breve.");

    let (status, _, _) = app
        .send(Method::GET, "/api/models/unknown/prompt", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
