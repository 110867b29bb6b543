#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use bigstep_server::{api::app_router, build_state, config::Config};

/// One recorded chat-completions call.
#[derive(Debug, Clone)]
pub struct UpstreamCall {
    pub authorization: Option<String>,
    pub body: Value,
}

pub struct MockUpstream {
    calls: Mutex<Vec<UpstreamCall>>,
    response: Mutex<(StatusCode, String)>,
}

impl Default for MockUpstream {
    fn default() -> Self {
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": "mock reply" } }]
        });
        Self {
            calls: Mutex::new(Vec::new()),
            response: Mutex::new((StatusCode::OK, body.to_string())),
        }
    }
}

impl MockUpstream {
    pub fn calls(&self) -> Vec<UpstreamCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Answer every following completion call with `status` and a raw body.
    pub fn respond_with(&self, status: StatusCode, body: impl Into<String>) {
        *self.response.lock().unwrap() = (status, body.into());
    }
}

async fn identity_user(headers: HeaderMap) -> Response {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default();
    match token {
        "token-u1" => Json(json!({
            "id": "u1",
            "email": "ana@example.com",
            "user_metadata": { "full_name": "Ana Lima" }
        }))
        .into_response(),
        "token-u2" => Json(json!({ "id": "u2", "email": "bo@example.com" })).into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn completions(
    State(upstream): State<Arc<MockUpstream>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    upstream.calls.lock().unwrap().push(UpstreamCall {
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    let (status, body) = upstream.response.lock().unwrap().clone();
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Identity service and upstream LLM on one ephemeral port.
async fn spawn_mock_services() -> (String, Arc<MockUpstream>) {
    let upstream = Arc::new(MockUpstream::default());
    let router = Router::new()
        .route("/auth/v1/user", get(identity_user))
        .route("/v1/chat/completions", post(completions))
        .with_state(upstream.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}", addr), upstream)
}

pub struct TestApp {
    pub router: Router,
    pub upstream: Arc<MockUpstream>,
    pub db_path: String,
    _tmp: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let (base_url, upstream) = spawn_mock_services().await;
        let db_path = tmp.path().join("test.db").to_string_lossy().to_string();
        let config = Config {
            db_path: db_path.clone(),
            identity_url: Some(base_url.clone()),
            identity_anon_key: "anon".to_string(),
            openai_api_key: Some("sk-test".to_string()),
            openai_api_url: format!("{}/v1/chat/completions", base_url),
            ..Default::default()
        };
        let state = build_state(&config).await.unwrap();
        Self {
            router: app_router(state, &config),
            upstream,
            db_path,
            _tmp: tmp,
        }
    }

    /// Send a request, optionally with a session cookie and a JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("sb-access-token={}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).to_string())
            })
        };
        (status, headers, json)
    }
}

pub fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}
