//! OpenAI-compatible chat-completions client.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use std::time::Duration;

use crate::error::RelayError;
use crate::types::{ChatCompletionRequest, ChatCompletionResponse};

pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// One upstream completion call.
///
/// `Ok(None)` means the upstream answered successfully but the body carried
/// no usable content.
#[async_trait]
pub trait CompletionClientTrait: Send + Sync {
    async fn complete(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<Option<String>, RelayError>;
}

pub struct OpenAiClient {
    client: Client,
    api_url: String,
}

impl OpenAiClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url: api_url.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new(DEFAULT_OPENAI_API_URL, DEFAULT_UPSTREAM_TIMEOUT)
    }
}

#[async_trait]
impl CompletionClientTrait for OpenAiClient {
    async fn complete(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<Option<String>, RelayError> {
        debug!(
            "Chat completion request: model={} messages={}",
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayError::upstream("request timed out")
                } else {
                    RelayError::upstream(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Upstream answered HTTP {}: {}", status, body);
            return Err(RelayError::upstream(format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RelayError::upstream(e.to_string()))?;

        match serde_json::from_str::<ChatCompletionResponse>(&body) {
            Ok(parsed) => Ok(parsed.first_content()),
            Err(e) => {
                warn!("Malformed upstream response: {}", e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CompletionMessage;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve one connection with a canned response and hand back the raw
    /// request text.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(request);
        });
        (url, rx)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "gpt-4".to_string(),
            messages: vec![CompletionMessage::new("user", "Hi")],
            temperature: 0.6,
        }
    }

    #[tokio::test]
    async fn test_complete_sends_bearer_and_returns_content() {
        let (url, rx) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#,
        )
        .await;
        let client = OpenAiClient::new(url, Duration::from_secs(5));

        let reply = client.complete("sk-abc", &request()).await.unwrap();
        assert_eq!(reply.as_deref(), Some("hello"));

        let raw = rx.await.unwrap().to_lowercase();
        assert!(raw.starts_with("post /v1/chat/completions"));
        assert!(raw.contains("authorization: bearer sk-abc"));
        assert!(raw.contains(r#""model":"gpt-4""#));
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_failure() {
        let (url, _rx) = serve_once("502 Bad Gateway", r#"{"error":"down"}"#).await;
        let client = OpenAiClient::new(url, Duration::from_secs(5));

        let err = client.complete("sk-abc", &request()).await.unwrap_err();
        assert!(matches!(err, RelayError::UpstreamRequestFailed(ref m) if m.contains("502")));
    }

    #[tokio::test]
    async fn test_malformed_body_yields_no_content() {
        let (url, _rx) = serve_once("200 OK", r#"{"choices":[{"message":{"content":42}}]}"#).await;
        let client = OpenAiClient::new(url, Duration::from_secs(5));
        assert_eq!(client.complete("sk-abc", &request()).await.unwrap(), None);

        let (url, _rx) = serve_once("200 OK", "not json").await;
        let client = OpenAiClient::new(url, Duration::from_secs(5));
        assert_eq!(client.complete("sk-abc", &request()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });
        let client = OpenAiClient::new(url, Duration::from_millis(200));

        let err = client.complete("sk-abc", &request()).await.unwrap_err();
        assert!(
            matches!(err, RelayError::UpstreamRequestFailed(ref m) if m == "request timed out")
        );
    }
}
