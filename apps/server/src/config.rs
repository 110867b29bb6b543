use std::{net::SocketAddr, time::Duration};

use bigstep_ai::DEFAULT_OPENAI_API_URL;
use bigstep_core::api_keys::mask_secret;
use bigstep_core::constants::DEFAULT_MODEL_ID;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub upstream_timeout: Duration,
    /// Base URL of the identity service. Unset means every request is anonymous.
    pub identity_url: Option<String>,
    pub identity_anon_key: String,
    pub openai_api_key: Option<String>,
    pub openai_api_url: String,
    pub default_model_id: String,
    pub log_format: LogFormat,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_millis(key: &str, default: u64) -> Duration {
    let ms = std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default);
    Duration::from_millis(ms)
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        let listen_addr: SocketAddr = env_or("BIGSTEP_LISTEN_ADDR", "0.0.0.0:8080")
            .parse()
            .unwrap_or(defaults.listen_addr);
        let cors_allow = env_or("BIGSTEP_CORS_ALLOW_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let log_format = match env_or("BIGSTEP_LOG_FORMAT", "text").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };
        Self {
            listen_addr,
            db_path: env_or("BIGSTEP_DB_PATH", &defaults.db_path),
            cors_allow,
            request_timeout: env_millis("BIGSTEP_REQUEST_TIMEOUT_MS", 30_000),
            upstream_timeout: env_millis("BIGSTEP_UPSTREAM_TIMEOUT_MS", 60_000),
            identity_url: env_non_empty("BIGSTEP_IDENTITY_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            identity_anon_key: env_or("BIGSTEP_IDENTITY_ANON_KEY", ""),
            openai_api_key: env_non_empty("OPENAI_API_KEY"),
            openai_api_url: env_non_empty("BIGSTEP_OPENAI_API_URL")
                .unwrap_or(defaults.openai_api_url),
            default_model_id: env_non_empty("BIGSTEP_DEFAULT_MODEL_ID")
                .unwrap_or(defaults.default_model_id),
            log_format,
        }
    }

    /// One-line description safe to log: secrets show at most a short prefix.
    pub fn summary(&self) -> String {
        format!(
            "listen={} db={} cors={:?} request_timeout={:?} upstream_timeout={:?} identity={} anon_key={} openai_key={} openai_url={} default_model={}",
            self.listen_addr,
            self.db_path,
            self.cors_allow,
            self.request_timeout,
            self.upstream_timeout,
            self.identity_url.as_deref().unwrap_or("<none>"),
            mask_secret(&self.identity_anon_key),
            self.openai_api_key
                .as_deref()
                .map(mask_secret)
                .unwrap_or_else(|| "<unset>".to_string()),
            self.openai_api_url,
            self.default_model_id,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            db_path: "./db/app.db".to_string(),
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_millis(30_000),
            upstream_timeout: Duration::from_millis(60_000),
            identity_url: None,
            identity_anon_key: String::new(),
            openai_api_key: None,
            openai_api_url: DEFAULT_OPENAI_API_URL.to_string(),
            default_model_id: DEFAULT_MODEL_ID.to_string(),
            log_format: LogFormat::Text,
        }
    }
}
