use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Application configuration loaded from environment variables.
/// Every variable has a default; only malformed values are rejected.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Unset means requests to the API never time out.
    pub request_timeout: Option<Duration>,
    pub max_upload_bytes: usize,
    /// A visitor's form is dropped after this long without a request.
    pub session_idle_timeout: Duration,
    /// Most visitor forms held at once.
    pub max_sessions: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_base_url = lookup("APPLY_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let request_timeout = lookup("APPLY_REQUEST_TIMEOUT_SECS")
            .map(|v| {
                v.parse::<u64>()
                    .context("APPLY_REQUEST_TIMEOUT_SECS must be a whole number of seconds")
            })
            .transpose()?
            .map(Duration::from_secs);

        let session_idle_timeout = Duration::from_secs(
            lookup("APPLY_SESSION_IDLE_SECS")
                .map(|v| {
                    v.parse::<u64>()
                        .context("APPLY_SESSION_IDLE_SECS must be a whole number of seconds")
                })
                .transpose()?
                .unwrap_or(DEFAULT_SESSION_IDLE_SECS),
        );

        let max_sessions = lookup("APPLY_MAX_SESSIONS")
            .map(|v| v.parse::<usize>().context("APPLY_MAX_SESSIONS must be a count"))
            .transpose()?
            .unwrap_or(DEFAULT_MAX_SESSIONS);
        if max_sessions == 0 {
            bail!("APPLY_MAX_SESSIONS must be at least 1");
        }

        Ok(Config {
            api_base_url,
            port: lookup("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            request_timeout,
            max_upload_bytes: lookup("APPLY_MAX_UPLOAD_BYTES")
                .map(|v| {
                    v.parse::<usize>()
                        .context("APPLY_MAX_UPLOAD_BYTES must be a byte count")
                })
                .transpose()?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            session_idle_timeout,
            max_sessions,
        })
    }

    /// Request body limit for `/apply`: the file plus room for the text parts
    /// and multipart framing.
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes + 64 * 1024
    }
}
