//! Configuration Module
//!
//! Handles loading and managing client configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the marketplace backend, without trailing slash
    pub base_url: String,
    /// File holding the persisted token slots
    pub token_path: PathBuf,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
    /// Freshness window in seconds for resource queries
    pub stale_time: u64,
    /// Freshness window in seconds for the identity query
    pub auth_stale_time: u64,
    /// Retention window in seconds for unobserved cache entries
    pub gc_time: u64,
    /// Interval in seconds between cache garbage collection runs
    pub gc_interval: u64,
    /// Keep a cookie store so the refresh cookie travels with requests
    pub with_credentials: bool,
    /// Optional scheme prefix for the Authorization header (e.g. "Bearer")
    pub auth_scheme: Option<String>,
}

impl ClientConfig {
    /// Creates a new ClientConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MARKET_API_URL` - Backend base URL (default: http://localhost:8080)
    /// - `MARKET_TOKEN_PATH` - Token file (default: .market_session.json)
    /// - `MARKET_REQUEST_TIMEOUT` - Request timeout in seconds (default: 30)
    /// - `MARKET_STALE_TIME` - Query freshness in seconds (default: 30)
    /// - `MARKET_AUTH_STALE_TIME` - Identity freshness in seconds (default: 60)
    /// - `MARKET_GC_TIME` - Unobserved entry retention in seconds (default: 300)
    /// - `MARKET_GC_INTERVAL` - GC frequency in seconds (default: 60)
    /// - `MARKET_WITH_CREDENTIALS` - Forward cookies (default: true)
    /// - `MARKET_AUTH_SCHEME` - Authorization scheme prefix (default: none, raw token)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("MARKET_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            token_path: env::var("MARKET_TOKEN_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.token_path),
            request_timeout: parse_var("MARKET_REQUEST_TIMEOUT").unwrap_or(defaults.request_timeout),
            stale_time: parse_var("MARKET_STALE_TIME").unwrap_or(defaults.stale_time),
            auth_stale_time: parse_var("MARKET_AUTH_STALE_TIME")
                .unwrap_or(defaults.auth_stale_time),
            gc_time: parse_var("MARKET_GC_TIME").unwrap_or(defaults.gc_time),
            gc_interval: parse_var("MARKET_GC_INTERVAL").unwrap_or(defaults.gc_interval),
            with_credentials: parse_var("MARKET_WITH_CREDENTIALS")
                .unwrap_or(defaults.with_credentials),
            auth_scheme: env::var("MARKET_AUTH_SCHEME")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }

    /// Points the config at another backend, keeping every other setting.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_time)
    }

    pub fn auth_stale_time(&self) -> Duration {
        Duration::from_secs(self.auth_stale_time)
    }

    pub fn gc_time(&self) -> Duration {
        Duration::from_secs(self.gc_time)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            token_path: PathBuf::from(".market_session.json"),
            request_timeout: 30,
            stale_time: 30,
            auth_stale_time: 60,
            gc_time: 300,
            gc_interval: 60,
            with_credentials: true,
            auth_scheme: None,
        }
    }
}
