//! HTTP Client Wrapper
//!
//! Sends requests to the marketplace backend with the right token attached,
//! decodes failures once into [`ClientError`], and runs the refresh-and-replay
//! loop on 401 responses.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ErrorKind, Result};
use crate::http::refresh::{RefreshGate, REFRESH_PATH};
use crate::http::{RefreshExemptions, RetryPolicy, RetryState};
use crate::models::TokenResponse;
use crate::token::{SharedTokenStore, Token};

/// Which stored token a request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenSlot {
    /// The user access token; the only slot that is ever refreshed
    #[default]
    Access,
    /// The admin panel token
    Admin,
    /// Send no Authorization header
    None,
}

/// Per-request settings.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub slot: TokenSlot,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn admin() -> Self {
        Self {
            slot: TokenSlot::Admin,
            ..Self::default()
        }
    }

    pub fn anonymous() -> Self {
        Self {
            slot: TokenSlot::None,
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }
}

// == HTTP Client ==
/// Cloneable handle to the backend. Clones share the connection pool, the
/// cookie jar, the token stores and the refresh gate.
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    auth_scheme: Option<Arc<str>>,
    access: SharedTokenStore,
    admin: SharedTokenStore,
    policy: RetryPolicy,
    exemptions: Arc<RefreshExemptions>,
    gate: Arc<RefreshGate>,
}

impl HttpClient {
    /// Builds a client for `config.base_url`.
    ///
    /// # Arguments
    /// * `config` - Base URL, timeout, cookie forwarding and header scheme
    /// * `access` - Store for the user access token
    /// * `admin` - Store for the admin panel token
    pub fn new(
        config: &ClientConfig,
        access: SharedTokenStore,
        admin: SharedTokenStore,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .cookie_store(config.with_credentials)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            auth_scheme: config.auth_scheme.as_deref().map(Arc::from),
            access,
            admin,
            policy: RetryPolicy::default(),
            exemptions: Arc::new(RefreshExemptions::default()),
            gate: Arc::new(RefreshGate::default()),
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_exemptions(mut self, exemptions: RefreshExemptions) -> Self {
        self.exemptions = Arc::new(exemptions);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn access_tokens(&self) -> &SharedTokenStore {
        &self.access
    }

    pub fn admin_tokens(&self) -> &SharedTokenStore {
        &self.admin
    }

    // == Send ==
    /// Sends a request and returns its JSON body (`null` when empty).
    ///
    /// A 401 on a refreshable request triggers one refresh and one replay.
    /// If the refresh fails the access token is cleared and the chain ends
    /// with [`ClientError::AuthenticationRequired`]. Attempts are counted per
    /// [`ErrorKind`], so earlier failures of another kind never use up the
    /// refresh.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<Value> {
        let mut state = RetryState::Initial;
        let mut attempts: HashMap<ErrorKind, u32> = HashMap::new();
        let mut sent = 0u32;

        loop {
            let generation = self.gate.generation();
            let token = self.token_for(options.slot);

            let err = match self
                .execute(&method, path, body, options, token.as_ref())
                .await
            {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            sent += 1;
            let kind = err.kind();
            let attempt = attempts.entry(kind).or_insert(0);
            *attempt += 1;
            let attempt = *attempt;

            if kind == ErrorKind::Unauthorized {
                if !self.refreshable(path, options.slot) {
                    return Err(err);
                }
                if state == RetryState::RetriedOnce {
                    warn!("{} {} still unauthorized after refresh", method, path);
                    return Err(ClientError::AuthenticationRequired);
                }
            }

            let decision = self.policy.decide(kind);
            if attempt >= decision.max_attempts {
                return Err(err);
            }

            if decision.refresh_first {
                self.refresh_after(generation).await?;
                state = RetryState::RetriedOnce;
            } else if !decision.backoff.is_zero() {
                tokio::time::sleep(decision.backoff).await;
            }
            debug!("Replaying {} {} (attempt {})", method, path, sent + 1);
        }
    }

    /// Sends a request and decodes the body into `T`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<T> {
        let value = self.send(method, path, body, options).await?;
        Ok(serde_json::from_value(value)?)
    }

    // == Refresh ==
    /// Exchanges the refresh cookie for a new access token and stores it.
    ///
    /// On failure the access token is cleared.
    pub async fn refresh(&self) -> Result<Token> {
        let _held = self.gate.acquire().await;
        self.refresh_locked().await
    }

    // Joins a refresh another chain finished after `seen`, or runs one.
    async fn refresh_after(&self, seen: u64) -> Result<()> {
        let _held = self.gate.acquire().await;

        if self.gate.generation() != seen {
            debug!("Reusing concurrent refresh outcome");
            return match self.access.get() {
                Some(_) => Ok(()),
                None => Err(ClientError::AuthenticationRequired),
            };
        }

        self.refresh_locked()
            .await
            .map(|_| ())
            .map_err(|_| ClientError::AuthenticationRequired)
    }

    async fn refresh_locked(&self) -> Result<Token> {
        let token = self.access.get();
        let result = match self
            .execute(
                &Method::POST,
                REFRESH_PATH,
                None,
                &RequestOptions::default(),
                token.as_ref(),
            )
            .await
        {
            Ok(value) => serde_json::from_value::<TokenResponse>(value)
                .map(|parsed| Token::new(parsed.access_token))
                .map_err(ClientError::from),
            Err(e) => Err(e),
        };

        // The generation moves only once the store holds the outcome, so a
        // chain that sees the new generation also sees the new token.
        match result {
            Ok(token) => {
                self.access.set(token.clone());
                self.gate.complete();
                info!("Access token refreshed");
                Ok(token)
            }
            Err(e) => {
                warn!("Token refresh failed, clearing session: {}", e);
                self.access.clear();
                self.gate.complete();
                Err(e)
            }
        }
    }

    // == Internals ==
    fn token_for(&self, slot: TokenSlot) -> Option<Token> {
        match slot {
            TokenSlot::Access => self.access.get(),
            TokenSlot::Admin => self.admin.get(),
            TokenSlot::None => None,
        }
    }

    fn refreshable(&self, path: &str, slot: TokenSlot) -> bool {
        slot == TokenSlot::Access && !self.exemptions.contains(path)
    }

    fn authorization(&self, token: &Token) -> String {
        match &self.auth_scheme {
            Some(scheme) => format!("{} {}", scheme, token.as_str()),
            None => token.as_str().to_string(),
        }
    }

    async fn execute(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
        token: Option<&Token>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, self.authorization(token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("{} {} -> {}", method, path, status.as_u16());

        if !status.is_success() {
            return Err(ClientError::from_response(status.as_u16(), &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("auth_scheme", &self.auth_scheme)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
