//! Auth Query
//!
//! Resolves "who is signed in" through the cache under the `auth` key.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::cache::{CachedValue, QueryCache, QueryKey};
use crate::error::Result;
use crate::http::{HttpClient, Method, RequestOptions};
use crate::models::Identity;

/// Path of the identity endpoint
pub const IDENTITY_PATH: &str = "/user";

/// Resolved session state.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Authenticated(Arc<Identity>),
    Unauthenticated,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::Authenticated(identity) => Some(identity),
            AuthState::Unauthenticated => None,
        }
    }
}

// The decoded identity is kept next to the cached body it came from, so
// callers sharing one fetch also share one `Arc<Identity>`.
#[derive(Default)]
struct Resolved {
    source: Option<CachedValue>,
    state: Option<AuthState>,
}

#[derive(Clone)]
pub struct AuthQuery {
    client: HttpClient,
    cache: QueryCache,
    stale_time: Duration,
    resolved: Arc<Mutex<Resolved>>,
}

impl AuthQuery {
    pub fn new(client: HttpClient, cache: QueryCache, stale_time: Duration) -> Self {
        Self {
            client,
            cache,
            stale_time,
            resolved: Arc::new(Mutex::new(Resolved::default())),
        }
    }

    /// Returns the signed-in identity, fetching `GET /user` when the cached
    /// one is missing or stale.
    ///
    /// Without an access token this resolves to `Unauthenticated` without
    /// touching the network. An authentication failure also resolves to
    /// `Unauthenticated` and evicts the cached identity; every other error
    /// is returned.
    pub async fn current_user(&self) -> Result<AuthState> {
        let key = QueryKey::auth();

        if !self.client.access_tokens().is_present() {
            self.cache.remove(&key);
            return Ok(self.settle(None, AuthState::Unauthenticated));
        }

        let client = self.client.clone();
        let fetched = self
            .cache
            .fetch_with(key.clone(), self.stale_time, move || async move {
                let value = client
                    .send(Method::GET, IDENTITY_PATH, None, &RequestOptions::default())
                    .await?;
                // Undecodable bodies must not be cached.
                Identity::deserialize(&value)?;
                Ok(value)
            })
            .await;

        match fetched {
            Ok(value) => self.decode(value),
            Err(e) if e.is_auth_failure() => {
                debug!("Identity query rejected, treating session as signed out");
                self.cache.remove(&key);
                Ok(self.settle(None, AuthState::Unauthenticated))
            }
            Err(e) => Err(e),
        }
    }

    /// The last resolved state, without I/O.
    ///
    /// Without an access token this is always `Unauthenticated`. Otherwise
    /// it decodes whatever body the cache holds for `auth`, fresh or not,
    /// and is `None` when the cache holds nothing. A state resolved before
    /// the token changed is never reported.
    pub fn cached_state(&self) -> Option<AuthState> {
        if !self.client.access_tokens().is_present() {
            return Some(AuthState::Unauthenticated);
        }
        let read = self.cache.read(&QueryKey::auth());
        let value = read.value()?;
        self.decode(Arc::clone(value)).ok()
    }

    /// Forgets the cached identity so the next call refetches.
    pub fn invalidate(&self) {
        self.cache.invalidate(&QueryKey::auth());
    }

    fn decode(&self, value: CachedValue) -> Result<AuthState> {
        {
            let resolved = self.lock();
            if let (Some(source), Some(state)) = (&resolved.source, &resolved.state) {
                if Arc::ptr_eq(source, &value) {
                    return Ok(state.clone());
                }
            }
        }

        let identity: Identity = serde_json::from_value(value.as_ref().clone())?;
        let state = AuthState::Authenticated(Arc::new(identity));
        Ok(self.settle(Some(value), state))
    }

    fn settle(&self, source: Option<CachedValue>, state: AuthState) -> AuthState {
        let mut resolved = self.lock();
        resolved.source = source;
        resolved.state = Some(state.clone());
        state
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Resolved> {
        self.resolved.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for AuthQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthQuery")
            .field("stale_time", &self.stale_time)
            .field("fetching", &self.cache.is_fetching(&QueryKey::auth()))
            .finish()
    }
}
