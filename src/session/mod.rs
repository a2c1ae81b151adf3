//! Session Context
//!
//! Bundles everything one signed-in client needs. Built explicitly so tests
//! can swap the durable token file for memory stores.

use std::sync::Arc;

use tracing::info;

use crate::api::MarketApi;
use crate::auth::{AuthQuery, Guards};
use crate::cache::QueryCache;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::HttpClient;
use crate::tasks::spawn_gc_task;
use crate::token::{SharedTokenStore, TokenFile, ACCESS_TOKEN_KEY, ADMIN_TOKEN_KEY};

#[derive(Clone, Debug)]
pub struct Session {
    pub config: ClientConfig,
    pub cache: QueryCache,
    pub client: HttpClient,
    pub auth: AuthQuery,
    pub guards: Guards,
    pub api: MarketApi,
}

impl Session {
    /// Opens a session backed by the token file at `config.token_path`.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let file = TokenFile::new(config.token_path.clone());
        let access: SharedTokenStore = Arc::new(file.slot(ACCESS_TOKEN_KEY));
        let admin: SharedTokenStore = Arc::new(file.slot(ADMIN_TOKEN_KEY));
        info!("Session tokens at {}", config.token_path.display());
        Self::with_stores(config, access, admin)
    }

    /// Opens a session over caller-provided token stores.
    pub fn with_stores(
        config: ClientConfig,
        access: SharedTokenStore,
        admin: SharedTokenStore,
    ) -> Result<Self> {
        let cache = QueryCache::new(config.stale_time(), config.gc_time());
        let client = HttpClient::new(&config, Arc::clone(&access), Arc::clone(&admin))?;
        let auth = AuthQuery::new(client.clone(), cache.clone(), config.auth_stale_time());
        let guards = Guards::new(access, admin);
        let api = MarketApi::new(client.clone(), cache.clone());

        Ok(Self {
            config,
            cache,
            client,
            auth,
            guards,
            api,
        })
    }

    /// Starts periodic garbage collection of this session's cache.
    pub fn spawn_gc(&self) -> tokio::task::JoinHandle<()> {
        spawn_gc_task(self.cache.clone(), self.config.gc_interval)
    }
}
