//! Campus Market Client - session and cache layer for the marketplace API
//!
//! Keeps the signed-in session and the locally cached server resources
//! consistent: tokens are attached and refreshed transparently, reads are
//! cached and deduplicated, and every mutation invalidates what it changed.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod session;
pub mod tasks;
pub mod token;

pub use api::MarketApi;
pub use auth::{AuthQuery, AuthState, Guards, RedirectSignal};
pub use cache::{CacheRead, KeyPrefix, Mutation, QueryCache, QueryKey, ResourceKind};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use http::{HttpClient, RequestOptions, RetryPolicy, TokenSlot};
pub use session::Session;
pub use tasks::spawn_gc_task;
pub use token::{FileTokenStore, MemoryTokenStore, Token, TokenStore};
