//! HTTP Module
//!
//! Request plumbing between the cache and the backend.

mod client;
mod policy;
mod refresh;

pub use client::{HttpClient, RequestOptions, TokenSlot};
pub use policy::{RetryDecision, RetryPolicy};
pub use refresh::{RefreshExemptions, RetryState, REFRESH_PATH};

pub use reqwest::Method;
