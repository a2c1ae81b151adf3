//! Refresh Interceptor State
//!
//! Per-chain retry state, the set of paths that never trigger a refresh, and
//! the gate that keeps concurrent refreshes down to one.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, MutexGuard};

/// Path of the token refresh endpoint
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Where a request chain is in its refresh lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryState {
    #[default]
    Initial,
    /// Refreshed once and replayed; a further 401 ends the session
    RetriedOnce,
}

/// Paths whose 401 responses are surfaced as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshExemptions {
    paths: Vec<String>,
}

impl RefreshExemptions {
    /// Only the refresh endpoint itself.
    pub fn refresh_only() -> Self {
        Self {
            paths: vec![REFRESH_PATH.to_string()],
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(normalize(&path.into()).to_string());
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        let path = normalize(path);
        self.paths.iter().any(|p| p == path)
    }
}

impl Default for RefreshExemptions {
    /// The refresh endpoint plus every credential endpoint, where 401 means
    /// the submitted credentials were wrong.
    fn default() -> Self {
        Self::refresh_only()
            .with_path("/auth/login")
            .with_path("/auth/register")
            .with_path("/admin/auth/login")
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split('?').next().unwrap_or(path);
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

// == Refresh Gate ==
/// Serializes refresh calls.
///
/// Each completed refresh bumps the generation. A chain records the
/// generation before sending; if it differs once the chain holds the gate,
/// another chain already refreshed and its outcome is in the token store.
#[derive(Debug, Default)]
pub(crate) struct RefreshGate {
    lock: Mutex<()>,
    generation: AtomicU64,
}

impl RefreshGate {
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub(crate) async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }

    /// Must be called while holding the gate.
    pub(crate) fn complete(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}
