//! Token Store Module
//!
//! Defines the token type and the synchronous store contract.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

// == Token ==
/// Opaque bearer credential.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    // Never print the credential itself.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token(<{} bytes>)", self.0.len())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// == Token Store ==
/// Process-wide holder of one token slot.
///
/// Reads are synchronous so the HTTP client and route guards can consult the
/// store without awaiting. Absence of a token is a normal state.
pub trait TokenStore: Send + Sync {
    /// Returns the current token, if any.
    fn get(&self) -> Option<Token>;

    /// Replaces the current token.
    fn set(&self, token: Token);

    /// Removes the current token.
    fn clear(&self);

    /// True when a token is present.
    fn is_present(&self) -> bool {
        self.get().is_some()
    }
}

/// Shared handle to a token store.
pub type SharedTokenStore = Arc<dyn TokenStore>;

// == Memory Token Store ==
/// Token store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    current: RwLock<Option<Token>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `token`.
    pub fn with_token(token: impl Into<Token>) -> Self {
        Self {
            current: RwLock::new(Some(token.into())),
        }
    }

    /// Convenience constructor returning a shared handle.
    pub fn shared() -> SharedTokenStore {
        Arc::new(Self::new())
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<Token> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, token: Token) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
