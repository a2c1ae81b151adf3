//! Token Module
//!
//! Holds the bearer tokens the client attaches to requests.
//!
//! Two slots exist: `access_token` for the signed-in user and `admin_token`
//! for the admin panel. Each slot is its own [`TokenStore`].

mod file;
mod store;

pub use file::{FileTokenStore, TokenFile};
pub use store::{MemoryTokenStore, SharedTokenStore, Token, TokenStore};

// == Storage Keys ==
/// Storage key of the user access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key of the admin panel token
pub const ADMIN_TOKEN_KEY: &str = "admin_token";
