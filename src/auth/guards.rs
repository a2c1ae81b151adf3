//! Route Guards
//!
//! Pure checks deciding whether a navigation may proceed. Guards only read
//! token presence or an already-resolved [`AuthState`]; they never mutate
//! tokens or touch the network.

use thiserror::Error;

use crate::auth::AuthState;
use crate::token::SharedTokenStore;

pub const LOGIN_ROUTE: &str = "/login";
pub const PROFILE_ROUTE: &str = "/profile";
pub const ADMIN_LOGIN_ROUTE: &str = "/admin-login";
pub const ADMIN_ROUTE: &str = "/admin";

/// Navigation must go to `location` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("redirect to {location}")]
pub struct RedirectSignal {
    location: &'static str,
}

impl RedirectSignal {
    pub fn to(location: &'static str) -> Self {
        Self { location }
    }

    pub fn location(&self) -> &'static str {
        self.location
    }
}

pub type GuardResult = std::result::Result<(), RedirectSignal>;

#[derive(Clone)]
pub struct Guards {
    access: SharedTokenStore,
    admin: SharedTokenStore,
}

impl Guards {
    pub fn new(access: SharedTokenStore, admin: SharedTokenStore) -> Self {
        Self { access, admin }
    }

    /// Pages that need a signed-in user.
    pub fn require_authenticated(&self) -> GuardResult {
        if self.access.is_present() {
            Ok(())
        } else {
            Err(RedirectSignal::to(LOGIN_ROUTE))
        }
    }

    /// Login and register pages.
    pub fn require_guest(&self) -> GuardResult {
        if self.access.is_present() {
            Err(RedirectSignal::to(PROFILE_ROUTE))
        } else {
            Ok(())
        }
    }

    /// Like [`require_authenticated`](Self::require_authenticated) but
    /// against a resolved identity, so a rejected token also redirects.
    pub fn require_session(&self, state: &AuthState) -> GuardResult {
        match state {
            AuthState::Authenticated(_) => Ok(()),
            AuthState::Unauthenticated => Err(RedirectSignal::to(LOGIN_ROUTE)),
        }
    }

    pub fn require_admin(&self) -> GuardResult {
        if self.admin.is_present() {
            Ok(())
        } else {
            Err(RedirectSignal::to(ADMIN_LOGIN_ROUTE))
        }
    }

    pub fn require_admin_guest(&self) -> GuardResult {
        if self.admin.is_present() {
            Err(RedirectSignal::to(ADMIN_ROUTE))
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for Guards {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guards")
            .field("access_token", &self.access.is_present())
            .field("admin_token", &self.admin.is_present())
            .finish()
    }
}
