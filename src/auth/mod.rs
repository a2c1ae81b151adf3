//! Auth Module
//!
//! Identity resolution and navigation guards.

mod guards;
mod query;

pub use guards::{
    GuardResult, Guards, RedirectSignal, ADMIN_LOGIN_ROUTE, ADMIN_ROUTE, LOGIN_ROUTE,
    PROFILE_ROUTE,
};
pub use query::{AuthQuery, AuthState, IDENTITY_PATH};
