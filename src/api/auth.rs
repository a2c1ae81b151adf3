//! Session operations: sign-in, sign-out and token refresh for both slots.

use tracing::{info, warn};

use crate::api::{check, decode, to_body, MarketApi};
use crate::cache::{Mutation, QueryKey};
use crate::error::Result;
use crate::http::{Method, RequestOptions};
use crate::models::{AdminCredentials, Credentials, SuccessResponse, TokenResponse};
use crate::token::Token;

impl MarketApi {
    /// Signs in with email and password and stores the access token.
    ///
    /// Wrong credentials surface as `Http { status: 401, .. }`.
    pub async fn login(&self, credentials: &Credentials) -> Result<Token> {
        check(credentials.validate())?;
        let value = self
            .client
            .send(
                Method::POST,
                "/auth/login",
                Some(&to_body(credentials)?),
                &RequestOptions::default(),
            )
            .await?;
        let response: TokenResponse = decode(&value)?;

        let token = Token::new(response.access_token);
        self.client.access_tokens().set(token.clone());
        // The previous identity, if any, belongs to another session.
        self.cache.remove(&QueryKey::auth());
        self.cache.apply_mutation(&Mutation::Login);
        info!("Signed in as {}", credentials.email);
        Ok(token)
    }

    pub async fn register(&self, credentials: &Credentials) -> Result<SuccessResponse> {
        check(credentials.validate())?;
        let value = self
            .mutate(
                Method::POST,
                "/auth/register",
                Some(to_body(credentials)?),
                RequestOptions::default(),
                Mutation::Register,
            )
            .await?;
        info!("Registered {}", credentials.email);
        decode(&value)
    }

    /// Ends the session.
    ///
    /// The access token is cleared and the logout edges applied before the
    /// server is told, so the local session ends even when the backend is
    /// unreachable. A server failure is still returned to the caller.
    pub async fn logout(&self) -> Result<()> {
        self.client.access_tokens().clear();
        self.cache.remove(&QueryKey::auth());
        self.cache.apply_mutation(&Mutation::Logout);
        info!("Signed out");

        // The refresh cookie identifies the session; no bearer needed.
        match self
            .client
            .send(Method::POST, "/auth/logout", None, &RequestOptions::anonymous())
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Server logout failed: {}", e);
                Err(e)
            }
        }
    }

    /// Forces a token refresh outside of the 401 interceptor.
    pub async fn refresh(&self) -> Result<Token> {
        self.client.refresh().await
    }

    pub async fn admin_login(&self, credentials: &AdminCredentials) -> Result<Token> {
        check(credentials.validate())?;
        let value = self
            .client
            .send(
                Method::POST,
                "/admin/auth/login",
                Some(&to_body(credentials)?),
                &RequestOptions::anonymous(),
            )
            .await?;
        let response: TokenResponse = decode(&value)?;

        let token = Token::new(response.access_token);
        self.client.admin_tokens().set(token.clone());
        self.cache.apply_mutation(&Mutation::AdminLogin);
        info!("Admin signed in as {}", credentials.username);
        Ok(token)
    }

    /// Drops the admin token. The backend keeps no admin session to end.
    pub fn admin_logout(&self) {
        self.client.admin_tokens().clear();
        self.cache.apply_mutation(&Mutation::AdminLogout);
        info!("Admin signed out");
    }
}
