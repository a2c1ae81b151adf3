//! Marketplace API
//!
//! Typed operations over the backend. Reads go through the query cache under
//! their key; mutations apply their invalidation edges before returning.
//!
//! # Operations
//! - Auth: login, register, logout, refresh, admin login/logout
//! - Reads: listings, listing, search, wishlist, public users, ratings,
//!   dashboard, admin tables
//! - Mutations: listings, wishlist, ratings, profile, admin deletes

mod auth;
mod mutations;
mod queries;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::{CachedValue, Mutation, QueryCache, QueryKey};
use crate::error::{ClientError, Result};
use crate::http::{HttpClient, Method, RequestOptions};

/// Entry point for every marketplace operation. Clones share state.
#[derive(Clone, Debug)]
pub struct MarketApi {
    client: HttpClient,
    cache: QueryCache,
}

impl MarketApi {
    pub fn new(client: HttpClient, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    // Read-through GET under `key`.
    async fn query<T: DeserializeOwned + Send + 'static>(
        &self,
        key: QueryKey,
        path: String,
        options: RequestOptions,
    ) -> Result<T> {
        let value = self.fetch::<T>(key, path, options).await?;
        decode(&value)
    }

    // Go encodes an empty slice as `null`.
    async fn query_list<T: DeserializeOwned + Send + 'static>(
        &self,
        key: QueryKey,
        path: String,
        options: RequestOptions,
    ) -> Result<Vec<T>> {
        let items: Option<Vec<T>> = self.query(key, path, options).await?;
        Ok(items.unwrap_or_default())
    }

    // A body that does not decode as `T` fails the fetch, so it is never
    // stored.
    async fn fetch<T: DeserializeOwned + Send + 'static>(
        &self,
        key: QueryKey,
        path: String,
        options: RequestOptions,
    ) -> Result<CachedValue> {
        let client = self.client.clone();
        self.cache
            .fetch(key, move || async move {
                let value = client.send(Method::GET, &path, None, &options).await?;
                decode::<T>(&value)?;
                Ok(value)
            })
            .await
    }

    // Sends a mutation and invalidates its edges once the server accepted it.
    async fn mutate(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
        mutation: Mutation,
    ) -> Result<Value> {
        let value = self
            .client
            .send(method, path, body.as_ref(), &options)
            .await?;
        self.cache.apply_mutation(&mutation);
        Ok(value)
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> Result<T> {
    T::deserialize(value).map_err(ClientError::from)
}

fn to_body<B: Serialize>(body: &B) -> Result<Value> {
    serde_json::to_value(body).map_err(ClientError::from)
}

fn check(validation: Option<String>) -> Result<()> {
    match validation {
        Some(message) => Err(ClientError::InvalidRequest(message)),
        None => Ok(()),
    }
}

/// `{"success": true, "listing": {...}}`
#[derive(Deserialize)]
struct ListingEnvelope {
    listing: crate::models::Listing,
}

/// `{"success": true, "rating": {...}}`
#[derive(Deserialize)]
struct RatingEnvelope {
    rating: crate::models::Rating,
}
