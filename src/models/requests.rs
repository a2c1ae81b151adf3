//! Request DTOs for the marketplace API
//!
//! Defines the structure of outgoing request bodies and query parameters.

use std::fmt;

use serde::Serialize;

use crate::cache::{QueryKey, ResourceKind};

/// Email/password pair for `POST /auth/login` and `POST /auth/register`
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.email.trim().is_empty() {
            return Some("Email cannot be empty".to_string());
        }
        if !self.email.contains('@') {
            return Some("Email must contain '@'".to_string());
        }
        if self.password.is_empty() {
            return Some("Password cannot be empty".to_string());
        }
        None
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Username/password pair for `POST /admin/auth/login`
#[derive(Clone, Serialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Option<String> {
        if self.username.trim().is_empty() {
            return Some("Username cannot be empty".to_string());
        }
        if self.password.is_empty() {
            return Some("Password cannot be empty".to_string());
        }
        None
    }
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Editable listing fields. Absent fields are left unchanged on update.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListingForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_closed: Option<bool>,
}

/// Partial profile update for `PATCH /user/me`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Body of `POST /user/ratings`
#[derive(Debug, Clone, Serialize)]
pub struct CreateRating {
    /// The seller being rated
    pub user_id: u64,
    pub rating: u8,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_id: Option<u64>,
}

impl CreateRating {
    pub fn validate(&self) -> Option<String> {
        validate_stars(self.rating)
    }
}

/// Body of `PATCH /user/ratings/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct UpdateRating {
    pub rating: u8,
    pub comment: String,
}

impl UpdateRating {
    pub fn validate(&self) -> Option<String> {
        validate_stars(self.rating)
    }
}

fn validate_stars(rating: u8) -> Option<String> {
    if !(1..=5).contains(&rating) {
        return Some("Rating must be between 1 and 5".to_string());
    }
    None
}

/// Listing sort orders offered by the search page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    TitleAsc,
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::TitleAsc => "title_asc",
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::PriceAsc => "price_asc",
            SortOrder::PriceDesc => "price_desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing search filters; each distinct combination is its own cache entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SearchParams {
    pub page: u32,
    pub query: Option<String>,
    pub category: Option<String>,
    pub sort: Option<SortOrder>,
}

impl SearchParams {
    pub fn page(page: u32) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    /// Query-string pairs in a fixed order, skipping empty filters.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("page".to_string(), self.page.max(1).to_string())];
        if let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) {
            pairs.push(("query".to_string(), query.to_string()));
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            pairs.push(("category".to_string(), category.to_string()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort".to_string(), sort.to_string()));
        }
        pairs
    }

    /// Cache key under the `listings` kind, so listing mutations reach search pages.
    pub fn cache_key(&self) -> QueryKey {
        self.to_query()
            .into_iter()
            .fold(QueryKey::new(ResourceKind::Listings), |key, (name, value)| {
                key.param(&name, value)
            })
    }
}
