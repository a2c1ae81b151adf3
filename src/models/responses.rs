//! Response DTOs for the marketplace API
//!
//! Defines the structure of response bodies returned by the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of every token-issuing endpoint (login, refresh, admin login)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

/// Generic `{ "success": true }` acknowledgement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}

/// A marketplace user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub university: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub telegram_link: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub rating_count: u32,
}

/// A listing posted by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub ai_price_report: Option<PriceSuggestion>,
}

/// A listing together with the viewer's wishlist flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingData {
    pub listing: Listing,
    #[serde(default)]
    pub is_in_wishlist: bool,
}

/// The signed-in identity as returned by `GET /user`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub user: User,
    #[serde(default)]
    pub listings: Option<Vec<ListingData>>,
}

/// Opaque AI price estimate attached to a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSuggestion {
    #[serde(default)]
    pub id: Option<u64>,
    pub suggested_price_min: f64,
    pub suggested_price_max: f64,
    #[serde(default)]
    pub confidence_level: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub reasoning: String,
}

/// A rating left by one user for a seller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// The seller being rated
    pub user_id: u64,
    pub rater_id: u64,
    #[serde(default)]
    pub listing_id: Option<u64>,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub rater: Option<User>,
}

/// Ratings received by a user with their aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    #[serde(default)]
    pub ratings: Vec<Rating>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub rating_count: u32,
}

/// Whether the signed-in user already rated a seller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingCheck {
    pub has_rated: bool,
    #[serde(default)]
    pub rating: Option<Rating>,
}

/// Response of the wishlist toggle endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistToggle {
    #[serde(default)]
    pub success: bool,
    /// "added" or "removed"
    #[serde(default)]
    pub action: String,
}

impl WishlistToggle {
    pub fn added(&self) -> bool {
        self.action == "added"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_listings: u64,
    pub active_listings: u64,
    pub closed_listings: u64,
    pub total_wishlists: u64,
    pub average_price: f64,
}

/// The signed-in user's dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub stats: DashboardStats,
    #[serde(default)]
    pub listings: Vec<ListingData>,
    pub ratings: RatingSummary,
}

/// Row of the admin user table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: u64,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub university: String,
    #[serde(default)]
    pub listings_count: u64,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub rating_count: u32,
}

/// Row of the admin listing table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminListing {
    pub id: u64,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub is_closed: bool,
    pub user_id: u64,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub images_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_uses_camel_case() {
        let parsed: TokenResponse = serde_json::from_str(r#"{"accessToken":"abc"}"#).unwrap();
        assert_eq!(parsed.access_token, "abc");
    }

    #[test]
    fn test_identity_from_backend_shape() {
        let json = r#"{
            "user": {
                "id": 4,
                "created_at": "2025-03-01T10:15:30.123456Z",
                "email": "ana@uni.edu",
                "name": "Ana",
                "average_rating": 4.5,
                "rating_count": 2
            },
            "listings": [
                {"listing": {"id": 9, "user_id": 4, "title": "Desk", "price": 25.0}, "is_in_wishlist": false}
            ]
        }"#;
        let identity: Identity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.user.id, 4);
        assert!(identity.user.created_at.is_some());
        assert_eq!(identity.listings.unwrap()[0].listing.title, "Desk");
    }

    #[test]
    fn test_rating_check_without_rating() {
        let check: RatingCheck =
            serde_json::from_str(r#"{"has_rated": false, "rating": null}"#).unwrap();
        assert!(!check.has_rated);
        assert!(check.rating.is_none());
    }

    #[test]
    fn test_wishlist_toggle_action() {
        let toggle: WishlistToggle =
            serde_json::from_str(r#"{"success": true, "action": "added"}"#).unwrap();
        assert!(toggle.added());
    }
}
