//! Cached reads. Each method names the key its result is stored under.

use crate::api::MarketApi;
use crate::cache::{QueryKey, ResourceKind};
use crate::error::Result;
use crate::http::RequestOptions;
use crate::models::{
    AdminListing, AdminUser, DashboardData, Listing, ListingData, Rating, RatingCheck,
    RatingSummary, SearchParams, User,
};

impl MarketApi {
    /// `listings`: every listing with the viewer's wishlist flags.
    pub async fn listings(&self) -> Result<Vec<ListingData>> {
        self.query_list(
            QueryKey::new(ResourceKind::Listings),
            "/public/listings".to_string(),
            RequestOptions::default(),
        )
        .await
    }

    /// `listing/{id}`
    pub async fn listing(&self, id: u64) -> Result<ListingData> {
        self.query(
            QueryKey::scoped(ResourceKind::Listing, id),
            format!("/public/listings/{}", id),
            RequestOptions::default(),
        )
        .await
    }

    /// `listings?page=..&query=..`: one entry per distinct filter set.
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<ListingData>> {
        self.query_list(
            params.cache_key(),
            "/public/listings/search".to_string(),
            RequestOptions::default().with_query(params.to_query()),
        )
        .await
    }

    pub async fn wishlist(&self) -> Result<Vec<Listing>> {
        self.query_list(
            QueryKey::new(ResourceKind::Wishlist),
            "/user/listings/wishlist".to_string(),
            RequestOptions::default(),
        )
        .await
    }

    /// `user/{id}`: another user's public profile.
    pub async fn public_user(&self, id: u64) -> Result<User> {
        self.query(
            QueryKey::scoped(ResourceKind::User, id),
            format!("/public/users/{}", id),
            RequestOptions::default(),
        )
        .await
    }

    /// `ratings/{id}`: ratings received by a user.
    pub async fn user_ratings(&self, user_id: u64) -> Result<RatingSummary> {
        self.query(
            QueryKey::scoped(ResourceKind::Ratings, user_id),
            format!("/public/ratings/user/{}", user_id),
            RequestOptions::default(),
        )
        .await
    }

    pub async fn ratings_given(&self) -> Result<Vec<Rating>> {
        self.query_list(
            QueryKey::new(ResourceKind::RatingsGiven),
            "/user/ratings/given".to_string(),
            RequestOptions::default(),
        )
        .await
    }

    /// `rating_check/{seller}?listing_id=..`
    pub async fn check_rating(&self, seller_id: u64, listing_id: Option<u64>) -> Result<RatingCheck> {
        let query = listing_id
            .map(|id| vec![("listing_id".to_string(), id.to_string())])
            .unwrap_or_default();
        self.query(
            QueryKey::scoped(ResourceKind::RatingCheck, seller_id).param_opt("listing_id", listing_id),
            format!("/public/ratings/check/{}", seller_id),
            RequestOptions::default().with_query(query),
        )
        .await
    }

    pub async fn dashboard(&self) -> Result<DashboardData> {
        self.query(
            QueryKey::new(ResourceKind::Dashboard),
            "/user/dashboard".to_string(),
            RequestOptions::default(),
        )
        .await
    }

    pub async fn admin_users(&self) -> Result<Vec<AdminUser>> {
        self.query_list(
            QueryKey::new(ResourceKind::AdminUsers),
            "/admin/users".to_string(),
            RequestOptions::admin(),
        )
        .await
    }

    pub async fn admin_listings(&self) -> Result<Vec<AdminListing>> {
        self.query_list(
            QueryKey::new(ResourceKind::AdminListings),
            "/admin/listings".to_string(),
            RequestOptions::admin(),
        )
        .await
    }
}
