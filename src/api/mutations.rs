//! Server-state changes. Every method applies its [`Mutation`] edges on
//! success, before the returned future resolves.

use crate::api::{check, decode, to_body, ListingEnvelope, MarketApi, RatingEnvelope};
use crate::cache::Mutation;
use crate::error::Result;
use crate::http::{Method, RequestOptions};
use crate::models::{
    CreateRating, Listing, ListingForm, PriceSuggestion, ProfileUpdate, Rating, SuccessResponse,
    UpdateRating, WishlistToggle,
};

impl MarketApi {
    // == Listings ==
    pub async fn create_listing(&self, form: &ListingForm) -> Result<Listing> {
        let value = self
            .mutate(
                Method::POST,
                "/user/listings",
                Some(to_body(form)?),
                RequestOptions::default(),
                Mutation::CreateListing,
            )
            .await?;
        decode::<ListingEnvelope>(&value).map(|e| e.listing)
    }

    pub async fn update_listing(&self, listing_id: u64, form: &ListingForm) -> Result<Listing> {
        let value = self
            .mutate(
                Method::PATCH,
                &format!("/user/listings/{}", listing_id),
                Some(to_body(form)?),
                RequestOptions::default(),
                Mutation::UpdateListing { listing_id },
            )
            .await?;
        decode::<ListingEnvelope>(&value).map(|e| e.listing)
    }

    pub async fn delete_listing(&self, listing_id: u64) -> Result<SuccessResponse> {
        let value = self
            .mutate(
                Method::DELETE,
                &format!("/user/listings/{}", listing_id),
                None,
                RequestOptions::default(),
                Mutation::DeleteListing { listing_id },
            )
            .await?;
        decode(&value)
    }

    /// Adds the listing to the wishlist, or removes it if already there.
    pub async fn toggle_wishlist(&self, listing_id: u64) -> Result<WishlistToggle> {
        let value = self
            .mutate(
                Method::POST,
                &format!("/user/listings/wishlist/{}", listing_id),
                None,
                RequestOptions::default(),
                Mutation::ToggleWishlist { listing_id },
            )
            .await?;
        decode(&value)
    }

    // == Ratings ==
    pub async fn create_rating(&self, rating: &CreateRating) -> Result<Rating> {
        check(rating.validate())?;
        let value = self
            .mutate(
                Method::POST,
                "/user/ratings",
                Some(to_body(rating)?),
                RequestOptions::default(),
                Mutation::CreateRating {
                    seller_id: rating.user_id,
                },
            )
            .await?;
        decode::<RatingEnvelope>(&value).map(|e| e.rating)
    }

    /// The seller is read from the server's response; if it cannot be
    /// decoded the edges fall back to every seller.
    pub async fn update_rating(&self, rating_id: u64, update: &UpdateRating) -> Result<Rating> {
        check(update.validate())?;
        let value = self
            .client
            .send(
                Method::PATCH,
                &format!("/user/ratings/{}", rating_id),
                Some(&to_body(update)?),
                &RequestOptions::default(),
            )
            .await?;

        let decoded = decode::<RatingEnvelope>(&value).map(|e| e.rating);
        let seller_id = decoded.as_ref().ok().map(|r| r.user_id);
        self.cache
            .apply_mutation(&Mutation::UpdateRating { seller_id });
        decoded
    }

    /// `seller_id` narrows invalidation to one seller when the caller knows it.
    pub async fn delete_rating(
        &self,
        rating_id: u64,
        seller_id: Option<u64>,
    ) -> Result<SuccessResponse> {
        let value = self
            .mutate(
                Method::DELETE,
                &format!("/user/ratings/{}", rating_id),
                None,
                RequestOptions::default(),
                Mutation::DeleteRating { seller_id },
            )
            .await?;
        decode(&value)
    }

    // == Profile ==
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<SuccessResponse> {
        let value = self
            .mutate(
                Method::PATCH,
                "/user/me",
                Some(to_body(update)?),
                RequestOptions::default(),
                Mutation::UpdateProfile,
            )
            .await?;
        decode(&value)
    }

    // == Admin ==
    pub async fn admin_delete_user(&self, user_id: u64) -> Result<SuccessResponse> {
        let value = self
            .mutate(
                Method::DELETE,
                &format!("/admin/users/{}", user_id),
                None,
                RequestOptions::admin(),
                Mutation::AdminDeleteUser { user_id },
            )
            .await?;
        decode(&value)
    }

    pub async fn admin_delete_listing(&self, listing_id: u64) -> Result<SuccessResponse> {
        let value = self
            .mutate(
                Method::DELETE,
                &format!("/admin/listings/{}", listing_id),
                None,
                RequestOptions::admin(),
                Mutation::AdminDeleteListing { listing_id },
            )
            .await?;
        decode(&value)
    }

    // == AI ==
    /// Asks the backend for a price range. Not cached and invalidates nothing.
    pub async fn suggest_price(&self, form: &ListingForm) -> Result<PriceSuggestion> {
        self.client
            .send_json(
                Method::POST,
                "/ai/suggest-price",
                Some(&to_body(form)?),
                &RequestOptions::default(),
            )
            .await
    }
}
