//! Wire models for the marketplace REST API
//!
//! This module defines the DTOs (Data Transfer Objects) exchanged with the
//! backend. Response types tolerate missing optional fields.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    AdminCredentials, CreateRating, Credentials, ListingForm, ProfileUpdate, SearchParams,
    SortOrder, UpdateRating,
};
pub use responses::{
    AdminListing, AdminUser, DashboardData, DashboardStats, Identity, Listing, ListingData,
    PriceSuggestion, Rating, RatingCheck, RatingSummary, SuccessResponse, TokenResponse, User,
    WishlistToggle,
};
