//! Invalidation Map
//!
//! Static table from mutation kind to the cache prefixes it makes stale.
//!
//! `edges` is an exhaustive match: a new [`Mutation`] variant does not
//! compile until it declares what it invalidates. Each mutation lists every
//! view that can display the data it changes.

use std::fmt;

use crate::cache::{KeyPrefix, ResourceKind};

use ResourceKind::*;

// == Mutation ==
/// Every server-state-changing operation the client performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    Login,
    Register,
    Logout,
    AdminLogin,
    AdminLogout,
    CreateListing,
    UpdateListing { listing_id: u64 },
    DeleteListing { listing_id: u64 },
    ToggleWishlist { listing_id: u64 },
    CreateRating { seller_id: u64 },
    /// `seller_id` is `None` when only the rating id is known
    UpdateRating { seller_id: Option<u64> },
    DeleteRating { seller_id: Option<u64> },
    UpdateProfile,
    AdminDeleteUser { user_id: u64 },
    AdminDeleteListing { listing_id: u64 },
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Login => "login",
            Mutation::Register => "register",
            Mutation::Logout => "logout",
            Mutation::AdminLogin => "admin_login",
            Mutation::AdminLogout => "admin_logout",
            Mutation::CreateListing => "create_listing",
            Mutation::UpdateListing { .. } => "update_listing",
            Mutation::DeleteListing { .. } => "delete_listing",
            Mutation::ToggleWishlist { .. } => "toggle_wishlist",
            Mutation::CreateRating { .. } => "create_rating",
            Mutation::UpdateRating { .. } => "update_rating",
            Mutation::DeleteRating { .. } => "delete_rating",
            Mutation::UpdateProfile => "update_profile",
            Mutation::AdminDeleteUser { .. } => "admin_delete_user",
            Mutation::AdminDeleteListing { .. } => "admin_delete_listing",
        }
    }

    /// The cache prefixes this mutation marks stale on success.
    pub fn edges(&self) -> Vec<KeyPrefix> {
        match *self {
            // Identity changes reshape every per-user view.
            Mutation::Login | Mutation::Register | Mutation::Logout => kinds(&[
                Auth,
                Dashboard,
                Wishlist,
                Listings,
                Listing,
                RatingsGiven,
                RatingCheck,
            ]),
            Mutation::AdminLogin | Mutation::AdminLogout => kinds(&[AdminUsers, AdminListings]),
            Mutation::CreateListing => kinds(&[
                Listings,
                Dashboard,
                Auth,
                User,
                AdminListings,
                AdminUsers,
            ]),
            Mutation::UpdateListing { listing_id } => with_listing(
                listing_id,
                &[Listings, Wishlist, Dashboard, Auth, AdminListings],
            ),
            Mutation::DeleteListing { listing_id } => with_listing(
                listing_id,
                &[
                    Listings,
                    Wishlist,
                    Dashboard,
                    Auth,
                    User,
                    AdminListings,
                    AdminUsers,
                ],
            ),
            Mutation::ToggleWishlist { listing_id } => {
                with_listing(listing_id, &[Listings, Wishlist, Dashboard])
            }
            Mutation::CreateRating { seller_id } => rating_edges(Some(seller_id)),
            Mutation::UpdateRating { seller_id } | Mutation::DeleteRating { seller_id } => {
                rating_edges(seller_id)
            }
            Mutation::UpdateProfile => kinds(&[Auth, User, Listing, Listings, Dashboard, AdminUsers]),
            // Deleting a user cascades to their listings and ratings, and
            // the same session may also be signed in as an affected user.
            Mutation::AdminDeleteUser { .. } | Mutation::AdminDeleteListing { .. } => kinds(&[
                AdminUsers,
                AdminListings,
                Listings,
                Listing,
                User,
                Wishlist,
                Ratings,
                RatingsGiven,
                RatingCheck,
                Auth,
                Dashboard,
            ]),
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn kinds(kinds: &[ResourceKind]) -> Vec<KeyPrefix> {
    kinds.iter().copied().map(KeyPrefix::kind).collect()
}

fn with_listing(listing_id: u64, rest: &[ResourceKind]) -> Vec<KeyPrefix> {
    let mut edges = vec![KeyPrefix::scoped(Listing, listing_id)];
    edges.extend(kinds(rest));
    edges
}

// Listing detail pages embed the seller's rating summary, so every listing
// is invalidated, not just the one the rating was left on.
fn rating_edges(seller_id: Option<u64>) -> Vec<KeyPrefix> {
    let mut edges = match seller_id {
        Some(id) => vec![
            KeyPrefix::scoped(Ratings, id),
            KeyPrefix::scoped(User, id),
        ],
        None => kinds(&[Ratings, User]),
    };
    edges.extend(kinds(&[
        RatingCheck,
        RatingsGiven,
        Listing,
        Auth,
        Dashboard,
        AdminUsers,
    ]));
    edges
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryKey;

    fn every_mutation() -> Vec<Mutation> {
        vec![
            Mutation::Login,
            Mutation::Register,
            Mutation::Logout,
            Mutation::AdminLogin,
            Mutation::AdminLogout,
            Mutation::CreateListing,
            Mutation::UpdateListing { listing_id: 7 },
            Mutation::DeleteListing { listing_id: 7 },
            Mutation::ToggleWishlist { listing_id: 7 },
            Mutation::CreateRating { seller_id: 3 },
            Mutation::UpdateRating { seller_id: Some(3) },
            Mutation::DeleteRating { seller_id: None },
            Mutation::UpdateProfile,
            Mutation::AdminDeleteUser { user_id: 3 },
            Mutation::AdminDeleteListing { listing_id: 7 },
        ]
    }

    fn invalidates(mutation: Mutation, key: &QueryKey) -> bool {
        mutation.edges().iter().any(|edge| edge.matches(key))
    }

    #[test]
    fn test_every_mutation_has_edges() {
        for mutation in every_mutation() {
            assert!(!mutation.edges().is_empty(), "{} has no edges", mutation);
        }
    }

    #[test]
    fn test_toggle_wishlist_fans_out() {
        let toggle = Mutation::ToggleWishlist { listing_id: 7 };
        assert!(invalidates(toggle, &QueryKey::new(Listings)));
        assert!(invalidates(toggle, &QueryKey::new(Wishlist)));
        assert!(invalidates(toggle, &QueryKey::scoped(Listing, 7)));
        assert!(!invalidates(toggle, &QueryKey::scoped(Listing, 8)));
    }

    #[test]
    fn test_create_listing_invalidates_search_pages() {
        let page = QueryKey::new(Listings).param("page", 2).param("query", "desk");
        assert!(invalidates(Mutation::CreateListing, &page));
    }

    #[test]
    fn test_rating_with_known_seller_is_scoped() {
        let create = Mutation::CreateRating { seller_id: 3 };
        assert!(invalidates(create, &QueryKey::scoped(Ratings, 3)));
        assert!(!invalidates(create, &QueryKey::scoped(Ratings, 4)));
        assert!(invalidates(create, &QueryKey::scoped(Listing, 99)));
        assert!(invalidates(create, &QueryKey::new(RatingCheck).with_scope(3)));
    }

    #[test]
    fn test_rating_with_unknown_seller_is_broad() {
        let delete = Mutation::DeleteRating { seller_id: None };
        assert!(invalidates(delete, &QueryKey::scoped(Ratings, 4)));
        assert!(invalidates(delete, &QueryKey::scoped(User, 4)));
    }

    #[test]
    fn test_update_profile_refreshes_identity() {
        assert!(invalidates(Mutation::UpdateProfile, &QueryKey::auth()));
    }

    #[test]
    fn test_logout_drops_identity_scoped_views() {
        for kind in [Auth, Dashboard, Wishlist, RatingsGiven] {
            assert!(invalidates(Mutation::Logout, &QueryKey::new(kind)));
        }
        assert!(!invalidates(Mutation::Logout, &QueryKey::new(AdminUsers)));
    }

    #[test]
    fn test_admin_deletes_touch_public_views() {
        let delete = Mutation::AdminDeleteListing { listing_id: 7 };
        assert!(invalidates(delete, &QueryKey::new(AdminListings)));
        assert!(invalidates(delete, &QueryKey::new(Listings)));
        assert!(invalidates(delete, &QueryKey::scoped(Listing, 7)));
    }

    #[test]
    fn test_admin_deletes_cover_owner_views() {
        let owner = Mutation::DeleteListing { listing_id: 7 };
        for admin in [
            Mutation::AdminDeleteListing { listing_id: 7 },
            Mutation::AdminDeleteUser { user_id: 3 },
        ] {
            for kind in [Auth, Dashboard, RatingsGiven, RatingCheck, Wishlist] {
                assert!(invalidates(admin, &QueryKey::new(kind)), "{} skips {:?}", admin, kind);
            }
            for key in [QueryKey::new(Auth), QueryKey::new(Dashboard), QueryKey::scoped(Listing, 7)] {
                if invalidates(owner, &key) {
                    assert!(invalidates(admin, &key), "{} skips {}", admin, key);
                }
            }
        }
    }
}
