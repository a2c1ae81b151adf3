//! Cache Key Module
//!
//! Structural query keys and the prefixes used to invalidate them.

use std::fmt;

// == Resource Kind ==
/// The family of server resource a query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// The signed-in identity (`GET /user`)
    Auth,
    /// Listing collections: all listings and search result pages
    Listings,
    /// A single listing detail
    Listing,
    /// The signed-in user's wishlist
    Wishlist,
    /// Public profile of another user
    User,
    /// Ratings received by a user
    Ratings,
    /// Ratings the signed-in user has given
    RatingsGiven,
    /// Whether the signed-in user has rated a seller
    RatingCheck,
    /// The signed-in user's dashboard
    Dashboard,
    /// Admin panel user table
    AdminUsers,
    /// Admin panel listing table
    AdminListings,
}

impl ResourceKind {
    /// Every kind, in declaration order.
    pub const ALL: [ResourceKind; 11] = [
        ResourceKind::Auth,
        ResourceKind::Listings,
        ResourceKind::Listing,
        ResourceKind::Wishlist,
        ResourceKind::User,
        ResourceKind::Ratings,
        ResourceKind::RatingsGiven,
        ResourceKind::RatingCheck,
        ResourceKind::Dashboard,
        ResourceKind::AdminUsers,
        ResourceKind::AdminListings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Auth => "auth",
            ResourceKind::Listings => "listings",
            ResourceKind::Listing => "listing",
            ResourceKind::Wishlist => "wishlist",
            ResourceKind::User => "user",
            ResourceKind::Ratings => "ratings",
            ResourceKind::RatingsGiven => "ratings_given",
            ResourceKind::RatingCheck => "rating_check",
            ResourceKind::Dashboard => "dashboard",
            ResourceKind::AdminUsers => "admin_users",
            ResourceKind::AdminListings => "admin_listings",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Query Key ==
/// Identifies one cacheable query.
///
/// Keys compare structurally: two independently built keys with the same
/// kind, scope and parameters address the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    kind: ResourceKind,
    scope: Option<u64>,
    params: Vec<(String, String)>,
}

impl QueryKey {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            scope: None,
            params: Vec::new(),
        }
    }

    /// Key for a resource owned by or identified by `id`.
    pub fn scoped(kind: ResourceKind, id: u64) -> Self {
        Self::new(kind).with_scope(id)
    }

    pub fn with_scope(mut self, id: u64) -> Self {
        self.scope = Some(id);
        self
    }

    /// Appends a parameter. Order is significant.
    pub fn param(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    /// Appends a parameter only when a value is present.
    pub fn param_opt<V: fmt::Display>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(name, v),
            None => self,
        }
    }

    /// The identity-scoped key of the signed-in user.
    pub fn auth() -> Self {
        Self::new(ResourceKind::Auth)
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn scope(&self) -> Option<u64> {
        self.scope
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(scope) = self.scope {
            write!(f, "/{}", scope)?;
        }
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, name, value)?;
        }
        Ok(())
    }
}

// == Key Prefix ==
/// Selects a set of query keys for invalidation.
///
/// - kind only: every key of that kind
/// - with scope: only keys carrying that scope
/// - with params: keys whose parameter list starts with them
/// - exact: only the one structurally equal key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPrefix {
    kind: ResourceKind,
    scope: Option<u64>,
    params: Vec<(String, String)>,
    exact: bool,
}

impl KeyPrefix {
    pub fn kind(kind: ResourceKind) -> Self {
        Self {
            kind,
            scope: None,
            params: Vec::new(),
            exact: false,
        }
    }

    pub fn scoped(kind: ResourceKind, id: u64) -> Self {
        Self {
            scope: Some(id),
            ..Self::kind(kind)
        }
    }

    /// Matches `key` and nothing else.
    pub fn exact(key: &QueryKey) -> Self {
        Self {
            kind: key.kind,
            scope: key.scope,
            params: key.params.clone(),
            exact: true,
        }
    }

    pub fn param(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    pub fn resource_kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        if self.kind != key.kind {
            return false;
        }
        if self.exact {
            return self.scope == key.scope && self.params == key.params;
        }
        if self.scope.is_some() && self.scope != key.scope {
            return false;
        }
        key.params.starts_with(&self.params)
    }
}

impl From<ResourceKind> for KeyPrefix {
    fn from(kind: ResourceKind) -> Self {
        KeyPrefix::kind(kind)
    }
}

impl From<&QueryKey> for KeyPrefix {
    fn from(key: &QueryKey) -> Self {
        KeyPrefix::exact(key)
    }
}

impl fmt::Display for KeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(scope) = self.scope {
            write!(f, "/{}", scope)?;
        }
        for (name, value) in &self.params {
            write!(f, " {}={}", name, value)?;
        }
        if !self.exact {
            f.write_str("*")?;
        }
        Ok(())
    }
}
