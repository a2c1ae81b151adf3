//! Stand-in marketplace backend for integration tests.
//!
//! Serves a small slice of the real API on an ephemeral port and counts
//! every call per route so tests can assert on network traffic.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use campus_market_client::token::MemoryTokenStore;
use campus_market_client::{ClientConfig, Session};

pub const PASSWORD: &str = "secret";
pub const SELLER_ID: u64 = 2;

/// How `POST /auth/refresh` answers.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshMode {
    /// Issue this token and start accepting it
    Grant(String),
    /// Issue this token but keep rejecting it
    GrantUnaccepted(String),
    Reject,
}

#[derive(Debug)]
pub struct Backend {
    pub valid_token: String,
    pub admin_token: String,
    pub refresh: RefreshMode,
    pub refresh_delay: Duration,
    pub require_cookie: bool,
    pub wishlist: HashSet<u64>,
    pub ratings: Vec<Value>,
    /// Name reported by `GET /user`
    pub user_name: String,
    /// Answer `GET /public/listings/:id` with a body of the wrong shape
    pub malformed_listing: bool,
    /// Statuses `GET /user/dashboard` fails with before answering normally
    pub dashboard_failures: VecDeque<StatusCode>,
    /// Answer rating updates without echoing the rating
    pub bare_rating_updates: bool,
    next_id: u64,
    calls: HashMap<&'static str, usize>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            valid_token: "token-1".to_string(),
            admin_token: "admin-token".to_string(),
            refresh: RefreshMode::Reject,
            refresh_delay: Duration::ZERO,
            require_cookie: false,
            wishlist: HashSet::new(),
            ratings: Vec::new(),
            user_name: "Ana".to_string(),
            malformed_listing: false,
            dashboard_failures: VecDeque::new(),
            bare_rating_updates: false,
            next_id: 100,
            calls: HashMap::new(),
        }
    }
}

impl Backend {
    fn hit(&mut self, route: &'static str) {
        *self.calls.entry(route).or_insert(0) += 1;
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        authorization(headers) == Some(self.valid_token.as_str())
    }
}

type Shared = Arc<Mutex<Backend>>;

fn lock(state: &Shared) -> MutexGuard<'_, Backend> {
    state.lock().unwrap()
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

fn has_refresh_cookie(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .any(|v| v.to_str().map_or(false, |c| c.contains("refreshToken=")))
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn unauthorized() -> Response {
    error(StatusCode::UNAUTHORIZED, "Unauthorized")
}

pub fn listing_json(id: u64) -> Value {
    json!({
        "id": id,
        "created_at": "2025-03-01T10:15:30Z",
        "user_id": SELLER_ID,
        "title": format!("Listing {}", id),
        "description": "Barely used",
        "category": "books",
        "image_urls": [],
        "price": 10.0 * id as f64,
        "is_closed": false
    })
}

// == Auth ==
async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut s = lock(&state);
    s.hit("POST /auth/login");
    if body["password"] != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    let token = s.valid_token.clone();
    (
        [(header::SET_COOKIE, "refreshToken=refresh-1; Path=/; HttpOnly")],
        Json(json!({ "accessToken": token })),
    )
        .into_response()
}

async fn register(State(state): State<Shared>) -> Response {
    lock(&state).hit("POST /auth/register");
    (StatusCode::CREATED, Json(json!({ "success": true }))).into_response()
}

async fn logout(State(state): State<Shared>) -> Response {
    lock(&state).hit("POST /auth/logout");
    Json(json!({ "success": true })).into_response()
}

async fn refresh(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let delay = {
        let mut s = lock(&state);
        s.hit("POST /auth/refresh");
        s.refresh_delay
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let mut s = lock(&state);
    if s.require_cookie && !has_refresh_cookie(&headers) {
        return unauthorized();
    }
    match s.refresh.clone() {
        RefreshMode::Grant(token) => {
            s.valid_token = token.clone();
            Json(json!({ "accessToken": token })).into_response()
        }
        RefreshMode::GrantUnaccepted(token) => Json(json!({ "accessToken": token })).into_response(),
        RefreshMode::Reject => unauthorized(),
    }
}

async fn admin_login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut s = lock(&state);
    s.hit("POST /admin/auth/login");
    if body["username"] != "admin" || body["password"] != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Invalid admin credentials");
    }
    Json(json!({ "accessToken": s.admin_token.clone() })).into_response()
}

// == Identity ==
async fn identity(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut s = lock(&state);
    s.hit("GET /user");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "user": {
            "id": 1,
            "email": "ana@uni.edu",
            "name": s.user_name.clone(),
            "university": "State University",
            "average_rating": 0.0,
            "rating_count": 0
        },
        "listings": null
    }))
    .into_response()
}

async fn update_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = lock(&state);
    s.hit("PATCH /user/me");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    if let Some(name) = body["name"].as_str() {
        s.user_name = name.to_string();
    }
    Json(json!({ "success": true, "message": "Profile updated successfully" })).into_response()
}

// == Listings ==
async fn listings(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut s = lock(&state);
    s.hit("GET /public/listings");
    let signed_in = s.authorized(&headers);
    let body: Vec<Value> = (1..=3)
        .map(|id| {
            json!({
                "listing": listing_json(id),
                "is_in_wishlist": signed_in && s.wishlist.contains(&id)
            })
        })
        .collect();
    Json(Value::Array(body)).into_response()
}

async fn listing(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let mut s = lock(&state);
    s.hit("GET /public/listings/:id");
    if !(1..=3).contains(&id) {
        return error(StatusCode::NOT_FOUND, "Listing not found");
    }
    if s.malformed_listing {
        return Json(json!({ "unexpected": true })).into_response();
    }
    let in_wishlist = s.authorized(&headers) && s.wishlist.contains(&id);
    Json(json!({ "listing": listing_json(id), "is_in_wishlist": in_wishlist })).into_response()
}

async fn search(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    lock(&state).hit("GET /public/listings/search");
    let page: u64 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    Json(json!([{ "listing": listing_json(page), "is_in_wishlist": false }])).into_response()
}

async fn create_listing(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = lock(&state);
    s.hit("POST /user/listings");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    s.next_id += 1;
    let mut listing = listing_json(s.next_id);
    listing["title"] = body["title"].clone();
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "listing": listing })),
    )
        .into_response()
}

async fn toggle_wishlist(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let mut s = lock(&state);
    s.hit("POST /user/listings/wishlist/:id");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    let action = if s.wishlist.remove(&id) {
        "removed"
    } else {
        s.wishlist.insert(id);
        "added"
    };
    Json(json!({ "success": true, "action": action })).into_response()
}

async fn wishlist(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut s = lock(&state);
    s.hit("GET /user/listings/wishlist");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    // Go marshals an empty slice as null.
    if s.wishlist.is_empty() {
        return Json(Value::Null).into_response();
    }
    let mut ids: Vec<u64> = s.wishlist.iter().copied().collect();
    ids.sort_unstable();
    Json(Value::Array(ids.into_iter().map(listing_json).collect())).into_response()
}

async fn dashboard(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut s = lock(&state);
    s.hit("GET /user/dashboard");
    if let Some(status) = s.dashboard_failures.pop_front() {
        return error(status, "Temporarily unavailable");
    }
    if !s.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "stats": {
            "total_listings": 3,
            "active_listings": 3,
            "closed_listings": 0,
            "total_wishlists": s.wishlist.len(),
            "average_price": 20.0
        },
        "listings": [],
        "ratings": { "ratings": [], "average_rating": 0.0, "rating_count": 0 }
    }))
    .into_response()
}

// == Ratings ==
async fn create_rating(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = lock(&state);
    s.hit("POST /user/ratings");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    s.next_id += 1;
    let rating = json!({
        "id": s.next_id,
        "user_id": body["user_id"],
        "rater_id": 1,
        "listing_id": body.get("listing_id"),
        "rating": body["rating"],
        "comment": body["comment"]
    });
    s.ratings.push(rating.clone());
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "rating": rating })),
    )
        .into_response()
}

async fn user_ratings(State(state): State<Shared>, Path(id): Path<u64>) -> Response {
    let mut s = lock(&state);
    s.hit("GET /public/ratings/user/:id");
    let ratings: Vec<Value> = s
        .ratings
        .iter()
        .filter(|r| r["user_id"] == id)
        .cloned()
        .collect();
    let count = ratings.len();
    let average = if count == 0 {
        0.0
    } else {
        ratings
            .iter()
            .filter_map(|r| r["rating"].as_f64())
            .sum::<f64>()
            / count as f64
    };
    Json(json!({ "ratings": ratings, "average_rating": average, "rating_count": count }))
        .into_response()
}

// == Admin ==
async fn admin_users(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut s = lock(&state);
    s.hit("GET /admin/users");
    if authorization(&headers) != Some(s.admin_token.as_str()) {
        return error(StatusCode::UNAUTHORIZED, "Invalid admin token");
    }
    Json(json!([{
        "id": 1,
        "email": "ana@uni.edu",
        "name": "Ana",
        "university": "State University",
        "listings_count": 3,
        "average_rating": 0.0,
        "rating_count": 0
    }]))
    .into_response()
}

async fn admin_delete_user(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let mut s = lock(&state);
    s.hit("DELETE /admin/users/:id");
    if authorization(&headers) != Some(s.admin_token.as_str()) {
        return error(StatusCode::UNAUTHORIZED, "Invalid admin token");
    }
    Json(json!({ "success": true, "message": format!("User {} deleted successfully", id) }))
        .into_response()
}

// == Listing Edits ==
async fn update_listing(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = lock(&state);
    s.hit("PATCH /user/listings/:id");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    if !(1..=3).contains(&id) {
        return error(StatusCode::NOT_FOUND, "Listing not found");
    }
    let mut listing = listing_json(id);
    if let Some(title) = body.get("title") {
        listing["title"] = title.clone();
    }
    Json(json!({ "success": true, "listing": listing })).into_response()
}

async fn delete_listing(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let mut s = lock(&state);
    s.hit("DELETE /user/listings/:id");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    s.wishlist.remove(&id);
    Json(json!({ "success": true, "message": "Listing deleted successfully" })).into_response()
}

// == Rating Edits ==
async fn update_rating(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = lock(&state);
    s.hit("PATCH /user/ratings/:id");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    let Some(rating) = s.ratings.iter_mut().find(|r| r["id"] == id) else {
        return error(StatusCode::NOT_FOUND, "Rating not found");
    };
    rating["rating"] = body["rating"].clone();
    rating["comment"] = body["comment"].clone();
    let rating = rating.clone();
    if s.bare_rating_updates {
        return Json(json!({ "success": true })).into_response();
    }
    Json(json!({ "success": true, "rating": rating })).into_response()
}

async fn delete_rating(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let mut s = lock(&state);
    s.hit("DELETE /user/ratings/:id");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    s.ratings.retain(|r| r["id"] != id);
    Json(json!({ "success": true, "message": "Rating deleted successfully" })).into_response()
}

async fn ratings_given(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut s = lock(&state);
    s.hit("GET /user/ratings/given");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    if s.ratings.is_empty() {
        return Json(Value::Null).into_response();
    }
    Json(Value::Array(s.ratings.clone())).into_response()
}

async fn check_rating(
    State(state): State<Shared>,
    Path(seller): Path<u64>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let mut s = lock(&state);
    s.hit("GET /public/ratings/check/:seller");
    let listing_id: Option<u64> = params.get("listing_id").and_then(|v| v.parse().ok());
    let found = s
        .ratings
        .iter()
        .find(|r| {
            r["user_id"] == seller
                && listing_id.map_or(true, |id| r["listing_id"] == id)
        })
        .cloned();
    if !s.authorized(&headers) || found.is_none() {
        return Json(json!({ "has_rated": false })).into_response();
    }
    Json(json!({ "has_rated": true, "rating": found })).into_response()
}

// == Users ==
async fn public_user(State(state): State<Shared>, Path(id): Path<u64>) -> Response {
    let mut s = lock(&state);
    s.hit("GET /public/users/:id");
    if !(1..=2).contains(&id) {
        return error(StatusCode::NOT_FOUND, "User not found");
    }
    let name = if id == 1 { s.user_name.clone() } else { "Sam".to_string() };
    Json(json!({ "id": id, "name": name, "university": "State University" })).into_response()
}

async fn admin_delete_listing(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let mut s = lock(&state);
    s.hit("DELETE /admin/listings/:id");
    if authorization(&headers) != Some(s.admin_token.as_str()) {
        return error(StatusCode::UNAUTHORIZED, "Invalid admin token");
    }
    s.wishlist.remove(&id);
    Json(json!({ "success": true, "message": format!("Listing {} deleted successfully", id) }))
        .into_response()
}

// == AI ==
async fn suggest_price(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = lock(&state);
    s.hit("POST /ai/suggest-price");
    if !s.authorized(&headers) {
        return unauthorized();
    }
    let anchor = body["price"].as_f64().unwrap_or(10.0);
    Json(json!({
        "suggested_price_min": anchor * 0.8,
        "suggested_price_max": anchor * 1.2,
        "confidence_level": "medium",
        "currency": "USD",
        "reasoning": "Similar listings on campus"
    }))
    .into_response()
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh", post(refresh))
        .route("/admin/auth/login", post(admin_login))
        .route("/user", get(identity))
        .route("/user/me", patch(update_profile))
        .route("/public/listings", get(listings))
        .route("/public/listings/search", get(search))
        .route("/public/listings/:id", get(listing))
        .route("/user/listings", post(create_listing))
        .route(
            "/user/listings/:id",
            patch(update_listing).delete(delete_listing),
        )
        .route("/user/listings/wishlist", get(wishlist))
        .route("/user/listings/wishlist/:id", post(toggle_wishlist))
        .route("/user/dashboard", get(dashboard))
        .route("/user/ratings", post(create_rating))
        .route("/user/ratings/given", get(ratings_given))
        .route(
            "/user/ratings/:id",
            patch(update_rating).delete(delete_rating),
        )
        .route("/public/ratings/user/:id", get(user_ratings))
        .route("/public/ratings/check/:seller", get(check_rating))
        .route("/public/users/:id", get(public_user))
        .route("/admin/users", get(admin_users))
        .route("/admin/users/:id", delete(admin_delete_user))
        .route("/admin/listings/:id", delete(admin_delete_listing))
        .route("/ai/suggest-price", post(suggest_price))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// == Harness ==
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(Backend::default()));
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            server,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::default().with_base_url(self.url())
    }

    /// A signed-out session with in-memory token stores.
    pub fn session(&self) -> Session {
        Session::with_stores(
            self.config(),
            MemoryTokenStore::shared(),
            MemoryTokenStore::shared(),
        )
        .unwrap()
    }

    /// A session whose access slot already holds `token`.
    pub fn session_with_token(&self, token: &str) -> Session {
        Session::with_stores(
            self.config(),
            Arc::new(MemoryTokenStore::with_token(token)),
            MemoryTokenStore::shared(),
        )
        .unwrap()
    }

    pub fn configure(&self, f: impl FnOnce(&mut Backend)) {
        f(&mut lock(&self.state));
    }

    pub fn calls(&self, route: &str) -> usize {
        lock(&self.state).calls.get(route).copied().unwrap_or(0)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A base URL nothing listens on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
