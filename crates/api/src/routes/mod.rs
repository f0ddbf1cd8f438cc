//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (pings the database)
//! GET  /api/test-db             - Insert and count a probe document
//!
//! # Users
//! POST /api/user                - Create a profile (name, email)
//! POST /api/users/signup        - Register with a password
//! POST /api/users/login         - Password login
//!
//! # Mock store (always in-memory)
//! GET    /api/mock/{name}       - List
//! POST   /api/mock/{name}       - Create
//! GET    /api/mock/{name}/{id}  - Show
//! PUT    /api/mock/{name}/{id}  - Merge update
//! DELETE /api/mock/{name}/{id}  - Delete
//!
//! # Durable store (in-memory in fallback mode)
//! GET    /{name}                - List
//! POST   /{name}                - Create
//! GET    /{name}/{id}           - Show
//! PUT    /{name}/{id}           - Merge update
//! DELETE /{name}/{id}           - Delete
//! ```
//!
//! `{name}` is one of `products`, `wishlist`, `test`, `orders`, `users`,
//! `cart`, `reviews`, `payments`, `deliveries`, `userLocations`. Anything
//! else, and any unmatched path, is a JSON 404.

pub mod health;
pub mod resources;
pub mod users;

use axum::{
    Router,
    http::Uri,
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;
use resources::{Backend, Durable, Mock};

/// Create the full route tree.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
        .merge(resource_routes::<Durable>())
        .fallback(not_found)
}

/// Create the `/api` routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/test-db", get(health::test_db))
        .route("/user", post(users::create_profile))
        .nest("/users", user_routes())
        .nest("/mock", resource_routes::<Mock>())
}

/// Create the signup/login routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(users::signup))
        .route("/login", post(users::login))
}

/// Create the CRUD routes router for a backend.
pub fn resource_routes<B: Backend>() -> Router<AppState> {
    Router::new()
        .route(
            "/{name}",
            get(resources::list::<B>).post(resources::create::<B>),
        )
        .route(
            "/{name}/{id}",
            get(resources::show::<B>)
                .put(resources::update::<B>)
                .delete(resources::destroy::<B>),
        )
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Route not found: {}", uri.path()))
}
