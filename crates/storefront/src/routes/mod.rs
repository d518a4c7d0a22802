//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Health check
//!
//! # Cart (JSON)
//! GET    /cart                 - Cart contents and totals
//! GET    /cart/count           - Number of distinct products
//! POST   /cart/items           - Add one unit of a product
//! PUT    /cart/items/{id}      - Set the amount of a product
//! DELETE /cart/items/{id}      - Remove a product
//! ```

pub mod cart;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/items", post(cart::add))
        .route("/items/{id}", put(cart::update).delete(cart::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/cart", cart_routes())
}

/// Build the full application with state and request tracing.
pub fn router(state: AppState) -> Router {
    routes().with_state(state).layer(TraceLayer::new_for_http())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
