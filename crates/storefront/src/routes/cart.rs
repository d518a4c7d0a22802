//! Cart route handlers.
//!
//! Every mutating handler answers with the cart as it stands after the
//! operation. A no-op is still a 200; a rejection carries the localized
//! notification text and a status derived from the failure.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use rocketshoes_core::{Cart, LineItem, ProductId};

use crate::cart::{CartStore, Outcome};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: ProductId,
    pub title: String,
    pub image: String,
    pub price: String,
    pub amount: u32,
    pub line_total: String,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    /// Total units across all lines.
    pub item_count: u64,
    /// Number of distinct products.
    pub count: usize,
}

/// Distinct product count, for the header badge.
#[derive(Debug, Serialize)]
pub struct CountView {
    pub count: usize,
}

fn format_price(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

impl From<&LineItem> for CartItemView {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.product_id(),
            title: item.product.title.clone(),
            image: item.product.image.clone(),
            price: format_price(item.product.price),
            amount: item.amount.get(),
            line_total: format_price(item.line_total()),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.iter().map(CartItemView::from).collect(),
            subtotal: format_price(cart.subtotal()),
            item_count: cart.item_count(),
            count: cart.len(),
        }
    }
}

// =============================================================================
// Request Bodies
// =============================================================================

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
}

/// Quantity update request body.
///
/// Signed on purpose: amounts below one are accepted and ignored.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub amount: i64,
}

fn product_path(path: std::result::Result<Path<i64>, PathRejection>) -> Result<ProductId> {
    let Path(id) = path.map_err(|e| AppError::BadRequest(e.body_text()))?;
    Ok(ProductId::new(id))
}

fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

fn respond(store: &CartStore, outcome: Outcome) -> Result<Json<CartView>> {
    match outcome {
        Outcome::Updated(cart) => Ok(Json(CartView::from(&cart))),
        Outcome::Unchanged => Ok(Json(CartView::from(&store.cart()))),
        Outcome::Rejected {
            error,
            notification,
        } => Err(AppError::Cart {
            source: error,
            notification,
        }),
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Current cart contents.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<CartView> {
    Json(CartView::from(&state.cart().cart()))
}

/// Distinct product count.
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> Json<CountView> {
    Json(CountView {
        count: state.cart().cart().len(),
    })
}

/// Add one unit of a product.
#[instrument(skip(state, body))]
pub async fn add(
    State(state): State<AppState>,
    body: std::result::Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<CartView>> {
    let request = json_body(body)?;
    let outcome = state.cart().add_item(request.product_id).await;
    respond(state.cart(), outcome)
}

/// Set the amount of a product already in the cart.
#[instrument(skip(state, path, body))]
pub async fn update(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
    body: std::result::Result<Json<UpdateQuantityRequest>, JsonRejection>,
) -> Result<Json<CartView>> {
    let product_id = product_path(path)?;
    let request = json_body(body)?;
    let outcome = state
        .cart()
        .set_quantity(product_id, request.amount)
        .await;
    respond(state.cart(), outcome)
}

/// Remove a product from the cart.
#[instrument(skip(state, path))]
pub async fn remove(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<CartView>> {
    let product_id = product_path(path)?;
    let outcome = state.cart().remove_item(product_id).await;
    respond(state.cart(), outcome)
}
