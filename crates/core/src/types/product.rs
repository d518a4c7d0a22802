//! Catalog records: product metadata and stock levels.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Product metadata as served by the catalog API (`GET /products/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    /// Unit price in the store currency.
    #[serde(default)]
    pub price: Decimal,
    /// Image URL.
    #[serde(default)]
    pub image: String,
}

impl Product {
    /// Create a product with no price or image, mostly useful in tests.
    #[must_use]
    pub fn new(id: ProductId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            price: Decimal::ZERO,
            image: String::new(),
        }
    }

    /// Set the unit price.
    #[must_use]
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = price;
        self
    }
}

/// Current available quantity for a product (`GET /stock/{id}`).
///
/// Read-only and never persisted with the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    #[serde(rename = "id")]
    pub product_id: ProductId,
    pub amount: u32,
}
