//! Product catalog and stock lookups.
//!
//! # Architecture
//!
//! - [`ProductCatalog`] and [`StockService`] are the seams the cart store
//!   depends on; tests swap in in-process fakes
//! - [`CatalogClient`] implements both over the catalog REST API
//! - Product metadata is cached via `moka`; stock levels are always fetched
//!   live because they gate quantity changes
//!
//! # Endpoints
//!
//! ```text
//! GET {base}/products/{id}  -> {"id":1,"title":"…","price":179.9,"image":"…"}
//! GET {base}/stock/{id}     -> {"id":1,"amount":3}
//! ```

mod client;

pub use client::CatalogClient;

use async_trait::async_trait;
use thiserror::Error;

use rocketshoes_core::{Product, ProductId, StockRecord};

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The API answered for a different product than requested.
    #[error("expected product {expected}, got {actual}")]
    IdMismatch {
        expected: ProductId,
        actual: ProductId,
    },
}

/// Lookup of product metadata by id.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn product(&self, id: ProductId) -> Result<Product, CatalogError>;
}

/// Lookup of currently available quantity by id.
#[async_trait]
pub trait StockService: Send + Sync {
    async fn stock(&self, id: ProductId) -> Result<StockRecord, CatalogError>;
}
