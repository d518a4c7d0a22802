//! Error and outcome types for cart operations.

use thiserror::Error;

use rocketshoes_core::{Cart, ProductId};

use crate::catalog::CatalogError;
use crate::notify::Notification;
use crate::storage::StorageError;

/// Why a cart operation was rejected.
#[derive(Debug, Error)]
pub enum CartError {
    /// Product or stock lookup failed.
    #[error("lookup failed for product {product_id}: {source}")]
    Lookup {
        product_id: ProductId,
        #[source]
        source: CatalogError,
    },

    /// The product is not in the cart.
    #[error("product {0} is not in the cart")]
    NotFound(ProductId),

    /// Requested amount exceeds available stock.
    #[error("requested {requested} of product {product_id}, only {available} in stock")]
    OutOfStock {
        product_id: ProductId,
        requested: i64,
        available: u32,
    },

    /// The new snapshot could not be persisted.
    #[error("failed to persist cart: {0}")]
    Storage(#[from] StorageError),
}

/// Result of a cart operation.
///
/// Rejections have already been reported to the notifier by the time the
/// caller sees them.
#[derive(Debug)]
#[must_use]
pub enum Outcome {
    /// A new snapshot was persisted and published.
    Updated(Cart),
    /// Nothing to do: amount below 1, or quantity change for a product
    /// that is not in the cart.
    Unchanged,
    /// The operation was abandoned; state is untouched. `notification` is
    /// what the notifier received.
    Rejected {
        error: CartError,
        notification: Notification,
    },
}

impl Outcome {
    #[must_use]
    pub const fn is_updated(&self) -> bool {
        matches!(self, Self::Updated(_))
    }

    #[must_use]
    pub const fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// The rejection reason, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&CartError> {
        match self {
            Self::Rejected { error, .. } => Some(error),
            _ => None,
        }
    }
}
