//! Cart commands.
//!
//! Operate on the same persisted cart the storefront serves, going through
//! the cart store so stock checks and notifications behave identically.
//!
//! # Usage
//!
//! ```bash
//! rs-cli cart show
//! rs-cli cart add 5
//! rs-cli cart set 5 3
//! rs-cli cart remove 5
//! ```
//!
//! # Environment Variables
//!
//! - `CATALOG_API_URL` - Base URL of the catalog and stock API
//! - `CART_STORAGE_PATH` - File holding the persisted cart
//! - `CART_LOCALE` - Notification language (`en` or `pt-BR`)

use std::sync::Arc;

use rocketshoes_core::{Cart, ProductId};
use rocketshoes_storefront::cart::{CartOptions, CartServices, CartStore, Outcome};
use rocketshoes_storefront::catalog::{CatalogClient, CatalogError};
use rocketshoes_storefront::config::{CartConfig, CatalogConfig, ConfigError};
use rocketshoes_storefront::notify::TracingNotifier;
use rocketshoes_storefront::storage::{FileStorage, StorageError};
use thiserror::Error;

/// Errors that can occur during cart commands.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Catalog client could not be built.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The persisted cart could not be read.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The operation was rejected; the message is the shopper-facing text.
    #[error("{0}")]
    Rejected(String),
}

/// Which mutation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    Add(ProductId),
    Remove(ProductId),
    Set(ProductId, i64),
}

async fn open_store() -> Result<CartStore, CartCommandError> {
    let _ = dotenvy::dotenv();

    let catalog_config = CatalogConfig::from_env()?;
    let cart_config = CartConfig::from_env()?;

    let catalog = Arc::new(CatalogClient::new(&catalog_config)?);
    let services = CartServices {
        catalog: catalog.clone(),
        stock: catalog,
        storage: Arc::new(FileStorage::new(&cart_config.storage_path)),
        notifier: Arc::new(TracingNotifier),
    };

    Ok(CartStore::load(services, CartOptions::from(&cart_config)).await?)
}

/// Print the persisted cart.
///
/// # Errors
///
/// Returns error if configuration is invalid or the storage cannot be read.
pub async fn show() -> Result<(), CartCommandError> {
    let store = open_store().await?;
    log_cart(&store.cart());
    Ok(())
}

/// Run one cart mutation and print the resulting cart.
///
/// # Errors
///
/// Returns `CartCommandError::Rejected` with the localized notification text
/// when the cart store refuses the operation.
pub async fn apply(action: CartAction) -> Result<(), CartCommandError> {
    let store = open_store().await?;

    let outcome = match action {
        CartAction::Add(id) => store.add_item(id).await,
        CartAction::Remove(id) => store.remove_item(id).await,
        CartAction::Set(id, amount) => store.set_quantity(id, amount).await,
    };

    match outcome {
        Outcome::Updated(cart) => {
            tracing::info!("Cart updated");
            log_cart(&cart);
            Ok(())
        }
        Outcome::Unchanged => {
            tracing::info!("Nothing to change");
            log_cart(&store.cart());
            Ok(())
        }
        Outcome::Rejected { notification, .. } => {
            Err(CartCommandError::Rejected(notification.message))
        }
    }
}

fn log_cart(cart: &Cart) {
    if cart.is_empty() {
        tracing::info!("Cart is empty");
        return;
    }

    for line in summarize(cart) {
        tracing::info!("  {line}");
    }
    tracing::info!(
        "{} product(s), {} unit(s), subtotal {:.2}",
        cart.len(),
        cart.item_count(),
        cart.subtotal()
    );
}

/// One display line per cart item.
fn summarize(cart: &Cart) -> Vec<String> {
    cart.iter()
        .map(|item| {
            format!(
                "#{} {} x{} @ {:.2} = {:.2}",
                item.product_id(),
                item.product.title,
                item.amount,
                item.product.price,
                item.line_total()
            )
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rocketshoes_core::Product;

    use super::*;

    #[test]
    fn test_summarize_lines() {
        let mut cart = Cart::new();
        cart.push_product(
            Product::new(ProductId::new(5), "Shoe").with_price("179.9".parse().unwrap()),
        )
        .unwrap();

        assert_eq!(summarize(&cart), vec!["#5 Shoe x1 @ 179.90 = 179.90"]);
    }
}
