//! Cart store: the only way to mutate the shopper's cart.
//!
//! # Transactions
//!
//! Each operation is a read-validate-write transaction:
//!
//! 1. Take the transaction lock and copy the current snapshot
//! 2. Validate against the catalog or stock service
//! 3. Apply the change to the copy
//! 4. Persist the full copy with a single storage write
//! 5. Publish the copy to subscribers
//!
//! The lock is held across the lookups, so concurrent operations run one
//! after the other and never overwrite each other's result. A failure at any
//! step leaves the published state untouched and produces one notification.

mod error;

pub use error::{CartError, Outcome};

use std::num::NonZeroU32;
use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use rocketshoes_core::{Cart, ProductId};

use crate::catalog::{ProductCatalog, StockService};
use crate::config::{CartConfig, DEFAULT_STORAGE_KEY};
use crate::error::add_breadcrumb;
use crate::notify::{Locale, Notification, NotificationKind, Notifier};
use crate::storage::{KeyValueStorage, StorageError};

/// External collaborators of the cart store.
#[derive(Clone)]
pub struct CartServices {
    pub catalog: Arc<dyn ProductCatalog>,
    pub stock: Arc<dyn StockService>,
    pub storage: Arc<dyn KeyValueStorage>,
    pub notifier: Arc<dyn Notifier>,
}

/// Cart store settings.
#[derive(Debug, Clone)]
pub struct CartOptions {
    /// Storage key holding the serialized cart.
    pub storage_key: String,
    /// Language for notifications.
    pub locale: Locale,
}

impl Default for CartOptions {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            locale: Locale::default(),
        }
    }
}

impl From<&CartConfig> for CartOptions {
    fn from(config: &CartConfig) -> Self {
        Self {
            storage_key: config.storage_key.clone(),
            locale: config.locale,
        }
    }
}

/// Handle to the cart state.
///
/// Cheap to clone; every clone operates on the same cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    services: CartServices,
    options: CartOptions,
    txn: Mutex<()>,
    state: watch::Sender<Cart>,
}

impl CartStore {
    /// Rehydrate the cart from storage.
    ///
    /// A missing key yields an empty cart. A stored value that does not parse
    /// as a valid cart is logged and replaced by an empty cart on the next
    /// write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage backend itself cannot be read.
    #[instrument(skip(services, options), fields(key = %options.storage_key))]
    pub async fn load(services: CartServices, options: CartOptions) -> Result<Self, StorageError> {
        let cart = match services.storage.get_item(&options.storage_key).await? {
            None => Cart::new(),
            Some(raw) => serde_json::from_str::<Cart>(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Stored cart is invalid, starting with an empty cart");
                Cart::new()
            }),
        };
        info!(products = cart.len(), units = cart.item_count(), "Cart loaded");

        let (state, _) = watch::channel(cart);
        Ok(Self {
            inner: Arc::new(CartStoreInner {
                services,
                options,
                txn: Mutex::new(()),
                state,
            }),
        })
    }

    /// Current snapshot.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.inner.options.locale
    }

    /// Add one unit of a product.
    ///
    /// A product already in the cart goes through [`Self::set_quantity`] with
    /// its current amount plus one, and failures are reported the way
    /// quantity changes report them. Otherwise the product is fetched from
    /// the catalog and appended with amount 1.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(&self, product_id: ProductId) -> Outcome {
        let _txn = self.inner.txn.lock().await;
        let id = product_id.to_string();
        add_breadcrumb("cart", "add item", Some(&[("product_id", id.as_str())]));

        let snapshot = self.cart();
        if let Some(current) = snapshot.amount_of(product_id) {
            let next = i64::from(current.get()) + 1;
            debug!(amount = next, "Product already in cart, incrementing");
            let result = self.change_quantity(snapshot, product_id, next).await;
            return self.settle(product_id, NotificationKind::UpdateFailed, result);
        }

        let result = self.append_product(snapshot, product_id).await;
        self.settle(product_id, NotificationKind::AddFailed, result)
    }

    /// Remove a product from the cart.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: ProductId) -> Outcome {
        let _txn = self.inner.txn.lock().await;
        let id = product_id.to_string();
        add_breadcrumb("cart", "remove item", Some(&[("product_id", id.as_str())]));

        let mut cart = self.cart();
        let result = match cart.remove(product_id) {
            Some(_) => self.commit(cart).await.map(Some),
            None => Err(CartError::NotFound(product_id)),
        };
        self.settle(product_id, NotificationKind::RemoveFailed, result)
    }

    /// Set the amount of a product already in the cart.
    ///
    /// Amounts below 1 are ignored without a notification. The amount is
    /// checked against live stock; a product that is not in the cart is
    /// left alone.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn set_quantity(&self, product_id: ProductId, amount: i64) -> Outcome {
        let _txn = self.inner.txn.lock().await;
        let (id, requested) = (product_id.to_string(), amount.to_string());
        add_breadcrumb(
            "cart",
            "set quantity",
            Some(&[("product_id", id.as_str()), ("amount", requested.as_str())]),
        );

        let snapshot = self.cart();
        let result = self.change_quantity(snapshot, product_id, amount).await;
        self.settle(product_id, NotificationKind::UpdateFailed, result)
    }

    // =========================================================================
    // Transaction steps (caller holds the transaction lock)
    // =========================================================================

    async fn append_product(
        &self,
        mut cart: Cart,
        product_id: ProductId,
    ) -> Result<Option<Cart>, CartError> {
        let product = self
            .inner
            .services
            .catalog
            .product(product_id)
            .await
            .map_err(|source| CartError::Lookup { product_id, source })?;

        // Lock is held and the product was absent from the snapshot.
        if cart.push_product(product).is_err() {
            return Ok(None);
        }
        self.commit(cart).await.map(Some)
    }

    async fn change_quantity(
        &self,
        mut cart: Cart,
        product_id: ProductId,
        amount: i64,
    ) -> Result<Option<Cart>, CartError> {
        if amount < 1 {
            debug!(amount, "Ignoring amount below 1");
            return Ok(None);
        }

        let stock = self
            .inner
            .services
            .stock
            .stock(product_id)
            .await
            .map_err(|source| CartError::Lookup { product_id, source })?;

        let requested = u32::try_from(amount)
            .ok()
            .filter(|requested| *requested <= stock.amount)
            .and_then(NonZeroU32::new)
            .ok_or(CartError::OutOfStock {
                product_id,
                requested: amount,
                available: stock.amount,
            })?;

        if !cart.set_amount(product_id, requested) {
            debug!("Product not in cart, nothing to update");
            return Ok(None);
        }
        self.commit(cart).await.map(Some)
    }

    /// Persist then publish.
    async fn commit(&self, cart: Cart) -> Result<Cart, CartError> {
        let serialized = serde_json::to_string(&cart).map_err(StorageError::from)?;
        self.inner
            .services
            .storage
            .set_item(&self.inner.options.storage_key, &serialized)
            .await?;

        self.inner.state.send_replace(cart.clone());
        info!(products = cart.len(), units = cart.item_count(), "Cart updated");
        Ok(cart)
    }

    /// Turn a transaction result into an outcome, notifying on failure.
    fn settle(
        &self,
        product_id: ProductId,
        failure: NotificationKind,
        result: Result<Option<Cart>, CartError>,
    ) -> Outcome {
        match result {
            Ok(Some(cart)) => Outcome::Updated(cart),
            Ok(None) => Outcome::Unchanged,
            Err(err) => {
                let kind = match err {
                    CartError::OutOfStock { available, .. } => {
                        info!(available, "Requested amount exceeds stock");
                        NotificationKind::OutOfStock
                    }
                    _ => {
                        warn!(error = %err, "Cart operation failed");
                        failure
                    }
                };
                let notification = Notification::new(kind, product_id, self.locale());
                self.inner.services.notifier.notify(notification.clone());
                Outcome::Rejected {
                    error: err,
                    notification,
                }
            }
        }
    }
}
