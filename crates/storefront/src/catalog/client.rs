//! REST client for the catalog API.
//!
//! Uses `reqwest` for HTTP. Caches product metadata using `moka`.

use std::sync::Arc;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use rocketshoes_core::{Product, ProductId, StockRecord};

use super::{CatalogError, ProductCatalog, StockService};
use crate::config::CatalogConfig;

/// Maximum number of products kept in the metadata cache.
const CACHE_CAPACITY: u64 = 1000;

/// Client for the catalog API.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    bearer_token: Option<String>,
    products: Option<Cache<ProductId, Product>>,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rocketshoes/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let products = (!config.cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(config.cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: with_trailing_slash(config.base_url.clone()),
                bearer_token: config.bearer_token().map(ToString::to_string),
                products,
            }),
        })
    }

    /// Fetch and decode `{base}/{collection}/{id}`.
    async fn get_record<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: ProductId,
    ) -> Result<T, CatalogError> {
        let url = self
            .inner
            .base_url
            .join(&format!("{collection}/{id}"))
            .map_err(|e| CatalogError::Api {
                status: 0,
                message: format!("invalid request URL: {e}"),
            })?;

        let mut request = self.inner.client.get(url);
        if let Some(token) = &self.inner.bearer_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(format!("{collection}/{id}")));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CatalogError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Catalog API returned non-success status"
            );
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse catalog response"
            );
            CatalogError::Parse(e)
        })
    }
}

#[async_trait::async_trait]
impl ProductCatalog for CatalogClient {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        if let Some(cache) = &self.inner.products
            && let Some(product) = cache.get(&id).await
        {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let product: Product = self.get_record("products", id).await?;
        if product.id != id {
            return Err(CatalogError::IdMismatch {
                expected: id,
                actual: product.id,
            });
        }

        if let Some(cache) = &self.inner.products {
            cache.insert(id, product.clone()).await;
        }

        Ok(product)
    }
}

#[async_trait::async_trait]
impl StockService for CatalogClient {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn stock(&self, id: ProductId) -> Result<StockRecord, CatalogError> {
        let stock: StockRecord = self.get_record("stock", id).await?;
        if stock.product_id != id {
            return Err(CatalogError::IdMismatch {
                expected: id,
                actual: stock.product_id,
            });
        }
        debug!(available = stock.amount, "Fetched stock");
        Ok(stock)
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
