//! Integration tests for RocketShoes.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! Each [`TestContext`] starts two servers on ephemeral ports: a fake
//! catalog API serving `products/{id}` and `stock/{id}`, and the real
//! storefront router wired to it. Carts persist to a throwaway file under
//! the system temp directory.

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use reqwest::Client;
use serde_json::{Value, json};
use url::Url;
use uuid::Uuid;

use rocketshoes_storefront::cart::{CartOptions, CartServices, CartStore};
use rocketshoes_storefront::catalog::CatalogClient;
use rocketshoes_storefront::config::{CartConfig, CatalogConfig, DEFAULT_STORAGE_KEY, StorefrontConfig};
use rocketshoes_storefront::notify::{Locale, MemoryNotifier};
use rocketshoes_storefront::routes;
use rocketshoes_storefront::state::AppState;
use rocketshoes_storefront::storage::FileStorage;

// ============================================================================
// Fake Catalog API
// ============================================================================

/// Products and stock levels served by the fake catalog.
///
/// Stock can be changed while a test runs; product metadata is fixed.
#[derive(Debug, Default)]
pub struct CatalogFixture {
    products: HashMap<i64, Value>,
    stock: RwLock<HashMap<i64, u32>>,
}

impl CatalogFixture {
    /// The shoes every test starts with.
    #[must_use]
    pub fn shoes() -> Self {
        let mut fixture = Self::default();
        fixture.insert(1, "Tênis de Caminhada Leve Confortável", 179.9, 3);
        fixture.insert(2, "Tênis VR Caminhada Confortável Detalhes Couro Masculino", 139.9, 5);
        fixture.insert(5, "Shoe", 99.9, 10);
        fixture.insert(7, "Last Pair", 250.0, 1);
        fixture
    }

    fn insert(&mut self, id: i64, title: &str, price: f64, stock: u32) {
        self.products.insert(
            id,
            json!({
                "id": id,
                "title": title,
                "price": price,
                "image": format!("https://cdn.rocketshoes.test/{id}.jpg"),
            }),
        );
        self.set_stock(id, stock);
    }

    /// Change the stock level reported for a product.
    pub fn set_stock(&self, id: i64, amount: u32) {
        self.stock
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, amount);
    }

    fn stock_of(&self, id: i64) -> Option<u32> {
        self.stock
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
    }
}

async fn product_handler(
    State(fixture): State<Arc<CatalogFixture>>,
    UrlPath(id): UrlPath<i64>,
) -> Response {
    fixture.products.get(&id).map_or_else(
        || StatusCode::NOT_FOUND.into_response(),
        |product| Json(product.clone()).into_response(),
    )
}

async fn stock_handler(
    State(fixture): State<Arc<CatalogFixture>>,
    UrlPath(id): UrlPath<i64>,
) -> Response {
    fixture.stock_of(id).map_or_else(
        || StatusCode::NOT_FOUND.into_response(),
        |amount| Json(json!({ "id": id, "amount": amount })).into_response(),
    )
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });
    format!("http://{addr}")
}

// ============================================================================
// Test Context
// ============================================================================

/// A running storefront backed by a fake catalog.
pub struct TestContext {
    pub client: Client,
    pub storefront_url: String,
    pub catalog: Arc<CatalogFixture>,
    pub notifier: Arc<MemoryNotifier>,
    pub store: CartStore,
    pub storage_path: PathBuf,
}

impl TestContext {
    /// Fresh storefront with an empty cart.
    pub async fn new() -> Self {
        Self::with_storage(temp_storage_path()).await
    }

    /// Storefront that loads its cart from `storage_path`.
    pub async fn with_storage(storage_path: PathBuf) -> Self {
        let catalog = Arc::new(CatalogFixture::shoes());
        let catalog_app = Router::new()
            .route("/products/{id}", get(product_handler))
            .route("/stock/{id}", get(stock_handler))
            .with_state(catalog.clone());
        let catalog_url = serve(catalog_app).await;

        let config = StorefrontConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            catalog: CatalogConfig {
                base_url: Url::parse(&catalog_url).expect("Invalid catalog URL"),
                api_token: None,
                cache_ttl: Duration::from_secs(60),
            },
            cart: CartConfig {
                storage_path: storage_path.clone(),
                storage_key: DEFAULT_STORAGE_KEY.to_string(),
                locale: Locale::PtBr,
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        let client = Arc::new(
            CatalogClient::new(&config.catalog).expect("Failed to build catalog client"),
        );
        let notifier = Arc::new(MemoryNotifier::new());
        let services = CartServices {
            catalog: client.clone(),
            stock: client,
            storage: Arc::new(FileStorage::new(&storage_path)),
            notifier: notifier.clone(),
        };
        let store = CartStore::load(services, CartOptions::from(&config.cart))
            .await
            .expect("Failed to load cart");

        let app = routes::router(AppState::new(config, store.clone()));
        let storefront_url = serve(app).await;

        Self {
            client: Client::new(),
            storefront_url,
            catalog,
            notifier,
            store,
            storage_path,
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    /// `GET /cart` as JSON.
    pub async fn get_cart(&self) -> Value {
        self.client
            .get(self.url("/cart"))
            .send()
            .await
            .expect("Failed to get cart")
            .json()
            .await
            .expect("Cart is not JSON")
    }

    /// `POST /cart/items`, returning status and body.
    pub async fn add(&self, product_id: i64) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(self.url("/cart/items"))
            .json(&json!({ "product_id": product_id }))
            .send()
            .await
            .expect("Failed to add item");
        split(resp).await
    }

    /// `PUT /cart/items/{id}`, returning status and body.
    pub async fn set_quantity(&self, product_id: i64, amount: i64) -> (StatusCode, Value) {
        let resp = self
            .client
            .put(self.url(&format!("/cart/items/{product_id}")))
            .json(&json!({ "amount": amount }))
            .send()
            .await
            .expect("Failed to update item");
        split(resp).await
    }

    /// `DELETE /cart/items/{id}`, returning status and body.
    pub async fn remove(&self, product_id: i64) -> (StatusCode, Value) {
        let resp = self
            .client
            .delete(self.url(&format!("/cart/items/{product_id}")))
            .send()
            .await
            .expect("Failed to remove item");
        split(resp).await
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if let Some(dir) = self.storage_path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}

async fn split(resp: reqwest::Response) -> (StatusCode, Value) {
    let status = StatusCode::from_u16(resp.status().as_u16()).expect("Invalid status");
    let body = resp.json().await.expect("Response is not JSON");
    (status, body)
}

/// A cart file path inside a fresh temp directory.
#[must_use]
pub fn temp_storage_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("rocketshoes_it_{}", Uuid::new_v4()))
        .join("cart.json")
}

/// Raw stored cart value, parsed as JSON.
#[must_use]
pub fn read_stored_cart(path: &Path) -> Option<Value> {
    let file = std::fs::read_to_string(path).ok()?;
    let map: HashMap<String, String> = serde_json::from_str(&file).ok()?;
    serde_json::from_str(map.get(DEFAULT_STORAGE_KEY)?).ok()
}
