//! Integration tests for the JSON cart API.
//!
//! Each test runs the storefront router against a fake catalog API and a
//! throwaway cart file. Notifications use the pt-BR locale.

#![allow(clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use rocketshoes_core::ProductId;
use rocketshoes_integration_tests::{TestContext, read_stored_cart};
use rocketshoes_storefront::notify::NotificationKind;

fn amounts(cart: &Value) -> Vec<(i64, u64)> {
    cart["items"]
        .as_array()
        .expect("items is an array")
        .iter()
        .map(|item| {
            (
                item["id"].as_i64().expect("id is a number"),
                item["amount"].as_u64().expect("amount is a number"),
            )
        })
        .collect()
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new().await;
    let resp = ctx
        .client
        .get(ctx.url("/health"))
        .send()
        .await
        .expect("Failed to get health");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("No body"), "ok");
}

#[tokio::test]
async fn test_new_cart_is_empty() {
    let ctx = TestContext::new().await;
    let cart = ctx.get_cart().await;

    assert_eq!(cart["items"], json!([]));
    assert_eq!(cart["count"], 0);
    assert_eq!(cart["item_count"], 0);
    assert_eq!(cart["subtotal"], "0.00");
}

// ============================================================================
// Add
// ============================================================================

#[tokio::test]
async fn test_add_new_product() {
    let ctx = TestContext::new().await;

    let (status, cart) = ctx.add(5).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"][0]["id"], 5);
    assert_eq!(cart["items"][0]["title"], "Shoe");
    assert_eq!(cart["items"][0]["amount"], 1);
    assert_eq!(cart["items"][0]["price"], "99.90");

    let count: Value = ctx
        .client
        .get(ctx.url("/cart/count"))
        .send()
        .await
        .expect("Failed to get count")
        .json()
        .await
        .expect("Count is not JSON");
    assert_eq!(count, json!({ "count": 1 }));
    assert!(ctx.notifier.notifications().is_empty());
}

#[tokio::test]
async fn test_add_existing_product_increments() {
    let ctx = TestContext::new().await;

    ctx.add(1).await;
    ctx.add(2).await;
    let (status, cart) = ctx.add(1).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(amounts(&cart), vec![(1, 2), (2, 1)]);
    assert_eq!(cart["count"], 2);
    assert_eq!(cart["item_count"], 3);
    assert_eq!(cart["subtotal"], "499.70");
}

#[tokio::test]
async fn test_add_beyond_stock_is_rejected() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx.add(7).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.add(7).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Quantidade solicitada fora de estoque");
    assert_eq!(body["kind"], "out_of_stock");

    assert_eq!(amounts(&ctx.get_cart().await), vec![(7, 1)]);
    let kinds: Vec<_> = ctx.notifier.notifications().iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::OutOfStock]);
}

#[tokio::test]
async fn test_add_unknown_product_is_rejected() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.add(404).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Erro na adição do produto");
    assert_eq!(body["kind"], "add_failed");
    assert_eq!(ctx.get_cart().await["items"], json!([]));
}

#[tokio::test]
async fn test_add_with_malformed_body_is_bad_request() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .post(ctx.url("/cart/items"))
        .json(&json!({ "product": "five" }))
        .send()
        .await
        .expect("Failed to post");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(ctx.notifier.notifications().is_empty());
}

#[tokio::test]
async fn test_stock_is_checked_live() {
    let ctx = TestContext::new().await;

    ctx.add(5).await;
    ctx.catalog.set_stock(5, 1);

    let (status, body) = ctx.add(5).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "out_of_stock");
}

#[tokio::test]
async fn test_concurrent_adds_are_not_lost() {
    let ctx = TestContext::new().await;

    let (first, second) = tokio::join!(ctx.add(5), ctx.add(5));
    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(second.0, StatusCode::OK);

    assert_eq!(amounts(&ctx.get_cart().await), vec![(5, 2)]);
}

// ============================================================================
// Set Quantity
// ============================================================================

#[tokio::test]
async fn test_set_quantity_within_stock() {
    let ctx = TestContext::new().await;
    ctx.add(5).await;

    let (status, cart) = ctx.set_quantity(5, 3).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amounts(&cart), vec![(5, 3)]);
    assert_eq!(cart["items"][0]["line_total"], "299.70");
}

#[tokio::test]
async fn test_set_quantity_above_stock_keeps_cart() {
    let ctx = TestContext::new().await;
    ctx.add(5).await;
    ctx.set_quantity(5, 3).await;

    let (status, body) = ctx.set_quantity(5, 20).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Quantidade solicitada fora de estoque");

    assert_eq!(amounts(&ctx.get_cart().await), vec![(5, 3)]);
}

#[tokio::test]
async fn test_set_quantity_below_one_is_ignored() {
    let ctx = TestContext::new().await;
    ctx.add(5).await;

    for amount in [0, -3] {
        let (status, cart) = ctx.set_quantity(5, amount).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(amounts(&cart), vec![(5, 1)]);
    }
    assert!(ctx.notifier.notifications().is_empty());
}

#[tokio::test]
async fn test_set_quantity_for_absent_product_is_ignored() {
    let ctx = TestContext::new().await;

    let (status, cart) = ctx.set_quantity(2, 2).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"], json!([]));
    assert!(ctx.notifier.notifications().is_empty());
}

// ============================================================================
// Remove
// ============================================================================

#[tokio::test]
async fn test_remove_keeps_order_of_remaining_items() {
    let ctx = TestContext::new().await;
    ctx.add(1).await;
    ctx.add(2).await;
    ctx.add(5).await;

    let (status, cart) = ctx.remove(2).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amounts(&cart), vec![(1, 1), (5, 1)]);
}

#[tokio::test]
async fn test_remove_absent_product_is_rejected() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.remove(5).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Erro na remoção do produto");
    assert_eq!(body["kind"], "remove_failed");
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_cart_is_persisted_as_flat_items() {
    let ctx = TestContext::new().await;
    ctx.add(1).await;
    ctx.set_quantity(1, 2).await;

    let stored = read_stored_cart(&ctx.storage_path).expect("Cart was not stored");
    let items = stored.as_array().expect("Stored cart is an array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], 1);
    assert_eq!(items[0]["title"], "Tênis de Caminhada Leve Confortável");
    assert_eq!(items[0]["amount"], 2);
}

#[tokio::test]
async fn test_cart_survives_restart() {
    let first = TestContext::new().await;
    first.add(2).await;
    first.add(5).await;
    first.set_quantity(5, 4).await;

    let second = TestContext::with_storage(first.storage_path.clone()).await;
    assert_eq!(amounts(&second.get_cart().await), vec![(2, 1), (5, 4)]);
    assert_eq!(
        second.store.cart().amount_of(ProductId::new(5)).map(|a| a.get()),
        Some(4)
    );
}
