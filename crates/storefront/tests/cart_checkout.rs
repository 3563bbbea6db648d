//! Integration tests for cart checkout creation against a mocked Storefront API.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use atelier_core::Money;
use atelier_storefront::cart::{CartLine, CartStore, CheckoutError, ProductRef};
use atelier_storefront::shopify::{StorefrontClient, StorefrontError};

const GRAPHQL_PATH: &str = "/api/2024-04/graphql.json";

fn test_client(server: &MockServer) -> StorefrontClient {
    StorefrontClient::from_parts(
        format!("{}{GRAPHQL_PATH}", server.uri()),
        "test-access-token".to_string(),
    )
}

fn line(variant_id: &str, amount: &str, quantity: u32) -> CartLine {
    CartLine {
        variant_id: variant_id.to_string(),
        product: ProductRef {
            title: format!("Product {variant_id}"),
            handle: format!("product-{variant_id}"),
            image_url: None,
        },
        unit_price: Money::parse(amount, "USD").expect("valid amount"),
        quantity,
        selected_options: Vec::new(),
    }
}

fn happy_cart_response() -> serde_json::Value {
    json!({
        "data": {
            "cartCreate": {
                "cart": {
                    "id": "gid://shopify/Cart/c1",
                    "checkoutUrl": "https://shop.example.com/checkouts/cn/c1",
                    "totalQuantity": 3,
                    "cost": {"totalAmount": {"amount": "25.00", "currencyCode": "USD"}}
                },
                "userErrors": []
            }
        }
    })
}

#[tokio::test]
async fn checkout_appends_sales_channel_and_stores_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("cartCreate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(happy_cart_response()))
        .expect(1)
        .mount(&server)
        .await;

    let store = CartStore::new();
    store.add_item(line("v1", "10.00", 2)).expect("add v1");
    store.add_item(line("v2", "5.00", 1)).expect("add v2");

    let session = store
        .create_checkout(&test_client(&server))
        .await
        .expect("checkout should succeed");

    assert_eq!(
        session.checkout_url,
        "https://shop.example.com/checkouts/cn/c1?channel=online_store"
    );
    assert_eq!(session.total.amount.to_string(), "25.00");

    // The session is retrievable afterwards and the cart is NOT cleared.
    assert!(store.checkout_session().is_some());
    assert_eq!(store.item_count(), 3);
}

#[tokio::test]
async fn checkout_failure_leaves_cart_untouched() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "cartCreate": {
                    "cart": null,
                    "userErrors": [{"field": null, "message": "Variant is sold out"}]
                }
            }
        })))
        .mount(&server)
        .await;

    let store = CartStore::new();
    store.add_item(line("v1", "10.00", 2)).expect("add v1");
    store.add_item(line("v2", "5.00", 1)).expect("add v2");

    let before = serde_json::to_string(&store.snapshot()).expect("serialize");

    let err = store
        .create_checkout(&test_client(&server))
        .await
        .expect_err("user errors must fail");

    let after = serde_json::to_string(&store.snapshot()).expect("serialize");

    assert!(matches!(
        err,
        CheckoutError::Storefront(StorefrontError::UserError(_))
    ));
    assert_eq!(before, after);
    assert!(store.checkout_session().is_none());
}

#[tokio::test]
async fn concurrent_checkout_is_gated_to_one_mutation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(happy_cart_response())
                .set_delay(Duration::from_millis(250)),
        )
        // The whole point: a double-submit issues exactly one mutation.
        .expect(1)
        .mount(&server)
        .await;

    let store = CartStore::new();
    store.add_item(line("v1", "10.00", 2)).expect("add v1");

    let client = test_client(&server);
    let (first, second) = tokio::join!(
        store.create_checkout(&client),
        store.create_checkout(&client)
    );

    let in_flight_count = [&first, &second]
        .iter()
        .filter(|r| matches!(r, Err(CheckoutError::InFlight)))
        .count();
    let ok_count = [&first, &second].iter().filter(|r| r.is_ok()).count();

    assert_eq!(in_flight_count, 1, "one call must be rejected as in-flight");
    assert_eq!(ok_count, 1, "one call must win");
}

#[tokio::test]
async fn checkout_after_previous_completes_is_allowed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(happy_cart_response()))
        .expect(2)
        .mount(&server)
        .await;

    let store = CartStore::new();
    store.add_item(line("v1", "10.00", 2)).expect("add v1");

    let client = test_client(&server);
    store
        .create_checkout(&client)
        .await
        .expect("first checkout succeeds");
    store
        .create_checkout(&client)
        .await
        .expect("second sequential checkout succeeds");
}
