//! Integration tests for the order webhook ingestor's gate-keeping.
//!
//! These drive the real router with a lazily-connecting pool that has no
//! database behind it: every request below must be rejected before any
//! database access happens, so a passing test also proves zero writes.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use secrecy::SecretString;
use tower::ServiceExt;

use atelier_webhooks::config::{EmailConfig, WebhooksConfig};
use atelier_webhooks::db::create_lazy_pool;
use atelier_webhooks::routes;
use atelier_webhooks::signature;
use atelier_webhooks::state::AppState;

const SECRET: &str = "whsec_9f2c4b81a7e3d6502c8b1f4a";

fn test_app() -> Router {
    let config = WebhooksConfig {
        host: "127.0.0.1".parse().expect("valid host"),
        port: 0,
        database_url: SecretString::from("postgres://postgres@localhost/atelier_unreachable"),
        webhook_secret: SecretString::from(SECRET),
        email: EmailConfig {
            smtp_host: "localhost".to_string(),
            smtp_port: 2525,
            smtp_username: "mailer".to_string(),
            smtp_password: SecretString::from("password-unused-in-tests"),
            from_address: "Orders <orders@atelier-goods.com>".to_string(),
        },
    };

    // connect_lazy: no connection is made unless a handler touches the pool
    let pool = create_lazy_pool("postgres://postgres@localhost/atelier_unreachable")
        .expect("lazy pool from valid url");

    let state = AppState::new(config, pool).expect("state builds without connecting");
    routes::routes().with_state(state)
}

fn order_body() -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "id": 5001,
        "order_number": 1001,
        "email": "buyer@example.com",
        "financial_status": "paid",
        "total_price": "84.50",
        "currency": "USD",
        "line_items": []
    }))
    .expect("serializable body")
}

async fn post_webhook(app: Router, body: Vec<u8>, signature: Option<&str>) -> (StatusCode, String) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/orders")
        .header("content-type", "application/json");

    if let Some(sig) = signature {
        builder = builder.header("x-shopify-hmac-sha256", sig);
    }

    let response = app
        .oneshot(builder.body(Body::from(body)).expect("request builds"))
        .await
        .expect("router responds");

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();

    (status, String::from_utf8_lossy(&bytes).into_owned())
}

#[tokio::test]
async fn missing_signature_is_rejected_with_401() {
    let (status, body) = post_webhook(test_app(), order_body(), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Missing signature"));
}

#[tokio::test]
async fn invalid_signature_is_rejected_with_401_before_any_processing() {
    let body = order_body();
    // Sign with the wrong secret
    let bad_signature = signature::sign(&body, "a-completely-different-secret");

    let (status, response_body) =
        post_webhook(test_app(), body, Some(&bad_signature)).await;

    // The unreachable database guarantees this 401 came from the signature
    // gate: any path that touched the pool would have failed with 500.
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(response_body.contains("Invalid signature"));
}

#[tokio::test]
async fn tampered_body_is_rejected_with_401() {
    let original = order_body();
    let valid_signature = signature::sign(&original, SECRET);

    let mut tampered = order_body();
    tampered.extend_from_slice(b" ");

    let (status, _) = post_webhook(test_app(), tampered, Some(&valid_signature)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_payload_with_valid_signature_is_400() {
    let body = b"this is not json".to_vec();
    let valid_signature = signature::sign(&body, SECRET);

    let (status, response_body) = post_webhook(test_app(), body, Some(&valid_signature)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response_body.contains("Malformed order payload"));
}
