//! HTTP route handlers for the webhook service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health          - Liveness check
//! GET  /health/ready    - Readiness check (verifies database connectivity)
//! POST /webhooks/orders - Shopify order webhook ingestor
//! POST /notifications   - Transactional email dispatcher
//! ```

pub mod notifications;
pub mod orders;

use axum::{Router, routing::post};

use crate::state::AppState;

/// Create the webhook service router (health endpoints are added in `main`).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/webhooks/orders", post(orders::ingest))
        .route("/notifications", post(notifications::send))
}
