//! Notification dispatcher route.
//!
//! Synchronous best-effort send: renders the template pair for the payload
//! and hands it to the SMTP relay. No queuing or delivery tracking here -
//! the outbox consumer covers the ingestion path; this route serves direct
//! callers (the shipped/delivered senders).

use axum::{Json, extract::State};
use serde_json::json;
use tracing::instrument;

use crate::email::OrderEmail;
use crate::error::Result;
use crate::state::AppState;

/// POST /notifications
#[instrument(skip(state, payload), fields(kind = ?payload.kind, order_number = %payload.order_number))]
pub async fn send(
    State(state): State<AppState>,
    Json(payload): Json<OrderEmail>,
) -> Result<Json<serde_json::Value>> {
    state.email().send(&payload).await?;

    Ok(Json(json!({ "success": true })))
}
