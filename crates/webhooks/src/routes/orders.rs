//! Order webhook ingestor.
//!
//! Durably and idempotently records orders pushed by Shopify. The pipeline
//! per request: verify the signature against the raw body, parse, resolve
//! the customer's local profile, map the upstream statuses to the local
//! taxonomy, insert the order, then best-effort insert item snapshots and
//! enqueue the confirmation email.
//!
//! Failure semantics: signature problems reject with 401 before anything
//! else runs; a duplicate delivery is success (200, no mutation); only a
//! failed order-row insert propagates as 500. Everything else (unmatched
//! user, item insert failure, outbox enqueue failure) is logged and
//! absorbed - recording the order outranks completing every auxiliary
//! effect.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::instrument;

use atelier_core::Email;

use crate::db::{OrderRepository, OutboxRepository, ProfileRepository, RepositoryError};
use crate::email::{EmailLineItem, OrderEmail, OrderEmailKind};
use crate::error::{AppError, Result};
use crate::models::{NewOrder, NewOrderItem};
use crate::shopify::OrderWebhook;
use crate::signature;
use crate::state::AppState;

/// Header carrying the base64 HMAC-SHA256 of the raw body.
const SIGNATURE_HEADER: &str = "x-shopify-hmac-sha256";

/// POST /webhooks/orders
#[instrument(skip(state, headers, body))]
pub async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>> {
    // Verify before touching anything else; the signature covers the raw
    // bytes, so parsing waits until the delivery is authenticated.
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing signature".to_string()))?;

    if !signature::verify(
        &body,
        provided,
        state.config().webhook_secret.expose_secret(),
    ) {
        tracing::warn!("Rejected webhook delivery with invalid signature");
        return Err(AppError::Unauthorized("Invalid signature".to_string()));
    }

    let webhook: OrderWebhook = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Malformed order payload: {e}")))?;

    tracing::info!(shopify_order_id = webhook.id, "Received order webhook");

    let user_id = resolve_user(&state, &webhook).await;
    let order = webhook.to_new_order(user_id);
    let items = webhook.to_order_items();

    let repo = OrderRepository::new(state.pool());
    let order_id = match repo.create(&order).await {
        Ok(id) => id,
        Err(RepositoryError::AlreadyExists) => {
            // At-least-once delivery; the unique index turned the duplicate
            // into a no-op and that is success, not an error.
            tracing::info!(
                shopify_order_id = %order.shopify_order_id,
                "Order already exists"
            );
            return Ok(Json(json!({ "message": "Order already exists" })));
        }
        // The one sub-failure that must propagate
        Err(e) => return Err(AppError::Database(e)),
    };

    tracing::info!(order_id = %order_id, "Created order");

    if !items.is_empty() {
        match repo.add_items(order_id, &items).await {
            Ok(()) => tracing::info!(order_id = %order_id, count = items.len(), "Created order items"),
            Err(e) => tracing::error!(
                error = %e,
                order_id = %order_id,
                "Failed to insert order items; keeping the order record"
            ),
        }
    }

    if let Some(notification) = confirmation_email(&order, &items) {
        match serde_json::to_value(&notification) {
            Ok(payload) => {
                if let Err(e) = OutboxRepository::new(state.pool())
                    .enqueue(order_id, &payload)
                    .await
                {
                    tracing::error!(
                        error = %e,
                        order_id = %order_id,
                        "Failed to enqueue confirmation email"
                    );
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize confirmation email payload");
            }
        }
    }

    Ok(Json(json!({ "success": true, "orderId": order_id })))
}

/// Resolve the order's email against local profiles.
///
/// Absence is expected (guest orders); lookup failures are absorbed so the
/// order is still recorded, just without a user association.
async fn resolve_user(state: &AppState, webhook: &OrderWebhook) -> Option<atelier_core::UserId> {
    let raw = webhook.email.as_deref()?;

    let email = match Email::parse(raw) {
        Ok(email) => email,
        Err(e) => {
            tracing::warn!(error = %e, "Order email failed validation; storing without user");
            return None;
        }
    };

    match ProfileRepository::new(state.pool())
        .find_by_email(&email)
        .await
    {
        Ok(Some(user_id)) => Some(user_id),
        Ok(None) => {
            tracing::info!("No profile found for order email; storing without user");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Profile lookup failed; storing without user");
            None
        }
    }
}

/// Build the confirmation email payload for a freshly recorded order.
///
/// Returns `None` when the order carries no recipient address.
fn confirmation_email(order: &NewOrder, items: &[NewOrderItem]) -> Option<OrderEmail> {
    let email = order.email.clone()?;

    Some(OrderEmail {
        kind: OrderEmailKind::Confirmation,
        email,
        customer_name: order
            .customer_name
            .clone()
            .unwrap_or_else(|| "Customer".to_string()),
        order_number: order.order_number.clone(),
        items: items
            .iter()
            .map(|item| EmailLineItem {
                title: item.product_title.clone(),
                quantity: u32::try_from(item.quantity).unwrap_or(1),
                price: item.price,
            })
            .collect(),
        total_price: order.total_price,
        currency_code: order.currency_code.clone(),
        shipping_address: order
            .shipping_address
            .as_ref()
            .and_then(|value| serde_json::from_value(value.clone()).ok()),
        tracking_url: None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use atelier_core::OrderStatus;
    use rust_decimal::Decimal;

    fn order_with_email(email: Option<&str>) -> NewOrder {
        NewOrder {
            shopify_order_id: "5001".to_string(),
            order_number: "1001".to_string(),
            email: email.map(String::from),
            user_id: None,
            status: OrderStatus::Confirmed,
            financial_status: Some("paid".to_string()),
            fulfillment_status: None,
            subtotal_price: Decimal::new(7800, 2),
            total_tax: Decimal::new(650, 2),
            total_shipping: Decimal::ZERO,
            total_price: Decimal::new(8450, 2),
            currency_code: "USD".to_string(),
            customer_name: Some("June Park".to_string()),
            shipping_address: Some(serde_json::json!({
                "address1": "400 SE Morrison St",
                "city": "Portland",
                "country": "United States"
            })),
            billing_address: None,
        }
    }

    #[test]
    fn test_confirmation_email_requires_recipient() {
        assert!(confirmation_email(&order_with_email(None), &[]).is_none());
    }

    #[test]
    fn test_confirmation_email_copies_order_fields() {
        let items = vec![NewOrderItem {
            shopify_product_id: "11".to_string(),
            shopify_variant_id: "111".to_string(),
            product_title: "Walnut Serving Board".to_string(),
            variant_title: None,
            quantity: 2,
            price: Decimal::new(3400, 2),
            total: Decimal::new(6800, 2),
            image_url: None,
        }];

        let email = confirmation_email(&order_with_email(Some("buyer@example.com")), &items)
            .unwrap();

        assert_eq!(email.kind, OrderEmailKind::Confirmation);
        assert_eq!(email.email, "buyer@example.com");
        assert_eq!(email.customer_name, "June Park");
        assert_eq!(email.items.len(), 1);
        assert_eq!(email.items[0].quantity, 2);
        assert_eq!(email.total_price.to_string(), "84.50");
        assert_eq!(
            email.shipping_address.unwrap().city.as_deref(),
            Some("Portland")
        );
    }

    #[test]
    fn test_confirmation_email_defaults_customer_name() {
        let mut order = order_with_email(Some("buyer@example.com"));
        order.customer_name = None;

        let email = confirmation_email(&order, &[]).unwrap();
        assert_eq!(email.customer_name, "Customer");
    }
}
