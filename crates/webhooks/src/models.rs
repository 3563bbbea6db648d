//! Domain types for the webhook service.
//!
//! These are validated domain objects separate from the raw webhook payload
//! (see [`crate::shopify`]) and from database row types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use atelier_core::{NotificationId, OrderStatus, UserId};

/// A new order to persist, derived from a verified webhook delivery.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// External order ID; the idempotency key.
    pub shopify_order_id: String,
    /// Human-facing order number.
    pub order_number: String,
    /// Customer email as delivered; may be absent on some orders.
    pub email: Option<String>,
    /// Local profile this order belongs to, when the email matched one.
    /// Guest and unmatched orders are recorded without an association.
    pub user_id: Option<UserId>,
    /// Local status derived from the upstream statuses.
    pub status: OrderStatus,
    /// Upstream financial status, preserved verbatim for audit.
    pub financial_status: Option<String>,
    /// Upstream fulfillment status, preserved verbatim for audit.
    pub fulfillment_status: Option<String>,
    pub subtotal_price: Decimal,
    pub total_tax: Decimal,
    pub total_shipping: Decimal,
    pub total_price: Decimal,
    pub currency_code: String,
    /// Customer display name, when the payload carried one.
    pub customer_name: Option<String>,
    /// Shipping address snapshot (opaque structured data).
    pub shipping_address: Option<serde_json::Value>,
    /// Billing address snapshot (opaque structured data).
    pub billing_address: Option<serde_json::Value>,
}

/// A point-in-time snapshot of one ordered line.
///
/// Immutable once written; never a live reference to catalog data.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub shopify_product_id: String,
    pub shopify_variant_id: String,
    pub product_title: String,
    pub variant_title: Option<String>,
    pub quantity: i32,
    /// Price per unit.
    pub price: Decimal,
    /// `price * quantity`.
    pub total: Decimal,
    pub image_url: Option<String>,
}

/// Delivery state of an outbox notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "outbox_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    /// Waiting for (re)delivery.
    Pending,
    /// Claimed by a consumer; reset to pending if the consumer dies.
    Sending,
    /// Delivered.
    Sent,
    /// Gave up after the maximum number of attempts.
    Failed,
}

/// A claimed outbox notification ready for delivery.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OutboxNotification {
    pub id: NotificationId,
    /// Serialized [`crate::email::OrderEmail`] payload.
    pub payload: serde_json::Value,
    /// Delivery attempts made so far (before this one).
    pub attempts: i32,
}
