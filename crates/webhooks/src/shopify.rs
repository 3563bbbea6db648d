//! Shopify order webhook payload.
//!
//! The raw wire shape of an `orders/create` delivery, plus its conversion
//! into the domain types the repositories persist. Every field is lenient:
//! upstream omits or nulls fields freely, and a missing money string counts
//! as zero rather than a rejected delivery.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

use atelier_core::{OrderStatus, UserId};

use crate::models::{NewOrder, NewOrderItem};

/// An `orders/create` webhook body.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderWebhook {
    /// Numeric order ID; the idempotency key (stored as text).
    pub id: i64,
    #[serde(default)]
    pub order_number: Option<i64>,
    /// Display name like `#1001`; fallback when `order_number` is absent.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub fulfillment_status: Option<String>,
    #[serde(default)]
    pub financial_status: Option<String>,
    #[serde(default)]
    pub total_price: Option<String>,
    #[serde(default)]
    pub subtotal_price: Option<String>,
    #[serde(default)]
    pub total_tax: Option<String>,
    #[serde(default)]
    pub total_shipping_price_set: Option<PriceSet>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub line_items: Vec<WebhookLineItem>,
    #[serde(default)]
    pub shipping_address: Option<serde_json::Value>,
    #[serde(default)]
    pub billing_address: Option<serde_json::Value>,
}

/// Money in shop and presentment currencies; only shop money is read.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceSet {
    #[serde(default)]
    pub shop_money: Option<ShopMoney>,
}

/// The shop-currency half of a price set.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopMoney {
    #[serde(default)]
    pub amount: Option<String>,
}

/// Customer block of the webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// One ordered line as delivered.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookLineItem {
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub variant_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub variant_title: Option<String>,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub image: Option<LineItemImage>,
}

/// Image block of a line item.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemImage {
    #[serde(default)]
    pub src: Option<String>,
}

impl OrderWebhook {
    /// The external order ID as stored (text form of the numeric ID).
    #[must_use]
    pub fn external_id(&self) -> String {
        self.id.to_string()
    }

    /// Human-facing order number: `order_number`, else `name`, else the ID.
    #[must_use]
    pub fn display_number(&self) -> String {
        self.order_number.map_or_else(
            || {
                self.name
                    .clone()
                    .unwrap_or_else(|| self.id.to_string())
            },
            |n| n.to_string(),
        )
    }

    /// Customer display name, `"First Last"` with missing parts dropped.
    #[must_use]
    pub fn customer_name(&self) -> Option<String> {
        let customer = self.customer.as_ref()?;
        let first = customer.first_name.as_deref()?;
        let last = customer.last_name.as_deref().unwrap_or("");
        Some(format!("{first} {last}").trim().to_string())
    }

    /// The local status for this delivery.
    #[must_use]
    pub fn local_status(&self) -> OrderStatus {
        OrderStatus::from_shopify(
            self.fulfillment_status.as_deref(),
            self.financial_status.as_deref(),
        )
    }

    /// Build the order row for this delivery.
    #[must_use]
    pub fn to_new_order(&self, user_id: Option<UserId>) -> NewOrder {
        NewOrder {
            shopify_order_id: self.external_id(),
            order_number: self.display_number(),
            email: self.email.clone(),
            user_id,
            status: self.local_status(),
            financial_status: self.financial_status.clone(),
            fulfillment_status: self.fulfillment_status.clone(),
            subtotal_price: lenient_decimal(self.subtotal_price.as_deref()),
            total_tax: lenient_decimal(self.total_tax.as_deref()),
            total_shipping: lenient_decimal(
                self.total_shipping_price_set
                    .as_ref()
                    .and_then(|set| set.shop_money.as_ref())
                    .and_then(|money| money.amount.as_deref()),
            ),
            total_price: lenient_decimal(self.total_price.as_deref()),
            currency_code: self.currency.clone().unwrap_or_else(|| "USD".to_string()),
            customer_name: self.customer_name(),
            shipping_address: self.shipping_address.clone(),
            billing_address: self.billing_address.clone(),
        }
    }

    /// Build the item snapshot rows for this delivery.
    #[must_use]
    pub fn to_order_items(&self) -> Vec<NewOrderItem> {
        self.line_items
            .iter()
            .map(|item| {
                let quantity = item.quantity.unwrap_or(1);
                let price = lenient_decimal(item.price.as_deref());
                NewOrderItem {
                    shopify_product_id: item
                        .product_id
                        .map(|id| id.to_string())
                        .unwrap_or_default(),
                    shopify_variant_id: item
                        .variant_id
                        .map(|id| id.to_string())
                        .unwrap_or_default(),
                    product_title: item
                        .title
                        .clone()
                        .unwrap_or_else(|| "Unknown Product".to_string()),
                    variant_title: item.variant_title.clone(),
                    quantity,
                    price,
                    total: price * Decimal::from(quantity),
                    image_url: item.image.as_ref().and_then(|img| img.src.clone()),
                }
            })
            .collect()
    }
}

/// Parse an upstream money string, treating absence or garbage as zero.
fn lenient_decimal(raw: Option<&str>) -> Decimal {
    raw.and_then(|s| Decimal::from_str(s).ok())
        .unwrap_or(Decimal::ZERO)
}
