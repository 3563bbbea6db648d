//! Cart line items and the serializable cart snapshot.

use serde::{Deserialize, Serialize};

use atelier_core::Money;

use crate::shopify::types::SelectedOption;

/// Denormalized product snapshot carried on a cart line for display.
///
/// A point-in-time copy, not a live reference to catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    /// Product title.
    pub title: String,
    /// Product URL handle.
    pub handle: String,
    /// Product image URL, if any.
    pub image_url: Option<String>,
}

/// One purchasable variant and its requested quantity.
///
/// At most one line exists per `variant_id` within a cart; adding the same
/// variant again increments the quantity instead of duplicating the line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Opaque Shopify variant ID; the unique key within the cart.
    pub variant_id: String,
    /// Display snapshot of the parent product.
    pub product: ProductRef,
    /// Price per unit at the time the line was added.
    pub unit_price: Money,
    /// Requested quantity (>= 1).
    pub quantity: u32,
    /// Selected options (display only).
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
}

/// Serializable form of a cart's contents.
///
/// This is the explicit persistence boundary: a store is constructed from a
/// snapshot and can be reduced back to one at any time. Where and how the
/// snapshot is stored (session, client storage, nowhere) is the caller's
/// concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// The cart's lines, in insertion order.
    pub lines: Vec<CartLine>,
}
