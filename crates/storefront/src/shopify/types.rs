//! Response types for the Storefront API.
//!
//! These deserialize directly from the GraphQL wire format (camelCase keys,
//! connection/edge pagination wrappers) and are exposed unchanged through the
//! catalog routes.

use serde::{Deserialize, Serialize};

// =============================================================================
// Wire plumbing
// =============================================================================

/// GraphQL connection wrapper (`{ edges: [{ node: T }] }`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
}

/// A single edge in a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

impl<T> Connection<T> {
    /// Flatten the edge/node wrapping into the nodes themselves.
    pub fn into_nodes(self) -> Vec<T> {
        self.edges.into_iter().map(|e| e.node).collect()
    }
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

// =============================================================================
// Money and images
// =============================================================================

/// Monetary amount as transmitted by the API.
///
/// The amount stays a string here; arithmetic happens in the cart store with
/// `rust_decimal` after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyV2 {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

/// Product or collection image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    /// Image URL.
    pub url: String,
}

// =============================================================================
// Catalog types
// =============================================================================

/// A collection of products.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub title: String,
    pub handle: String,
    #[serde(default)]
    pub description: String,
    pub image: Option<Image>,
}

/// A collection by handle with a page of its products.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionWithProducts {
    pub id: String,
    pub title: String,
    pub handle: String,
    #[serde(default)]
    pub description: String,
    pub image: Option<Image>,
    pub products: Connection<Product>,
}

/// Price range across a product's variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub min_variant_price: MoneyV2,
}

/// Selected option on a variant (e.g., Size: Large).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

/// Product option definition (name plus the available values).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductOption {
    pub name: String,
    pub values: Vec<String>,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: String,
    pub title: String,
    pub available_for_sale: bool,
    pub price: MoneyV2,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
}

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    pub handle: String,
    #[serde(default)]
    pub description: String,
    pub available_for_sale: bool,
    pub price_range: PriceRange,
    pub featured_image: Option<Image>,
    #[serde(default)]
    pub images: Connection<Image>,
    #[serde(default)]
    pub variants: Connection<ProductVariant>,
    #[serde(default)]
    pub options: Vec<ProductOption>,
}

// =============================================================================
// Cart creation
// =============================================================================

/// Line item input for the cart-create mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLineInput {
    /// Product variant ID.
    pub merchandise_id: String,
    /// Quantity to purchase.
    pub quantity: u32,
}

/// User error from a cart mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserError {
    /// Field path that caused the error.
    pub field: Option<Vec<String>>,
    /// Human-readable error message.
    pub message: String,
}

/// Cost summary of a created cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCost {
    pub total_amount: MoneyV2,
}

/// The cart returned by `cartCreate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedCart {
    pub id: String,
    /// Hosted checkout URL. Absent on some failure shapes even when no
    /// user errors are reported.
    pub checkout_url: Option<String>,
    pub total_quantity: i64,
    pub cost: CartCost,
}

// =============================================================================
// Response envelopes (private to the client module)
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionsData {
    pub collections: Connection<Collection>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionByHandleData {
    pub collection: Option<CollectionWithProducts>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductByHandleData {
    pub product_by_handle: Option<Product>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartCreateData {
    pub cart_create: Option<CartCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartCreatePayload {
    pub cart: Option<CreatedCart>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_into_nodes() {
        let conn: Connection<i32> = serde_json::from_value(serde_json::json!({
            "edges": [{"node": 1}, {"node": 2}]
        }))
        .unwrap();
        assert_eq!(conn.into_nodes(), vec![1, 2]);
    }

    #[test]
    fn test_product_deserializes_wire_shape() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Product/1",
            "title": "Walnut Serving Board",
            "handle": "walnut-serving-board",
            "availableForSale": true,
            "priceRange": {
                "minVariantPrice": {"amount": "68.00", "currencyCode": "USD"}
            },
            "featuredImage": null,
            "variants": {
                "edges": [{
                    "node": {
                        "id": "gid://shopify/ProductVariant/11",
                        "title": "Default Title",
                        "availableForSale": true,
                        "price": {"amount": "68.00", "currencyCode": "USD"},
                        "selectedOptions": [{"name": "Title", "value": "Default Title"}]
                    }
                }]
            }
        }))
        .unwrap();

        assert_eq!(product.handle, "walnut-serving-board");
        assert_eq!(product.price_range.min_variant_price.amount, "68.00");
        let variants = product.variants.into_nodes();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].selected_options[0].name, "Title");
    }

    #[test]
    fn test_cart_create_payload_missing_checkout_url() {
        let payload: CartCreatePayload = serde_json::from_value(serde_json::json!({
            "cart": {
                "id": "gid://shopify/Cart/abc",
                "checkoutUrl": null,
                "totalQuantity": 2,
                "cost": {"totalAmount": {"amount": "20.00", "currencyCode": "USD"}}
            },
            "userErrors": []
        }))
        .unwrap();

        assert!(payload.cart.unwrap().checkout_url.is_none());
    }
}
