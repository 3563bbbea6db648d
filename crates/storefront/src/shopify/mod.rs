//! Shopify Storefront API client.
//!
//! # Architecture
//!
//! - Raw GraphQL documents ([`queries`]) posted as `{query, variables}` with
//!   `reqwest`; responses deserialize into the types in [`types`]
//! - Shopify is source of truth - NO local catalog sync, direct API calls
//! - The client performs no schema validation beyond what deserialization
//!   implies; unknown response shapes surface as parse errors
//!
//! # Example
//!
//! ```rust,ignore
//! use atelier_storefront::shopify::StorefrontClient;
//!
//! let client = StorefrontClient::new(&config.shopify);
//!
//! let product = client.get_product_by_handle("walnut-serving-board").await?;
//!
//! let cart = client
//!     .create_cart(vec![CheckoutLineInput {
//!         merchandise_id: product.variants[0].id.clone(),
//!         quantity: 1,
//!     }])
//!     .await?;
//! ```

mod client;
pub mod queries;
pub mod types;

pub use client::StorefrontClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the Storefront API.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store's Shopify billing plan is inactive (HTTP 402).
    ///
    /// This is an account-level condition requiring operator action,
    /// not a request-level failure the caller should retry.
    #[error("Storefront API returned 402 Payment Required: the store's billing plan is inactive")]
    BillingRequired,

    /// Any other non-success HTTP status.
    #[error("Storefront API returned HTTP {status}")]
    Transport {
        /// HTTP status code.
        status: u16,
    },

    /// The response carried a top-level `errors` array.
    #[error("GraphQL errors: {0}")]
    GraphQL(String),

    /// A mutation returned `userErrors`.
    #[error("User error: {0}")]
    UserError(String),

    /// The cart-create mutation succeeded but returned no checkout URL.
    #[error("cart response did not include a checkout URL")]
    MissingCheckoutUrl,

    /// JSON (de)serialization failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = StorefrontError::Transport { status: 503 };
        assert_eq!(err.to_string(), "Storefront API returned HTTP 503");
    }

    #[test]
    fn test_user_error_display() {
        let err = StorefrontError::UserError("Variant is sold out".to_string());
        assert_eq!(err.to_string(), "User error: Variant is sold out");
    }

    #[test]
    fn test_billing_required_mentions_billing() {
        let err = StorefrontError::BillingRequired;
        assert!(err.to_string().contains("billing"));
    }
}
