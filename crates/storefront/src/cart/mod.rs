//! Cart aggregation store.
//!
//! The single source of truth for what a visitor intends to buy, independent
//! of any particular page. Nothing here is server-trusted state: price and
//! availability are re-validated by Shopify when the checkout session is
//! created.
//!
//! One [`CartStore`] exists per cart ID; the visitor's session carries the ID
//! and the stores live in a registry on the application state. The store is
//! safe to share across concurrent requests for the same cart.

mod line;
mod store;

pub use line::{CartLine, CartSnapshot, ProductRef};
pub use store::{CartStore, CartView, CheckoutSession, LineView};

use thiserror::Error;

use crate::shopify::StorefrontError;

/// Errors from local cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The candidate line's currency differs from the cart's currency.
    ///
    /// Mixed-currency carts cannot be checked out as one Shopify cart, so the
    /// mismatch is rejected at add time instead of surfacing at checkout.
    #[error("cart is priced in {cart} but item is priced in {item}")]
    CurrencyMismatch {
        /// The cart's established currency.
        cart: String,
        /// The rejected item's currency.
        item: String,
    },
}

/// Errors from checkout session creation.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A checkout request for this cart is already outstanding.
    #[error("a checkout is already in progress for this cart")]
    InFlight,

    /// The upstream cart-create call failed.
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    /// The returned checkout URL did not parse.
    #[error("invalid checkout URL: {0}")]
    InvalidCheckoutUrl(#[from] url::ParseError),

    /// The returned cart total did not parse as a decimal amount.
    #[error(transparent)]
    InvalidTotal(#[from] atelier_core::MoneyError),
}
