//! Shared model helpers for the storefront binary.

/// Session keys used by route handlers.
///
/// Namespaced under `atelier.` so they never collide with anything else a
/// shared session store might hold.
pub mod session_keys {
    /// The visitor's cart ID in the cart registry.
    pub const CART_ID: &str = "atelier.cart_id";
}
