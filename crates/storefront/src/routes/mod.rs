//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                   - Health check
//!
//! # Catalog
//! GET    /collections              - Collection listing
//! GET    /collections/{handle}     - Collection with its products
//! GET    /products/{handle}        - Product detail
//!
//! # Cart
//! GET    /cart                     - Cart view
//! POST   /cart/items               - Add a line (aggregates by variant)
//! PATCH  /cart/items/{variant_id}  - Set a line's quantity (0 removes)
//! DELETE /cart/items/{variant_id}  - Remove a line
//! DELETE /cart                     - Clear the cart
//!
//! # Checkout
//! POST   /cart/checkout            - Create a Shopify checkout session
//! ```

pub mod cart;
pub mod catalog;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

/// Create the complete storefront router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/collections", get(catalog::list_collections))
        .route("/collections/{handle}", get(catalog::show_collection))
        .route("/products/{handle}", get(catalog::show_product))
        .route("/cart", get(cart::show).delete(cart::clear))
        .route("/cart/items", post(cart::add))
        .route(
            "/cart/items/{variant_id}",
            delete(cart::remove).patch(cart::update),
        )
        .route("/cart/checkout", post(cart::checkout))
}
