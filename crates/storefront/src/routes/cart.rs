//! Cart route handlers.
//!
//! The visitor's session carries a cart ID; the cart itself lives in the
//! registry on [`AppState`]. Handlers load the store, apply the mutation,
//! and return the updated cart view as JSON.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use atelier_core::Money;

use crate::cart::{CartLine, CartView, CheckoutSession, ProductRef};
use crate::error::{AppError, Result};
use crate::models::session_keys;
use crate::shopify::types::SelectedOption;
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart ID from the session.
async fn get_cart_id(session: &Session) -> Option<String> {
    session
        .get::<String>(session_keys::CART_ID)
        .await
        .ok()
        .flatten()
}

/// Get the cart ID from the session, creating and storing one if absent.
async fn get_or_create_cart_id(session: &Session) -> Result<String> {
    if let Some(cart_id) = get_cart_id(session).await {
        return Ok(cart_id);
    }

    let cart_id = uuid::Uuid::new_v4().to_string();
    session
        .insert(session_keys::CART_ID, &cart_id)
        .await
        .map_err(|e| AppError::BadRequest(format!("session unavailable: {e}")))?;

    Ok(cart_id)
}

// =============================================================================
// Request Bodies
// =============================================================================

/// Body for adding a line to the cart: a fully-formed line candidate.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    /// Variant to purchase.
    pub variant_id: String,
    /// Product title snapshot.
    pub title: String,
    /// Product handle snapshot.
    pub handle: String,
    /// Product image snapshot.
    pub image_url: Option<String>,
    /// Price per unit.
    pub unit_price: Money,
    /// Quantity to add (defaults to 1).
    pub quantity: Option<u32>,
    /// Selected options (display only).
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
}

/// Body for setting a line's quantity.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    /// New quantity; 0 removes the line.
    pub quantity: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /cart - current cart view.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Json<CartView> {
    match get_cart_id(&session).await {
        Some(cart_id) => match state.existing_cart(&cart_id).await {
            Some(cart) => Json(cart.view()),
            None => Json(empty_view()),
        },
        None => Json(empty_view()),
    }
}

/// POST /cart/items - add a line.
#[instrument(skip(state, session, body), fields(variant_id = %body.variant_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let cart_id = get_or_create_cart_id(&session).await?;
    let cart = state.cart(&cart_id).await;

    cart.add_item(CartLine {
        variant_id: body.variant_id,
        product: ProductRef {
            title: body.title,
            handle: body.handle,
            image_url: body.image_url,
        },
        unit_price: body.unit_price,
        quantity: body.quantity.unwrap_or(1),
        selected_options: body.selected_options,
    })?;

    Ok(Json(cart.view()))
}

/// PATCH /cart/items/{variant_id} - set a line's quantity (0 removes).
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(variant_id): Path<String>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let Some(cart_id) = get_cart_id(&session).await else {
        return Ok(Json(empty_view()));
    };

    let cart = state.cart(&cart_id).await;
    cart.update_quantity(&variant_id, body.quantity);

    Ok(Json(cart.view()))
}

/// DELETE /cart/items/{variant_id} - remove a line.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(variant_id): Path<String>,
) -> Result<Json<CartView>> {
    let Some(cart_id) = get_cart_id(&session).await else {
        return Ok(Json(empty_view()));
    };

    let cart = state.cart(&cart_id).await;
    cart.remove_item(&variant_id);

    Ok(Json(cart.view()))
}

/// DELETE /cart - clear the cart (explicit user action).
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    if let Some(cart_id) = get_cart_id(&session).await {
        state.drop_cart(&cart_id).await;
    }

    Ok(Json(empty_view()))
}

/// POST /cart/checkout - create a Shopify checkout session.
///
/// Returns the hosted checkout URL for the client to redirect to. The cart
/// is NOT cleared on success; the visitor keeps it until they clear it.
#[instrument(skip(state, session))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CheckoutSession>> {
    let cart_id = get_cart_id(&session)
        .await
        .ok_or_else(|| AppError::Unprocessable("Cart is empty".to_string()))?;

    let cart = state
        .existing_cart(&cart_id)
        .await
        .ok_or_else(|| AppError::Unprocessable("Cart is empty".to_string()))?;

    if cart.is_empty() {
        return Err(AppError::Unprocessable("Cart is empty".to_string()));
    }

    let checkout = cart.create_checkout(state.storefront()).await?;
    Ok(Json(checkout))
}

fn empty_view() -> CartView {
    CartView {
        lines: Vec::new(),
        item_count: 0,
        subtotal: None,
        currency_code: None,
        checkout_in_flight: false,
    }
}
