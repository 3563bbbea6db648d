//! Unified error handling for the storefront API.
//!
//! Provides a unified `AppError` type that route handlers return; it maps the
//! internal error taxonomy onto HTTP statuses and client-safe JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::cart::{CartError, CheckoutError};
use crate::shopify::StorefrontError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Storefront API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] StorefrontError),

    /// Local cart mutation was rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout session creation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request is well-formed but cannot be processed (e.g., empty cart).
    #[error("Unprocessable: {0}")]
    Unprocessable(String),
}

/// Status and client-safe message for a Storefront API failure.
///
/// A 402 from Shopify is an account-level condition (operator must act), so
/// it maps to 503 with an explicit message instead of the generic gateway
/// error. Everything else is a retryable upstream failure.
fn storefront_error_response(err: &StorefrontError) -> (StatusCode, String) {
    match err {
        StorefrontError::BillingRequired => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Store billing is inactive; the store operator must upgrade the Shopify plan"
                .to_string(),
        ),
        StorefrontError::UserError(message) => (StatusCode::UNPROCESSABLE_ENTITY, message.clone()),
        _ => (
            StatusCode::BAD_GATEWAY,
            "External service error, please try again".to_string(),
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(
            self,
            Self::Shopify(_) | Self::Checkout(CheckoutError::Storefront(_))
        ) {
            tracing::error!(error = %self, "Upstream request error");
        }

        let (status, message) = match &self {
            Self::Shopify(err) | Self::Checkout(CheckoutError::Storefront(err)) => {
                storefront_error_response(err)
            }
            Self::Checkout(CheckoutError::InFlight) => (
                StatusCode::CONFLICT,
                "A checkout is already in progress".to_string(),
            ),
            Self::Checkout(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            Self::Cart(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            Self::NotFound(what) => (StatusCode::NOT_FOUND, what.clone()),
            Self::BadRequest(what) => (StatusCode::BAD_REQUEST, what.clone()),
            Self::Unprocessable(what) => (StatusCode::UNPROCESSABLE_ENTITY, what.clone()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_billing_required_maps_to_503() {
        assert_eq!(
            status_of(AppError::Shopify(StorefrontError::BillingRequired)),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_transport_error_maps_to_502() {
        assert_eq!(
            status_of(AppError::Shopify(StorefrontError::Transport { status: 500 })),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_checkout_in_flight_maps_to_409() {
        assert_eq!(
            status_of(AppError::Checkout(CheckoutError::InFlight)),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_currency_mismatch_maps_to_422() {
        assert_eq!(
            status_of(AppError::Cart(CartError::CurrencyMismatch {
                cart: "USD".to_string(),
                item: "EUR".to_string(),
            })),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            status_of(AppError::NotFound("product".to_string())),
            StatusCode::NOT_FOUND
        );
    }
}
