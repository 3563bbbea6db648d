//! Catalog route handlers.
//!
//! Thin pass-throughs to the Storefront API; failures surface through
//! `AppError` (billing failures distinctly from ordinary upstream errors).

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::shopify::types::{Collection, CollectionWithProducts, Product};
use crate::state::AppState;

/// Default page size for catalog listings.
const DEFAULT_PAGE_SIZE: u32 = 20;

/// Paging parameters for list endpoints.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    /// Number of items to fetch.
    pub first: Option<u32>,
}

/// GET /collections
#[instrument(skip(state))]
pub async fn list_collections(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Collection>>> {
    let first = params.first.unwrap_or(DEFAULT_PAGE_SIZE);
    let collections = state.storefront().get_collections(first).await?;
    Ok(Json(collections))
}

/// GET /collections/{handle}
#[instrument(skip(state))]
pub async fn show_collection(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<CollectionWithProducts>> {
    let first = params.first.unwrap_or(DEFAULT_PAGE_SIZE);
    let collection = state
        .storefront()
        .get_collection_products(&handle, first)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Collection not found: {handle}")))?;

    Ok(Json(collection))
}

/// GET /products/{handle}
#[instrument(skip(state))]
pub async fn show_product(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<Product>> {
    let product = state
        .storefront()
        .get_product_by_handle(&handle)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product not found: {handle}")))?;

    Ok(Json(product))
}
