//! Storefront API client implementation.

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde_json::json;
use tracing::instrument;

use crate::config::ShopifyConfig;

use super::StorefrontError;
use super::queries;
use super::types::{
    CartCreateData, CheckoutLineInput, Collection, CollectionByHandleData, CollectionsData,
    CreatedCart, CollectionWithProducts, Product, ProductByHandleData,
};

/// Client for the Shopify Storefront API.
///
/// Cheaply cloneable; all requests go to a single fixed endpoint with a fixed
/// access token header.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl StorefrontClient {
    /// Create a new Storefront API client from configuration.
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        let endpoint = format!(
            "https://{}/api/{}/graphql.json",
            config.store, config.api_version
        );

        Self::from_parts(endpoint, config.storefront_token.expose_secret().to_string())
    }

    /// Create a client against an explicit endpoint.
    ///
    /// Used by tests to point at a local mock server.
    #[must_use]
    pub fn from_parts(endpoint: String, access_token: String) -> Self {
        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint,
                access_token,
            }),
        }
    }

    /// Execute a GraphQL document and return the response `data` object.
    ///
    /// Error taxonomy:
    /// - HTTP 402 is an account-level billing failure ([`StorefrontError::BillingRequired`])
    /// - any other non-2xx status is a transport failure carrying the status
    /// - a 2xx body with a top-level `errors` array fails with the joined
    ///   upstream messages
    async fn execute(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value, StorefrontError> {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("X-Shopify-Storefront-Access-Token", &self.inner.access_token)
            .header("Content-Type", "application/json")
            .json(&json!({
                "query": query,
                "variables": variables,
            }))
            .send()
            .await?;

        let status = response.status();

        // Shopify signals an inactive billing plan with 402 on every request;
        // retrying cannot help, an operator has to act.
        if status == reqwest::StatusCode::PAYMENT_REQUIRED {
            return Err(StorefrontError::BillingRequired);
        }

        if !status.is_success() {
            return Err(StorefrontError::Transport {
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = response.json().await?;

        if let Some(errors) = body.get("errors").and_then(serde_json::Value::as_array)
            && !errors.is_empty()
        {
            let joined = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or("(no message)")
                        .to_string()
                })
                .collect::<Vec<_>>()
                .join(", ");
            return Err(StorefrontError::GraphQL(joined));
        }

        Ok(body.get("data").cloned().unwrap_or(serde_json::Value::Null))
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get the first `first` collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_collections(&self, first: u32) -> Result<Vec<Collection>, StorefrontError> {
        let data = self
            .execute(queries::COLLECTIONS_QUERY, json!({ "first": first }))
            .await?;

        let data: CollectionsData = serde_json::from_value(data)?;
        Ok(data.collections.into_nodes())
    }

    /// Get a collection by handle together with a page of its products.
    ///
    /// Returns `None` when no collection has the handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_collection_products(
        &self,
        handle: &str,
        first: u32,
    ) -> Result<Option<CollectionWithProducts>, StorefrontError> {
        let data = self
            .execute(
                queries::COLLECTION_PRODUCTS_QUERY,
                json!({ "handle": handle, "first": first }),
            )
            .await?;

        let data: CollectionByHandleData = serde_json::from_value(data)?;
        Ok(data.collection)
    }

    /// Get a product by its handle.
    ///
    /// Returns `None` when no product has the handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<Product>, StorefrontError> {
        let data = self
            .execute(queries::PRODUCT_BY_HANDLE_QUERY, json!({ "handle": handle }))
            .await?;

        let data: ProductByHandleData = serde_json::from_value(data)?;
        Ok(data.product_by_handle)
    }

    // =========================================================================
    // Cart Creation
    // =========================================================================

    /// Create a Shopify cart from line items and return it with its hosted
    /// checkout URL.
    ///
    /// # Errors
    ///
    /// Fails with [`StorefrontError::UserError`] when the mutation reports
    /// `userErrors`, and [`StorefrontError::MissingCheckoutUrl`] when the
    /// response carries no cart or no checkout URL.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn create_cart(
        &self,
        lines: Vec<CheckoutLineInput>,
    ) -> Result<CreatedCart, StorefrontError> {
        let data = self
            .execute(
                queries::CART_CREATE_MUTATION,
                json!({ "input": { "lines": lines } }),
            )
            .await?;

        let data: CartCreateData = serde_json::from_value(data)?;
        let payload = data.cart_create.ok_or(StorefrontError::MissingCheckoutUrl)?;

        if !payload.user_errors.is_empty() {
            return Err(StorefrontError::UserError(
                payload
                    .user_errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("; "),
            ));
        }

        let cart = payload.cart.ok_or(StorefrontError::MissingCheckoutUrl)?;
        if cart.checkout_url.is_none() {
            return Err(StorefrontError::MissingCheckoutUrl);
        }

        Ok(cart)
    }
}
