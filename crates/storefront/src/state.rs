//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::cart::CartStore;
use crate::config::StorefrontConfig;
use crate::shopify::StorefrontClient;

/// How long an untouched cart survives in the registry.
const CART_IDLE_EXPIRY: Duration = Duration::from_secs(60 * 60 * 24 * 30);

/// Upper bound on concurrently live carts.
const CART_REGISTRY_CAPACITY: u64 = 100_000;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// Storefront API client and the cart registry.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    carts: Cache<String, Arc<CartStore>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let storefront = StorefrontClient::new(&config.shopify);

        // Carts are a convenience cache, not server-trusted state: Shopify
        // re-validates price and availability at checkout creation. Idle
        // expiry mirrors how long a browser would keep local storage around.
        let carts = Cache::builder()
            .max_capacity(CART_REGISTRY_CAPACITY)
            .time_to_idle(CART_IDLE_EXPIRY)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                carts,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Get the cart for the given ID, creating an empty one if absent.
    pub async fn cart(&self, cart_id: &str) -> Arc<CartStore> {
        self.inner
            .carts
            .get_with(cart_id.to_string(), async { Arc::new(CartStore::new()) })
            .await
    }

    /// Get the cart for the given ID only if it already exists.
    pub async fn existing_cart(&self, cart_id: &str) -> Option<Arc<CartStore>> {
        self.inner.carts.get(cart_id).await
    }

    /// Drop a cart from the registry.
    pub async fn drop_cart(&self, cart_id: &str) {
        self.inner.carts.invalidate(cart_id).await;
    }
}
