//! The cart store: line aggregation, derived totals, checkout creation.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

use atelier_core::Money;

use crate::shopify::types::{CheckoutLineInput, SelectedOption};
use crate::shopify::{StorefrontClient, StorefrontError};

use super::line::{CartLine, CartSnapshot, ProductRef};
use super::{CartError, CheckoutError};

/// Query parameter appended to every checkout URL to attribute the sale.
const SALES_CHANNEL_PARAM: (&str, &str) = ("channel", "online_store");

/// Ephemeral result of submitting the cart to Shopify.
///
/// Lives only as long as it takes the client to follow the redirect; it is
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Hosted checkout URL (sales channel parameter already appended).
    pub checkout_url: String,
    /// Cart total as computed by Shopify.
    pub total: Money,
}

/// Read model of a cart line.
#[derive(Debug, Clone, Serialize)]
pub struct LineView {
    pub variant_id: String,
    pub product: ProductRef,
    pub unit_price: Money,
    pub quantity: u32,
    pub selected_options: Vec<SelectedOption>,
    /// `unit_price * quantity`.
    pub line_total: Decimal,
}

/// Read model of the whole cart, exposed through the JSON API.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<LineView>,
    /// Sum of all line quantities.
    pub item_count: u32,
    /// Sum of `unit_price * quantity` over all lines; `None` when empty.
    pub subtotal: Option<Money>,
    /// The cart's single enforced currency; `None` when empty.
    pub currency_code: Option<String>,
    /// Whether a checkout request is currently outstanding; the UI uses
    /// this to disable its checkout button.
    pub checkout_in_flight: bool,
}

/// Authoritative cart state for one visitor.
///
/// Interior mutability makes a shared `Arc<CartStore>` safe under concurrent
/// requests: line mutations serialize on a mutex, and checkout creation is
/// additionally gated by an atomic in-flight flag so a double-submitted
/// checkout issues exactly one upstream mutation.
pub struct CartStore {
    lines: Mutex<Vec<CartLine>>,
    checkout: Mutex<Option<CheckoutSession>>,
    checkout_in_flight: AtomicBool,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
            checkout: Mutex::new(None),
            checkout_in_flight: AtomicBool::new(false),
        }
    }

    /// Reconstruct a cart from a previously taken snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: CartSnapshot) -> Self {
        Self {
            lines: Mutex::new(snapshot.lines),
            checkout: Mutex::new(None),
            checkout_in_flight: AtomicBool::new(false),
        }
    }

    /// Serialize the cart's contents.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.locked_lines().clone(),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a line to the cart.
    ///
    /// If a line with the same `variant_id` already exists its quantity is
    /// incremented by the candidate's quantity; otherwise the candidate is
    /// appended. A candidate quantity of 0 is normalized to 1.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] when the candidate is priced
    /// in a different currency than the cart; the cart is left unchanged.
    pub fn add_item(&self, mut candidate: CartLine) -> Result<(), CartError> {
        let mut lines = self.locked_lines();

        if let Some(first) = lines.first()
            && first.unit_price.currency_code != candidate.unit_price.currency_code
        {
            return Err(CartError::CurrencyMismatch {
                cart: first.unit_price.currency_code.clone(),
                item: candidate.unit_price.currency_code.clone(),
            });
        }

        candidate.quantity = candidate.quantity.max(1);

        match lines
            .iter_mut()
            .find(|line| line.variant_id == candidate.variant_id)
        {
            Some(existing) => existing.quantity += candidate.quantity,
            None => lines.push(candidate),
        }

        Ok(())
    }

    /// Set a line's quantity exactly.
    ///
    /// A quantity of 0 removes the line. An unknown `variant_id` is a no-op,
    /// not an error.
    pub fn update_quantity(&self, variant_id: &str, quantity: u32) {
        let mut lines = self.locked_lines();

        if quantity == 0 {
            lines.retain(|line| line.variant_id != variant_id);
            return;
        }

        if let Some(line) = lines.iter_mut().find(|line| line.variant_id == variant_id) {
            line.quantity = quantity;
        }
    }

    /// Remove a line if present; no-op otherwise.
    pub fn remove_item(&self, variant_id: &str) {
        self.locked_lines()
            .retain(|line| line.variant_id != variant_id);
    }

    /// Remove every line. Only an explicit user action calls this; a
    /// successful checkout handoff does not.
    pub fn clear(&self) {
        self.locked_lines().clear();
    }

    // =========================================================================
    // Derived reads
    // =========================================================================

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locked_lines().is_empty()
    }

    /// Total item count (sum of quantities).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.locked_lines().iter().map(|line| line.quantity).sum()
    }

    /// Cart subtotal, computed at read time. `None` when the cart is empty.
    #[must_use]
    pub fn subtotal(&self) -> Option<Money> {
        let lines = self.locked_lines();
        let first = lines.first()?;

        let amount: Decimal = lines.iter().map(|line| line.unit_price.times(line.quantity)).sum();
        Some(Money::new(amount, first.unit_price.currency_code.clone()))
    }

    /// The cart's currency. `None` when the cart is empty.
    #[must_use]
    pub fn currency_code(&self) -> Option<String> {
        self.locked_lines()
            .first()
            .map(|line| line.unit_price.currency_code.clone())
    }

    /// Whether a checkout request is currently outstanding.
    #[must_use]
    pub fn checkout_in_flight(&self) -> bool {
        self.checkout_in_flight.load(Ordering::Acquire)
    }

    /// The most recent checkout session, if one was created.
    #[must_use]
    pub fn checkout_session(&self) -> Option<CheckoutSession> {
        self.checkout
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Full read model for the JSON API.
    #[must_use]
    pub fn view(&self) -> CartView {
        let lines = self.locked_lines();

        let views: Vec<LineView> = lines
            .iter()
            .map(|line| LineView {
                variant_id: line.variant_id.clone(),
                product: line.product.clone(),
                unit_price: line.unit_price.clone(),
                quantity: line.quantity,
                selected_options: line.selected_options.clone(),
                line_total: line.unit_price.times(line.quantity),
            })
            .collect();

        let item_count = lines.iter().map(|line| line.quantity).sum();
        let currency_code = lines
            .first()
            .map(|line| line.unit_price.currency_code.clone());
        let subtotal = currency_code.as_ref().map(|code| {
            let amount = lines.iter().map(|line| line.unit_price.times(line.quantity)).sum();
            Money::new(amount, code.clone())
        });

        CartView {
            lines: views,
            item_count,
            subtotal,
            currency_code,
            checkout_in_flight: self.checkout_in_flight.load(Ordering::Acquire),
        }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Submit the cart to Shopify and return the hosted checkout session.
    ///
    /// At most one checkout call per cart is outstanding at a time: a second
    /// call while the first is in flight fails with
    /// [`CheckoutError::InFlight`] without issuing an upstream mutation.
    ///
    /// On any failure the cart's lines are left untouched and no retry is
    /// attempted; the caller decides whether to surface a retry affordance.
    ///
    /// # Errors
    ///
    /// Propagates upstream `userErrors`, transport failures, and a missing
    /// checkout URL as [`CheckoutError::Storefront`].
    pub async fn create_checkout(
        &self,
        client: &StorefrontClient,
    ) -> Result<CheckoutSession, CheckoutError> {
        if self
            .checkout_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CheckoutError::InFlight);
        }

        let result = self.create_checkout_inner(client).await;
        self.checkout_in_flight.store(false, Ordering::Release);
        result
    }

    async fn create_checkout_inner(
        &self,
        client: &StorefrontClient,
    ) -> Result<CheckoutSession, CheckoutError> {
        let inputs: Vec<CheckoutLineInput> = self
            .locked_lines()
            .iter()
            .map(|line| CheckoutLineInput {
                merchandise_id: line.variant_id.clone(),
                quantity: line.quantity,
            })
            .collect();

        let cart = client.create_cart(inputs).await?;

        let raw_url = cart
            .checkout_url
            .ok_or(CheckoutError::Storefront(StorefrontError::MissingCheckoutUrl))?;
        let checkout_url = with_sales_channel(&raw_url)?;

        let total = Money::parse(
            &cart.cost.total_amount.amount,
            &cart.cost.total_amount.currency_code,
        )?;

        let session = CheckoutSession {
            checkout_url,
            total,
        };

        *self
            .checkout
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(session.clone());

        Ok(session)
    }

    fn locked_lines(&self) -> std::sync::MutexGuard<'_, Vec<CartLine>> {
        // A poisoned lock means another request panicked mid-mutation; cart
        // contents are still structurally valid, so keep serving.
        self.lines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Append the fixed sales-channel parameter to a checkout URL.
fn with_sales_channel(raw: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(raw)?;
    url.query_pairs_mut()
        .append_pair(SALES_CHANNEL_PARAM.0, SALES_CHANNEL_PARAM.1);
    Ok(url.into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(variant_id: &str, amount: &str, currency: &str, quantity: u32) -> CartLine {
        CartLine {
            variant_id: variant_id.to_string(),
            product: ProductRef {
                title: format!("Product {variant_id}"),
                handle: format!("product-{variant_id}"),
                image_url: None,
            },
            unit_price: Money::parse(amount, currency).unwrap(),
            quantity,
            selected_options: Vec::new(),
        }
    }

    #[test]
    fn test_add_same_variant_aggregates_quantity() {
        let store = CartStore::new();
        store.add_item(line("v1", "10.00", "USD", 2)).unwrap();
        store.add_item(line("v1", "10.00", "USD", 3)).unwrap();
        store.add_item(line("v1", "10.00", "USD", 1)).unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.lines[0].quantity, 6);
    }

    #[test]
    fn test_add_zero_quantity_normalized_to_one() {
        let store = CartStore::new();
        store.add_item(line("v1", "10.00", "USD", 0)).unwrap();
        assert_eq!(store.item_count(), 1);
    }

    #[test]
    fn test_add_currency_mismatch_rejected_cart_unchanged() {
        let store = CartStore::new();
        store.add_item(line("v1", "10.00", "USD", 1)).unwrap();

        let before = serde_json::to_string(&store.snapshot()).unwrap();
        let err = store.add_item(line("v2", "8.00", "EUR", 1)).unwrap_err();
        let after = serde_json::to_string(&store.snapshot()).unwrap();

        assert!(matches!(err, CartError::CurrencyMismatch { .. }));
        assert_eq!(before, after);
    }

    #[test]
    fn test_update_quantity_sets_exactly() {
        let store = CartStore::new();
        store.add_item(line("v1", "10.00", "USD", 5)).unwrap();
        store.update_quantity("v1", 2);
        assert_eq!(store.item_count(), 2);
    }

    #[test]
    fn test_update_quantity_zero_removes_line() {
        let store = CartStore::new();
        store.add_item(line("v1", "10.00", "USD", 2)).unwrap();
        store.update_quantity("v1", 0);

        assert!(store.is_empty());
        assert!(
            !store
                .snapshot()
                .lines
                .iter()
                .any(|l| l.variant_id == "v1")
        );
    }

    #[test]
    fn test_update_quantity_unknown_variant_is_noop() {
        let store = CartStore::new();
        store.add_item(line("v1", "10.00", "USD", 2)).unwrap();

        let before = serde_json::to_string(&store.snapshot()).unwrap();
        store.update_quantity("missing", 7);
        let after = serde_json::to_string(&store.snapshot()).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_remove_unknown_variant_leaves_cart_unchanged() {
        let store = CartStore::new();
        store.add_item(line("v1", "10.00", "USD", 2)).unwrap();
        store.add_item(line("v2", "5.00", "USD", 1)).unwrap();

        let before = serde_json::to_string(&store.snapshot()).unwrap();
        store.remove_item("missing");
        let after = serde_json::to_string(&store.snapshot()).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_subtotal_and_item_count() {
        let store = CartStore::new();
        store.add_item(line("v1", "10.00", "USD", 2)).unwrap();
        store.add_item(line("v2", "5.00", "USD", 1)).unwrap();

        let subtotal = store.subtotal().unwrap();
        assert_eq!(subtotal.amount.to_string(), "25.00");
        assert_eq!(subtotal.currency_code, "USD");
        assert_eq!(store.item_count(), 3);
    }

    #[test]
    fn test_empty_cart_has_no_subtotal_or_currency() {
        let store = CartStore::new();
        assert!(store.subtotal().is_none());
        assert!(store.currency_code().is_none());
        assert_eq!(store.item_count(), 0);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let store = CartStore::new();
        store.add_item(line("v1", "10.00", "USD", 2)).unwrap();
        store.add_item(line("v2", "5.00", "USD", 1)).unwrap();

        let snapshot = store.snapshot();
        let restored = CartStore::from_snapshot(snapshot.clone());

        assert_eq!(
            serde_json::to_string(&restored.snapshot()).unwrap(),
            serde_json::to_string(&snapshot).unwrap()
        );
    }

    #[test]
    fn test_clear_empties_cart() {
        let store = CartStore::new();
        store.add_item(line("v1", "10.00", "USD", 2)).unwrap();
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_view_line_totals() {
        let store = CartStore::new();
        store.add_item(line("v1", "10.00", "USD", 2)).unwrap();

        let view = store.view();
        assert_eq!(view.lines[0].line_total.to_string(), "20.00");
        assert_eq!(view.subtotal.unwrap().amount.to_string(), "20.00");
        assert_eq!(view.currency_code.as_deref(), Some("USD"));
    }

    #[test]
    fn test_with_sales_channel_appends_parameter() {
        let url = with_sales_channel("https://shop.example.com/checkouts/cn/abc123").unwrap();
        assert_eq!(
            url,
            "https://shop.example.com/checkouts/cn/abc123?channel=online_store"
        );
    }

    #[test]
    fn test_with_sales_channel_preserves_existing_query() {
        let url = with_sales_channel("https://shop.example.com/checkouts/cn/abc?key=v").unwrap();
        assert!(url.contains("key=v"));
        assert!(url.contains("channel=online_store"));
    }
}
