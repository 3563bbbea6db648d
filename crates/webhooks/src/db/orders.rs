//! Order repository.
//!
//! Orders are create-only: one row per external order ID, enforced by a
//! unique index rather than a read-then-write check, so two simultaneous
//! deliveries of the same order cannot both insert.

use sqlx::PgPool;
use tracing::instrument;

use atelier_core::OrderId;

use crate::models::{NewOrder, NewOrderItem};

use super::RepositoryError;

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order row.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::AlreadyExists`] when an order with the same
    /// external ID is already recorded (the idempotent no-op branch), and
    /// [`RepositoryError::Database`] for any other failure.
    #[instrument(skip(self, order), fields(shopify_order_id = %order.shopify_order_id))]
    pub async fn create(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let order_id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO orders (
                shopify_order_id, order_number, email, user_id, status,
                financial_status, fulfillment_status,
                subtotal_price, total_tax, total_shipping, total_price,
                currency_code, customer_name, shipping_address, billing_address
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING id
            ",
        )
        .bind(&order.shopify_order_id)
        .bind(&order.order_number)
        .bind(order.email.as_deref())
        .bind(order.user_id)
        .bind(order.status)
        .bind(order.financial_status.as_deref())
        .bind(order.fulfillment_status.as_deref())
        .bind(order.subtotal_price)
        .bind(order.total_tax)
        .bind(order.total_shipping)
        .bind(order.total_price)
        .bind(&order.currency_code)
        .bind(order.customer_name.as_deref())
        .bind(order.shipping_address.as_ref())
        .bind(order.billing_address.as_ref())
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_insert)?;

        Ok(OrderId::new(order_id))
    }

    /// Insert the item snapshots for an order.
    ///
    /// Best-effort by contract: the caller logs and absorbs a failure here,
    /// because an order record without items beats no record at all.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails.
    #[instrument(skip(self, items), fields(order_id = %order_id, item_count = items.len()))]
    pub async fn add_items(
        &self,
        order_id: OrderId,
        items: &[NewOrderItem],
    ) -> Result<(), RepositoryError> {
        for item in items {
            sqlx::query(
                r"
                INSERT INTO order_items (
                    order_id, shopify_product_id, shopify_variant_id,
                    product_title, variant_title, quantity, price, total, image_url
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ",
            )
            .bind(order_id)
            .bind(&item.shopify_product_id)
            .bind(&item.shopify_variant_id)
            .bind(&item.product_title)
            .bind(item.variant_title.as_deref())
            .bind(item.quantity)
            .bind(item.price)
            .bind(item.total)
            .bind(item.image_url.as_deref())
            .execute(self.pool)
            .await?;
        }

        Ok(())
    }
}
