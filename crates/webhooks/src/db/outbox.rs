//! Notification outbox repository.
//!
//! The outbox decouples "order recorded" from "email sent": rows are
//! enqueued right after the order insert commits and delivered later by the
//! consumer in [`crate::outbox`]. Claiming uses `FOR UPDATE SKIP LOCKED`,
//! so concurrent consumers never double-send a notification.

use std::time::Duration;

use sqlx::PgPool;
use tracing::instrument;

use atelier_core::{NotificationId, OrderId};

use crate::models::{OutboxNotification, OutboxStatus};

use super::RepositoryError;

/// Repository for outbox operations.
pub struct OutboxRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OutboxRepository<'a> {
    /// Create a new outbox repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Enqueue a notification for later delivery.
    ///
    /// Called after the order insert commits; the caller logs and absorbs a
    /// failure here (recording the order outranks every auxiliary effect).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, payload))]
    pub async fn enqueue(
        &self,
        order_id: OrderId,
        payload: &serde_json::Value,
    ) -> Result<NotificationId, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO notification_outbox (order_id, payload)
            VALUES ($1, $2)
            RETURNING id
            ",
        )
        .bind(order_id)
        .bind(payload)
        .fetch_one(self.pool)
        .await?;

        Ok(NotificationId::new(id))
    }

    /// Atomically claim up to `limit` due notifications.
    ///
    /// Claimed rows move to `sending`; they return to `pending` only through
    /// [`release_stale`] if the consumer dies before marking an outcome.
    ///
    /// [`release_stale`]: Self::release_stale
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn claim_due(&self, limit: i64) -> Result<Vec<OutboxNotification>, RepositoryError> {
        let rows = sqlx::query_as::<_, OutboxNotification>(
            r"
            UPDATE notification_outbox
            SET status = $2, updated_at = NOW()
            WHERE id IN (
                SELECT id FROM notification_outbox
                WHERE status = $3 AND next_attempt_at <= NOW()
                ORDER BY id
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, payload, attempts
            ",
        )
        .bind(limit)
        .bind(OutboxStatus::Sending)
        .bind(OutboxStatus::Pending)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Mark a notification as delivered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_sent(&self, id: NotificationId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE notification_outbox
            SET status = $2, attempts = attempts + 1, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(OutboxStatus::Sent)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Record a failed delivery attempt and schedule the retry.
    ///
    /// Once `max_attempts` is reached the row moves to `failed` and stays
    /// there for operator inspection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_failed_attempt(
        &self,
        id: NotificationId,
        error: &str,
        retry_in: Duration,
        max_attempts: i32,
    ) -> Result<(), RepositoryError> {
        #[allow(clippy::cast_possible_wrap)]
        let retry_secs = retry_in.as_secs() as i64;

        sqlx::query(
            r"
            UPDATE notification_outbox
            SET attempts = attempts + 1,
                last_error = $2,
                status = CASE WHEN attempts + 1 >= $3 THEN $5 ELSE $6 END,
                next_attempt_at = NOW() + make_interval(secs => $4::double precision),
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(error)
        .bind(max_attempts)
        .bind(retry_secs)
        .bind(OutboxStatus::Failed)
        .bind(OutboxStatus::Pending)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Return long-stuck `sending` rows to `pending`.
    ///
    /// A row stays `sending` only while a consumer is actively delivering it;
    /// anything older than `older_than` belonged to a consumer that died
    /// mid-flight.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self))]
    pub async fn release_stale(&self, older_than: Duration) -> Result<u64, RepositoryError> {
        #[allow(clippy::cast_possible_wrap)]
        let cutoff_secs = older_than.as_secs() as i64;

        let result = sqlx::query(
            r"
            UPDATE notification_outbox
            SET status = $2, updated_at = NOW()
            WHERE status = $3
              AND updated_at < NOW() - make_interval(secs => $1::double precision)
            ",
        )
        .bind(cutoff_secs)
        .bind(OutboxStatus::Pending)
        .bind(OutboxStatus::Sending)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
