//! Outbox delivery consumer.
//!
//! A background task that drains the notification outbox: claim due rows,
//! render and send each email, then record the outcome. Failed attempts
//! retry with exponential backoff until [`MAX_ATTEMPTS`], after which the
//! row is parked as `failed` for operator inspection.
//!
//! Claiming is `FOR UPDATE SKIP LOCKED` underneath, so running replicas
//! never double-send; rows stranded in `sending` by a dead consumer are
//! released back to `pending` each tick.

use std::time::Duration;

use tracing::instrument;

use crate::db::{OutboxRepository, RepositoryError};
use crate::email::OrderEmail;
use crate::models::OutboxNotification;
use crate::state::AppState;

/// Time between drain ticks.
const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Rows claimed per tick.
const BATCH_SIZE: i64 = 20;

/// Attempts before a notification is parked as failed.
const MAX_ATTEMPTS: i32 = 5;

/// `sending` rows older than this are assumed orphaned.
const STALE_CLAIM_AGE: Duration = Duration::from_secs(10 * 60);

/// Backoff before retry number `attempts + 1`.
fn retry_delay(attempts: i32) -> Duration {
    let exponent = u32::try_from(attempts.clamp(0, 6)).unwrap_or(6);
    Duration::from_secs(60 * 2_u64.pow(exponent))
}

/// Spawn the consumer loop on the runtime.
pub fn spawn(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(state))
}

/// Run the consumer loop until the process exits.
async fn run(state: AppState) {
    tracing::info!("Notification outbox consumer started");
    let mut interval = tokio::time::interval(POLL_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        match tick(&state).await {
            Ok(0) => {}
            Ok(delivered) => tracing::info!(delivered, "Outbox tick delivered notifications"),
            Err(e) => tracing::error!(error = %e, "Outbox tick failed"),
        }
    }
}

/// One drain pass: release stale claims, then deliver a batch.
///
/// Returns the number of successfully delivered notifications.
#[instrument(skip(state))]
async fn tick(state: &AppState) -> Result<usize, RepositoryError> {
    let outbox = OutboxRepository::new(state.pool());

    let released = outbox.release_stale(STALE_CLAIM_AGE).await?;
    if released > 0 {
        tracing::warn!(released, "Released stale outbox claims");
    }

    let claimed = outbox.claim_due(BATCH_SIZE).await?;
    let mut delivered = 0;

    for notification in claimed {
        if deliver(state, &outbox, notification).await {
            delivered += 1;
        }
    }

    Ok(delivered)
}

/// Deliver one claimed notification and record the outcome.
async fn deliver(
    state: &AppState,
    outbox: &OutboxRepository<'_>,
    notification: OutboxNotification,
) -> bool {
    let payload: OrderEmail = match serde_json::from_value(notification.payload.clone()) {
        Ok(payload) => payload,
        Err(e) => {
            // An unreadable payload will never deliver; park it immediately.
            tracing::error!(
                error = %e,
                notification_id = %notification.id,
                "Unparseable outbox payload"
            );
            record_failure(outbox, &notification, &format!("unparseable payload: {e}"), 0).await;
            return false;
        }
    };

    match state.email().send(&payload).await {
        Ok(()) => {
            if let Err(e) = outbox.mark_sent(notification.id).await {
                tracing::error!(
                    error = %e,
                    notification_id = %notification.id,
                    "Delivered email but failed to mark the outbox row sent"
                );
            }
            true
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                notification_id = %notification.id,
                attempts = notification.attempts,
                "Email delivery failed; scheduling retry"
            );
            record_failure(outbox, &notification, &e.to_string(), MAX_ATTEMPTS).await;
            false
        }
    }
}

/// Record a failed attempt, logging if even that fails.
async fn record_failure(
    outbox: &OutboxRepository<'_>,
    notification: &OutboxNotification,
    error: &str,
    max_attempts: i32,
) {
    let delay = retry_delay(notification.attempts);
    if let Err(e) = outbox
        .mark_failed_attempt(notification.id, error, delay, max_attempts)
        .await
    {
        tracing::error!(
            error = %e,
            notification_id = %notification.id,
            "Failed to record outbox delivery failure"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_doubles() {
        assert_eq!(retry_delay(0), Duration::from_secs(60));
        assert_eq!(retry_delay(1), Duration::from_secs(120));
        assert_eq!(retry_delay(2), Duration::from_secs(240));
        assert_eq!(retry_delay(4), Duration::from_secs(960));
    }

    #[test]
    fn test_retry_delay_is_capped() {
        assert_eq!(retry_delay(6), retry_delay(100));
    }
}
