//! Database migration command.
//!
//! Applies the webhook-service migrations from
//! `crates/webhooks/migrations/`. Migrations never run on service startup;
//! this command is the only path that applies them.

use sqlx::PgPool;

use super::CommandError;

/// Run pending migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails,
/// or a migration fails to apply.
pub async fn run() -> Result<(), CommandError> {
    let database_url = super::database_url()?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Running webhook-service migrations...");
    sqlx::migrate!("../webhooks/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
