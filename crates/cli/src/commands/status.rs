//! Database status command.

use sqlx::PgPool;
use sqlx::Row;

use super::CommandError;

/// Check connectivity and list applied migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing or the queries fail.
pub async fn run() -> Result<(), CommandError> {
    let database_url = super::database_url()?;

    let pool = PgPool::connect(&database_url).await?;
    sqlx::query("SELECT 1").fetch_one(&pool).await?;
    tracing::info!("Database reachable");

    let rows = sqlx::query(
        r"
        SELECT version, description
        FROM _sqlx_migrations
        ORDER BY version
        ",
    )
    .fetch_all(&pool)
    .await?;

    if rows.is_empty() {
        tracing::warn!("No migrations applied yet; run `atelier migrate`");
        return Ok(());
    }

    for row in rows {
        let version: i64 = row.try_get("version")?;
        let description: String = row.try_get("description")?;
        tracing::info!(version, description = %description, "applied");
    }

    Ok(())
}
