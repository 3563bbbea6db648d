//! CLI subcommands.

pub mod migrate;
pub mod status;

use thiserror::Error;

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection or query failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Resolve the webhook-service database URL from the environment.
pub(crate) fn database_url() -> Result<String, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("WEBHOOKS_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("WEBHOOKS_DATABASE_URL"))
}
