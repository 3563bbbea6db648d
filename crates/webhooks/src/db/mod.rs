//! Database operations for the webhook service.
//!
//! # Tables
//!
//! - `profiles` - Local user profiles (read-only here; the ingestor resolves
//!   order emails against it)
//! - `orders` - Durable order records, one per external order ID
//! - `order_items` - Immutable line snapshots owned by an order
//! - `notification_outbox` - Pending transactional-email work
//!
//! # Migrations
//!
//! Migrations live in `crates/webhooks/migrations/` and are run explicitly
//! via `cargo run -p atelier-cli -- migrate`, never on startup.
//!
//! Queries are runtime-checked (`sqlx::query`/`query_as`), so building the
//! workspace needs no database.

pub mod orders;
pub mod outbox;
pub mod profiles;

pub use orders::OrderRepository;
pub use outbox::OutboxRepository;
pub use profiles::ProfileRepository;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An insert hit a uniqueness constraint.
    ///
    /// For orders this IS the duplicate-delivery branch: webhook delivery is
    /// at-least-once, and the unique index on the external order ID turns a
    /// re-delivery into this error instead of a second row.
    #[error("record already exists")]
    AlreadyExists,

    /// Stored data failed to round-trip through a domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

impl RepositoryError {
    /// Classify an insert error, folding unique violations into
    /// [`RepositoryError::AlreadyExists`].
    #[must_use]
    pub fn from_insert(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::AlreadyExists;
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Create a pool that connects on first use.
///
/// Used by tests that exercise request paths which must reject before any
/// database access.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL does not parse.
pub fn create_lazy_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(2)
        .connect_lazy(database_url)
}
