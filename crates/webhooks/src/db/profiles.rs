//! Profile repository.
//!
//! Profiles are owned by the account system; the ingestor only reads them to
//! associate an incoming order with a local user by email.

use sqlx::PgPool;

use atelier_core::{Email, UserId};

use super::RepositoryError;

/// Repository for profile lookups.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find the profile ID for an email address.
    ///
    /// Absence is an expected outcome (guest orders), not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<UserId>, RepositoryError> {
        let id: Option<i64> = sqlx::query_scalar(
            r"
            SELECT id FROM profiles WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(id.map(UserId::new))
    }
}
