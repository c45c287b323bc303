//! Error types shared by the PostgreSQL storage implementation.

use thiserror::Error;

/// Convenient result alias returning [`PostgresDaoError`] failures.
pub type PostgresResult<T> = Result<T, PostgresDaoError>;

/// Failures that can occur while interacting with PostgreSQL.
#[derive(Debug, Error)]
pub enum PostgresDaoError {
    /// The pool could not be created or the server never answered.
    #[error("PostgreSQL connection failed after {attempts} attempt(s)")]
    Connect {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },
    /// A schema statement failed while preparing tables.
    #[error("failed to prepare schema: {step}")]
    Schema {
        step: &'static str,
        #[source]
        source: sqlx::Error,
    },
    /// Looking a user up failed.
    #[error("failed to find user by {by}")]
    FindUser {
        by: &'static str,
        #[source]
        source: sqlx::Error,
    },
    /// Listing usernames failed.
    #[error("failed to list usernames")]
    ListUsernames {
        #[source]
        source: sqlx::Error,
    },
    /// Listing results of a user failed.
    #[error("failed to list results for user `{user_id}`")]
    ListResults {
        user_id: i32,
        #[source]
        source: sqlx::Error,
    },
    /// Inserting a result row failed.
    #[error("failed to insert {form} result")]
    InsertResult {
        form: &'static str,
        #[source]
        source: sqlx::Error,
    },
}
