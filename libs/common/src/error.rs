//! Database error taxonomy
//!
//! Errors from the relational backend are classified by the phase they
//! occur in; callers decide how much of that detail reaches the client.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Errors raised by the database layer
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The pool could not be established
    #[error("database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// A query failed after the pool was up
    #[error("database query error: {0}")]
    Query(#[source] SqlxError),

    /// Schema migrations could not be applied
    #[error("database migration error: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),

    /// The configuration itself is unusable (bad URL, bad numbers)
    #[error("database configuration error: {0}")]
    Configuration(String),
}

/// Result alias for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;
