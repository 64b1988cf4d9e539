//! Error types for the catalog.

use thiserror::Error;

/// Result alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur while reading or writing the catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Any SQL failure not covered by a more specific variant.
    #[error("database error: {0}")]
    Database(String),

    /// Requested row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unique constraint violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Input rejected before or by the database (bad reference, bad value).
    #[error("invalid input: {0}")]
    Invalid(String),

    /// Stored JSON could not be read or written.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database directory could not be prepared.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// External PostgreSQL server could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),
}

impl CatalogError {
    /// Map a sqlx error, turning constraint violations into their own variants.
    pub(crate) fn from_sqlx(context: &str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = err {
            if db.is_unique_violation() {
                return Self::Conflict(format!("{}: {}", context, db.message()));
            }
            if db.is_foreign_key_violation() {
                return Self::Invalid(format!("{}: {}", context, db.message()));
            }
        }
        Self::Database(format!("{}: {}", context, err))
    }

    /// Create a NotFound error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
