//! Error types for the persistence and generation layers
//!
//! "Not found" is never an error here: readers return `Ok(None)` and the
//! HTTP boundary turns that into a 404.

use thiserror::Error;

/// Failure of a backing store, the statement generator, or a write-time
/// integrity check. Aborts the enclosing unit of work.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Unit of work session already closed")]
    SessionClosed,

    #[error("Statement generation failed: {0}")]
    Generation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error("Cannot decode column '{column}' of type {type_name}")]
    Decode { column: String, type_name: String },

    #[error("Seed data error: {0}")]
    Seed(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
