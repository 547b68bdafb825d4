//! Database-specific error types and conversions.

use casedesk_core::error::CaseError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Malformed row: {0}")]
    Decode(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for CaseError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CaseError::NotFound { entity, id },
            DbError::Hash(msg) => CaseError::Internal(msg),
            other => CaseError::Database(other.to_string()),
        }
    }
}
