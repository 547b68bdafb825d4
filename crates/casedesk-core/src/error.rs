//! Error types for casedesk.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaseError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("Unknown appeal status: {id}")]
    UnknownStatus { id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Notification delivery failed: {0}")]
    Notification(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CaseError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Client-side errors are surfaced to the caller as-is and never retried.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::AlreadyExists { .. }
                | Self::PermissionDenied { .. }
                | Self::UnknownStatus { .. }
                | Self::Validation { .. }
                | Self::Conflict { .. }
        )
    }
}

pub type CaseResult<T> = Result<T, CaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_classified() {
        assert!(CaseError::denied("nope").is_client_error());
        assert!(CaseError::not_found("appeal", "x").is_client_error());
        assert!(!CaseError::Database("down".into()).is_client_error());
        assert!(!CaseError::Notification("closed".into()).is_client_error());
    }

    #[test]
    fn display_includes_context() {
        let err = CaseError::not_found("appeal", "42");
        assert_eq!(err.to_string(), "Entity not found: appeal with id 42");
    }
}
