//! Workflow error types.

use casedesk_core::error::CaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("inactive user")]
    InactiveActor,

    #[error("only representatives may create appeals")]
    NotARepresentative,

    #[error("initial appeal status not found")]
    InitialStatusMissing,

    #[error("file {name} is too large: {size} bytes, maximum is {limit} bytes")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),

    #[error("path escapes the upload root: {0}")]
    PathEscapesRoot(String),

    #[error("file storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("notification channel closed")]
    ChannelClosed,
}

impl From<WorkflowError> for CaseError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::InactiveActor | WorkflowError::NotARepresentative => {
                CaseError::denied(err.to_string())
            }
            WorkflowError::InitialStatusMissing => CaseError::Internal(err.to_string()),
            WorkflowError::FileTooLarge { .. }
            | WorkflowError::InvalidFileName(_)
            | WorkflowError::PathEscapesRoot(_) => CaseError::validation(err.to_string()),
            WorkflowError::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
                CaseError::not_found("file", err.to_string())
            }
            WorkflowError::Io(_) => CaseError::Storage(err.to_string()),
            WorkflowError::ChannelClosed => CaseError::Notification(err.to_string()),
        }
    }
}
