//! Error types for build domain validation and parsing.

use super::{BuildId, UploadStatus, WorkflowStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating build domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildDomainError {
    /// A required opaque handle was blank.
    #[error("{0} must not be empty")]
    EmptyValue(&'static str),

    /// The requested workflow transition is not permitted.
    #[error("invalid workflow transition for build {build_id}: {from} -> {to}")]
    InvalidWorkflowTransition {
        /// Build identifier.
        build_id: BuildId,
        /// Current workflow status.
        from: WorkflowStatus,
        /// Requested workflow status.
        to: WorkflowStatus,
    },

    /// The upload status of a failed build is fixed at `FAILED`.
    #[error("upload status of failed build {build_id} cannot become {requested}")]
    UploadStatusLocked {
        /// Build identifier.
        build_id: BuildId,
        /// Requested upload status.
        requested: UploadStatus,
    },
}

/// Error returned while parsing build enums from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseBuildValueError {
    /// Name of the value kind being parsed.
    pub kind: &'static str,
    /// Raw value that failed to parse.
    pub value: String,
}

impl ParseBuildValueError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
