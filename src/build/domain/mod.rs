//! Domain model for CI/CD build tracking.
//!
//! Builds carry the provider handles needed to query their status and the
//! workflow/upload sub-statuses the reconciler advances. Provider-specific
//! vocabulary never crosses this boundary; adapters translate it into
//! [`CanonicalStatus`] first.

mod build;
mod error;
mod ids;
mod provider;

pub use build::{
    Build, NewBuild, PersistedBuildData, UploadStatus, WorkflowStatus, WorkflowTransition,
};
pub use error::{BuildDomainError, ParseBuildValueError};
pub use ids::{BuildId, BuildTarget, QueueLocation, RunId, TaskId};
pub use provider::{BuildStatusReport, CanonicalStatus, CiProviderType, QueueStatusReport};
