//! Repository port for build persistence and conditional status updates.

use crate::build::domain::{
    Build, BuildDomainError, BuildId, UploadStatus, WorkflowStatus, WorkflowTransition,
};
use crate::release::ReleaseId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for build repository operations.
pub type BuildRepositoryResult<T> = Result<T, BuildRepositoryError>;

/// Build persistence contract.
#[async_trait]
pub trait BuildRepository: Send + Sync {
    /// Stores a new build.
    ///
    /// # Errors
    ///
    /// Returns [`BuildRepositoryError::DuplicateBuild`] when the identifier
    /// already exists.
    async fn store(&self, build: &Build) -> BuildRepositoryResult<()>;

    /// Finds a build by identifier.
    ///
    /// Returns `None` when the build does not exist.
    async fn find_by_id(&self, id: BuildId) -> BuildRepositoryResult<Option<Build>>;

    /// Returns all builds of a release currently in `status`.
    async fn find_by_release_and_status(
        &self,
        release_id: ReleaseId,
        status: WorkflowStatus,
    ) -> BuildRepositoryResult<Vec<Build>>;

    /// Applies the workflow fields of `transition` only when the stored
    /// workflow status still equals `transition.expected`, and returns the
    /// stored build.
    ///
    /// Fields outside the transition, such as the upload status, keep their
    /// stored values.
    ///
    /// # Errors
    ///
    /// Returns [`BuildRepositoryError::NotFound`] when the build does not
    /// exist, or [`BuildRepositoryError::StaleWrite`] when another writer has
    /// changed the workflow status since it was read.
    async fn update_if_status(
        &self,
        transition: &WorkflowTransition,
    ) -> BuildRepositoryResult<Build>;

    /// Records the upload status of a stored build and returns the build.
    ///
    /// # Errors
    ///
    /// Returns [`BuildRepositoryError::NotFound`] when the build does not
    /// exist, or [`BuildRepositoryError::Rejected`] when the stored build
    /// refuses the change.
    async fn update_upload_status(
        &self,
        id: BuildId,
        status: UploadStatus,
        recorded_at: DateTime<Utc>,
    ) -> BuildRepositoryResult<Build>;
}

/// Errors returned by build repository implementations.
#[derive(Debug, Clone, Error)]
pub enum BuildRepositoryError {
    /// A build with the same identifier already exists.
    #[error("duplicate build identifier: {0}")]
    DuplicateBuild(BuildId),

    /// The build was not found.
    #[error("build not found: {0}")]
    NotFound(BuildId),

    /// The stored workflow status no longer matches the caller's read.
    #[error("stale write for build {build_id}: expected {expected}, found {actual}")]
    StaleWrite {
        /// Build identifier.
        build_id: BuildId,
        /// Status the caller read.
        expected: WorkflowStatus,
        /// Status currently stored.
        actual: WorkflowStatus,
    },

    /// The stored build rejected the change.
    #[error(transparent)]
    Rejected(#[from] BuildDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl BuildRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
