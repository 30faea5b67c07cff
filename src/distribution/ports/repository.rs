//! Repository port for release distributions and store submissions.

use crate::distribution::domain::{ReleaseDistribution, Submission, SubmissionId};
use crate::release::ReleaseId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for distribution repository operations.
pub type DistributionRepositoryResult<T> = Result<T, DistributionRepositoryError>;

/// Distribution persistence contract.
///
/// Submission writes are compare-and-swap on [`Submission::revision`]: the
/// caller passes the revision it read, and the write fails if anything has
/// been stored since.
#[async_trait]
pub trait DistributionRepository: Send + Sync {
    /// Registers the target platform set of a release.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionRepositoryError::DuplicateRelease`] when the
    /// release is already registered.
    async fn register_release(
        &self,
        distribution: &ReleaseDistribution,
    ) -> DistributionRepositoryResult<()>;

    /// Finds the target platform set of a release.
    async fn find_release(
        &self,
        release_id: ReleaseId,
    ) -> DistributionRepositoryResult<Option<ReleaseDistribution>>;

    /// Stores a new submission.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionRepositoryError::DuplicateSubmission`] when the
    /// identifier already exists.
    async fn store_submission(&self, submission: &Submission) -> DistributionRepositoryResult<()>;

    /// Finds a submission by identifier.
    async fn find_submission(
        &self,
        id: SubmissionId,
    ) -> DistributionRepositoryResult<Option<Submission>>;

    /// Returns every submission of a release, superseded ones included, in
    /// creation order.
    async fn list_submissions(
        &self,
        release_id: ReleaseId,
    ) -> DistributionRepositoryResult<Vec<Submission>>;

    /// Replaces a stored submission when its stored revision equals
    /// `expected_revision`.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionRepositoryError::NotFound`] or
    /// [`DistributionRepositoryError::StaleRevision`].
    async fn update_submission(
        &self,
        submission: &Submission,
        expected_revision: u64,
    ) -> DistributionRepositoryResult<()>;

    /// Atomically replaces `previous` (compare-and-swap on
    /// `expected_revision`) and stores `replacement`.
    ///
    /// Neither write happens when either fails.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::update_submission`] and
    /// [`Self::store_submission`].
    async fn supersede(
        &self,
        previous: &Submission,
        expected_revision: u64,
        replacement: &Submission,
    ) -> DistributionRepositoryResult<()>;
}

/// Errors returned by distribution repository implementations.
#[derive(Debug, Clone, Error)]
pub enum DistributionRepositoryError {
    /// The release is already registered.
    #[error("release distribution already registered: {0}")]
    DuplicateRelease(ReleaseId),

    /// A submission with the same identifier already exists.
    #[error("duplicate submission identifier: {0}")]
    DuplicateSubmission(SubmissionId),

    /// The submission was not found.
    #[error("submission not found: {0}")]
    NotFound(SubmissionId),

    /// Another writer stored the submission since the caller read it.
    #[error("stale revision for submission {submission_id}: expected {expected}, found {actual}")]
    StaleRevision {
        /// Submission identifier.
        submission_id: SubmissionId,
        /// Revision the caller read.
        expected: u64,
        /// Revision currently stored.
        actual: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl DistributionRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
