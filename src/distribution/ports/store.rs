//! Port for the app-store submission APIs.
//!
//! Rollout operations are local mirrors of these remote effects: services
//! call through to the store first and persist only once it has accepted.

use crate::distribution::domain::{ExposurePercent, Submission};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for store client operations.
pub type StoreClientResult<T> = Result<T, StoreClientError>;

/// Remote store operation, used for logging and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreOperation {
    /// Upload a version for review.
    Submit,
    /// Withdraw an unreleased version.
    Cancel,
    /// Change the rollout exposure.
    SetExposure,
    /// Pause a staged rollout.
    Pause,
    /// Resume a paused rollout.
    Resume,
    /// Halt a rollout.
    Halt,
    /// Finish a store-phased release early.
    CompletePhasedRelease,
}

impl StoreOperation {
    /// Returns the operation name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Cancel => "cancel",
            Self::SetExposure => "set_exposure",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Halt => "halt",
            Self::CompletePhasedRelease => "complete_phased_release",
        }
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store acknowledgement of a submission upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreSubmissionReceipt {
    /// Whether the store already moved the version into review.
    pub in_review: bool,
}

/// App-store submission client. Implementations dispatch on
/// [`Submission::platform`].
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Uploads the submission's version for review.
    async fn submit(&self, submission: &Submission) -> StoreClientResult<StoreSubmissionReceipt>;

    /// Withdraws an unreleased version.
    async fn cancel(&self, submission: &Submission) -> StoreClientResult<()>;

    /// Sets the rollout exposure.
    async fn set_exposure(
        &self,
        submission: &Submission,
        percent: ExposurePercent,
    ) -> StoreClientResult<()>;

    /// Pauses the rollout.
    async fn pause(&self, submission: &Submission) -> StoreClientResult<()>;

    /// Resumes a paused rollout.
    async fn resume(&self, submission: &Submission) -> StoreClientResult<()>;

    /// Halts the rollout.
    async fn halt(&self, submission: &Submission) -> StoreClientResult<()>;

    /// Releases a store-phased rollout to every user immediately.
    async fn complete_phased_release(&self, submission: &Submission) -> StoreClientResult<()>;
}

/// Errors returned by store clients.
#[derive(Debug, Clone, Error)]
pub enum StoreClientError {
    /// The store refused the request.
    #[error("store rejected the request: {0}")]
    Rejected(String),

    /// The store could not be reached.
    #[error("store transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreClientError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
