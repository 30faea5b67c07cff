//! Error types for distribution domain validation and parsing.

use super::{ExposurePercent, SubmissionId, SubmissionStatus};
use crate::release::Platform;
use thiserror::Error;

/// Errors returned while constructing or mutating distribution values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DistributionDomainError {
    /// A required text value was blank.
    #[error("{0} must not be empty")]
    EmptyValue(&'static str),

    /// Exposure percentages are bounded to `0..=100`.
    #[error("exposure percent {0} is outside 0..=100")]
    ExposureOutOfRange(u8),

    /// A live submission must expose at least one percent of users.
    #[error("exposure percent must be greater than zero")]
    ZeroExposure,

    /// The requested status transition is not permitted.
    #[error("invalid submission transition for {submission_id}: {from} -> {to}")]
    InvalidTransition {
        /// Submission identifier.
        submission_id: SubmissionId,
        /// Current status.
        from: SubmissionStatus,
        /// Requested status.
        to: SubmissionStatus,
    },

    /// Rejection after release needs a new submission record.
    #[error("submission {submission_id} is {status}; a rejection at this stage requires a resubmission")]
    ResubmissionRequired {
        /// Submission identifier.
        submission_id: SubmissionId,
        /// Current status.
        status: SubmissionStatus,
    },

    /// Live exposure may only grow.
    #[error("exposure for submission {submission_id} cannot decrease from {current} to {requested}")]
    ExposureDecrease {
        /// Submission identifier.
        submission_id: SubmissionId,
        /// Stored exposure.
        current: ExposurePercent,
        /// Requested exposure.
        requested: ExposurePercent,
    },

    /// Exposure of a store-phased submission is set by the store.
    #[error("submission {submission_id} follows the store's phased schedule; use complete early")]
    PhasedRolloutManaged {
        /// Submission identifier.
        submission_id: SubmissionId,
    },

    /// The submission does not follow a store-phased schedule.
    #[error("submission {submission_id} has no store-phased schedule")]
    NotPhased {
        /// Submission identifier.
        submission_id: SubmissionId,
    },

    /// Store-phased schedules are only offered by some stores.
    #[error("store-phased rollout is not available on {0}")]
    PhasedScheduleUnsupported(Platform),

    /// Rollout day outside the store's schedule.
    #[error("rollout day {0} is outside the phased schedule")]
    InvalidRolloutDay(u8),

    /// The store schedule never moves backwards.
    #[error("rollout day cannot move back from {current} to {requested}")]
    RolloutDayRegression {
        /// Stored rollout day.
        current: u8,
        /// Reported rollout day.
        requested: u8,
    },

    /// The rollout already reached every user.
    #[error("submission {submission_id} is already fully released")]
    RolloutComplete {
        /// Submission identifier.
        submission_id: SubmissionId,
    },

    /// Superseded submissions are read-only.
    #[error("submission {submission_id} was superseded by {superseded_by}")]
    Superseded {
        /// Submission identifier.
        submission_id: SubmissionId,
        /// Replacement submission.
        superseded_by: SubmissionId,
    },

    /// A release distribution needs at least one target platform.
    #[error("release distribution must target at least one platform")]
    NoTargetPlatforms,

    /// Target platforms must be distinct.
    #[error("platform {0} is listed more than once")]
    DuplicatePlatform(Platform),
}

/// Error returned while parsing distribution enums from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseDistributionValueError {
    /// Name of the value kind being parsed.
    pub kind: &'static str,
    /// Raw value that failed to parse.
    pub value: String,
}

impl ParseDistributionValueError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
