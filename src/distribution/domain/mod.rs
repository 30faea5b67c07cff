//! Domain model for store distribution and rollout control.
//!
//! A release targets a set of platforms; each platform carries a chain of
//! store submissions in which only the newest, unsuperseded record is
//! current. The release-level [`DistributionStatus`] is never stored: it is
//! derived from the current submissions whenever one of them changes.

mod distribution;
mod error;
mod ids;
mod phased;
mod submission;

pub use distribution::{
    DistributionSnapshot, DistributionStatus, PlatformDistribution, ReleaseDistribution,
};
pub use error::{DistributionDomainError, ParseDistributionValueError};
pub use ids::{ExposurePercent, SubmissionId, VersionName};
pub use phased::{PHASED_RELEASE_DAYS, phased_exposure};
pub use submission::{
    HaltRecord, HaltSeverity, NewSubmission, PersistedSubmissionData, RolloutSchedule, Submission,
    SubmissionStatus,
};
