//! Release-level distribution state derived from per-platform submissions.

use super::{
    DistributionDomainError, ExposurePercent, Submission, SubmissionId, SubmissionStatus,
    VersionName,
};
use crate::release::{Platform, ReleaseId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Platforms a release is distributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDistribution {
    release_id: ReleaseId,
    platforms: BTreeSet<Platform>,
}

impl ReleaseDistribution {
    /// Creates a validated distribution target set.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionDomainError::NoTargetPlatforms`] for an empty
    /// set or [`DistributionDomainError::DuplicatePlatform`] when a platform
    /// is listed twice.
    pub fn new(
        release_id: ReleaseId,
        platforms: impl IntoIterator<Item = Platform>,
    ) -> Result<Self, DistributionDomainError> {
        let mut targets = BTreeSet::new();
        for platform in platforms {
            if !targets.insert(platform) {
                return Err(DistributionDomainError::DuplicatePlatform(platform));
            }
        }
        if targets.is_empty() {
            return Err(DistributionDomainError::NoTargetPlatforms);
        }
        Ok(Self {
            release_id,
            platforms: targets,
        })
    }

    /// Returns the release identifier.
    #[must_use]
    pub const fn release_id(&self) -> ReleaseId {
        self.release_id
    }

    /// Returns the target platforms in stable order.
    #[must_use]
    pub const fn platforms(&self) -> &BTreeSet<Platform> {
        &self.platforms
    }

    /// Returns whether `platform` is a target.
    #[must_use]
    pub fn targets(&self, platform: Platform) -> bool {
        self.platforms.contains(&platform)
    }
}

/// Aggregate distribution status of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistributionStatus {
    /// No target platform has an outstanding submission.
    Pending,
    /// Some but not all target platforms are submitted.
    PartiallySubmitted,
    /// Every target platform is submitted, none fully released.
    Submitted,
    /// Some target platforms are live for every user.
    PartiallyReleased,
    /// Every target platform is live for every user.
    Released,
}

impl DistributionStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::PartiallySubmitted => "PARTIALLY_SUBMITTED",
            Self::Submitted => "SUBMITTED",
            Self::PartiallyReleased => "PARTIALLY_RELEASED",
            Self::Released => "RELEASED",
        }
    }

    /// Derives the status from per-platform counts.
    ///
    /// Released counts take precedence over submitted counts.
    #[must_use]
    pub const fn from_counts(targets: usize, submitted: usize, released: usize) -> Self {
        if targets == 0 {
            return Self::Pending;
        }
        if released >= targets {
            return Self::Released;
        }
        if released > 0 {
            return Self::PartiallyReleased;
        }
        if submitted == 0 {
            Self::Pending
        } else if submitted < targets {
            Self::PartiallySubmitted
        } else {
            Self::Submitted
        }
    }
}

impl fmt::Display for DistributionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distribution state of one target platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformDistribution {
    /// Target platform.
    pub platform: Platform,
    /// Current submission, if any.
    pub submission_id: Option<SubmissionId>,
    /// Current submission status, if any.
    pub status: Option<SubmissionStatus>,
    /// Current submission version, if any.
    pub version_name: Option<VersionName>,
    /// Exposure reaching users; zero unless live or paused.
    pub exposure_percent: ExposurePercent,
    /// Whether the platform counts as submitted.
    pub is_submitted: bool,
    /// Whether the platform is live for every user.
    pub is_released: bool,
}

impl PlatformDistribution {
    fn from_current(platform: Platform, current: Option<&Submission>) -> Self {
        let Some(submission) = current else {
            return Self {
                platform,
                submission_id: None,
                status: None,
                version_name: None,
                exposure_percent: ExposurePercent::ZERO,
                is_submitted: false,
                is_released: false,
            };
        };
        let status = submission.status();
        let exposure_percent = if status.is_live_track() {
            submission.exposure_percent()
        } else {
            ExposurePercent::ZERO
        };
        Self {
            platform,
            submission_id: Some(submission.id()),
            status: Some(status),
            version_name: Some(submission.version_name().clone()),
            exposure_percent,
            is_submitted: !matches!(
                status,
                SubmissionStatus::Rejected | SubmissionStatus::Cancelled
            ),
            is_released: submission.is_released(),
        }
    }
}

/// Release-level distribution view, recomputed after every submission change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionSnapshot {
    /// Release identifier.
    pub release_id: ReleaseId,
    /// Aggregate status.
    pub release_status: DistributionStatus,
    /// Per-platform states in platform order.
    pub platforms: Vec<PlatformDistribution>,
    /// Mean exposure over the target platforms, rounded down.
    pub overall_progress: u8,
    /// Whether every target platform is fully released.
    pub is_complete: bool,
}

impl DistributionSnapshot {
    /// Derives the snapshot from the release's target set and submissions.
    ///
    /// Only the current submission of each platform counts: the latest
    /// submission nothing has superseded. Submissions for platforms outside
    /// the target set are ignored.
    #[must_use]
    pub fn derive(distribution: &ReleaseDistribution, submissions: &[Submission]) -> Self {
        let platforms: Vec<PlatformDistribution> = distribution
            .platforms()
            .iter()
            .map(|platform| {
                let current = submissions
                    .iter()
                    .filter(|submission| {
                        submission.platform() == *platform && submission.is_current()
                    })
                    .max_by_key(|submission| submission.submitted_at());
                PlatformDistribution::from_current(*platform, current)
            })
            .collect();

        let targets = platforms.len();
        let submitted = platforms.iter().filter(|entry| entry.is_submitted).count();
        let released = platforms.iter().filter(|entry| entry.is_released).count();
        let release_status = DistributionStatus::from_counts(targets, submitted, released);

        let exposure_sum: usize = platforms
            .iter()
            .map(|entry| usize::from(entry.exposure_percent.value()))
            .sum();
        let overall_progress = exposure_sum
            .checked_div(targets)
            .and_then(|mean| u8::try_from(mean).ok())
            .unwrap_or(0);

        Self {
            release_id: distribution.release_id(),
            release_status,
            platforms,
            overall_progress,
            is_complete: release_status == DistributionStatus::Released,
        }
    }

    /// Returns the entry for `platform`, if it is a target.
    #[must_use]
    pub fn platform(&self, platform: Platform) -> Option<&PlatformDistribution> {
        self.platforms.iter().find(|entry| entry.platform == platform)
    }
}
