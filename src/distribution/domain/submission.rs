//! Store submission aggregate and its status types.

use super::{
    DistributionDomainError, ExposurePercent, PHASED_RELEASE_DAYS, ParseDistributionValueError,
    SubmissionId, VersionName, phased_exposure,
};
use crate::release::{Platform, ReleaseId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a store submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    /// Sent to the store, not yet picked up for review.
    Pending,
    /// Under store review.
    InReview,
    /// Approved by the store, not yet released.
    Approved,
    /// Released to some or all users.
    Live,
    /// Rollout paused at its current exposure.
    Paused,
    /// Rollout stopped for this version.
    Halted,
    /// Rejected by the store.
    Rejected,
    /// Withdrawn before release.
    Cancelled,
}

impl SubmissionStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InReview => "IN_REVIEW",
            Self::Approved => "APPROVED",
            Self::Live => "LIVE",
            Self::Paused => "PAUSED",
            Self::Halted => "HALTED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Returns whether the submission can no longer change for this version.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Halted | Self::Rejected | Self::Cancelled)
    }

    /// Returns whether the submission is released, paused or not.
    #[must_use]
    pub const fn is_live_track(self) -> bool {
        matches!(self, Self::Live | Self::Paused)
    }

    /// Returns whether transition to `target` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Pending,
                Self::InReview | Self::Approved | Self::Rejected | Self::Cancelled
            ) | (
                Self::InReview,
                Self::Approved | Self::Rejected | Self::Cancelled
            ) | (Self::Approved, Self::Live | Self::Rejected | Self::Cancelled)
                | (Self::Live, Self::Paused | Self::Halted)
                | (Self::Paused, Self::Live | Self::Halted)
        )
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SubmissionStatus {
    type Error = ParseDistributionValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "IN_REVIEW" => Ok(Self::InReview),
            "APPROVED" => Ok(Self::Approved),
            "LIVE" => Ok(Self::Live),
            "PAUSED" => Ok(Self::Paused),
            "HALTED" => Ok(Self::Halted),
            "REJECTED" => Ok(Self::Rejected),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(ParseDistributionValueError::new("submission status", value)),
        }
    }
}

/// Who drives the exposure of a live submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RolloutSchedule {
    /// Operators set the exposure.
    #[default]
    Manual,
    /// The store raises exposure on its own seven-day schedule.
    StorePhased,
}

impl RolloutSchedule {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::StorePhased => "STORE_PHASED",
        }
    }
}

impl fmt::Display for RolloutSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity attached to a rollout halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HaltSeverity {
    /// Minor issue.
    Low,
    /// Noticeable issue.
    Medium,
    /// Serious issue.
    High,
    /// Crash or data-loss class issue.
    Critical,
}

impl HaltSeverity {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for HaltSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for HaltSeverity {
    type Error = ParseDistributionValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(ParseDistributionValueError::new("halt severity", value)),
        }
    }
}

/// Why and when a rollout was halted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaltRecord {
    /// Operator-supplied reason.
    pub reason: String,
    /// Operator-supplied severity.
    pub severity: HaltSeverity,
    /// Exposure at the moment of the halt.
    pub exposure_at_halt: ExposurePercent,
    /// Halt timestamp.
    pub halted_at: DateTime<Utc>,
}

/// Parameter object for creating a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    /// Owning release.
    pub release_id: ReleaseId,
    /// Target platform.
    pub platform: Platform,
    /// Submitted version.
    pub version_name: VersionName,
    /// Exposure schedule once live.
    pub schedule: RolloutSchedule,
    /// Submission this one replaces, if any.
    pub supersedes: Option<SubmissionId>,
}

/// Store submission aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    id: SubmissionId,
    release_id: ReleaseId,
    platform: Platform,
    version_name: VersionName,
    status: SubmissionStatus,
    exposure_percent: ExposurePercent,
    schedule: RolloutSchedule,
    rollout_day: Option<u8>,
    pause_reason: Option<String>,
    halt: Option<HaltRecord>,
    rejection_reason: Option<String>,
    supersedes: Option<SubmissionId>,
    superseded_by: Option<SubmissionId>,
    revision: u64,
    submitted_at: DateTime<Utc>,
    released_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSubmissionData {
    /// Persisted submission identifier.
    pub id: SubmissionId,
    /// Persisted release identifier.
    pub release_id: ReleaseId,
    /// Persisted platform.
    pub platform: Platform,
    /// Persisted version name.
    pub version_name: VersionName,
    /// Persisted status.
    pub status: SubmissionStatus,
    /// Persisted exposure.
    pub exposure_percent: ExposurePercent,
    /// Persisted rollout schedule.
    pub schedule: RolloutSchedule,
    /// Persisted phased rollout day, if any.
    pub rollout_day: Option<u8>,
    /// Persisted pause reason, if any.
    pub pause_reason: Option<String>,
    /// Persisted halt record, if any.
    pub halt: Option<HaltRecord>,
    /// Persisted rejection reason, if any.
    pub rejection_reason: Option<String>,
    /// Persisted predecessor link, if any.
    pub supersedes: Option<SubmissionId>,
    /// Persisted successor link, if any.
    pub superseded_by: Option<SubmissionId>,
    /// Persisted revision counter.
    pub revision: u64,
    /// Persisted submission timestamp.
    pub submitted_at: DateTime<Utc>,
    /// Persisted full-release timestamp, if any.
    pub released_at: Option<DateTime<Utc>>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

fn required_reason(
    value: impl Into<String>,
    name: &'static str,
) -> Result<String, DistributionDomainError> {
    let raw = value.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DistributionDomainError::EmptyValue(name));
    }
    Ok(trimmed.to_owned())
}

impl Submission {
    /// Creates a `PENDING` submission.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionDomainError::PhasedScheduleUnsupported`] when a
    /// store-phased schedule is requested for a platform without one.
    pub fn new(data: NewSubmission, clock: &impl Clock) -> Result<Self, DistributionDomainError> {
        if data.schedule == RolloutSchedule::StorePhased && data.platform != Platform::Ios {
            return Err(DistributionDomainError::PhasedScheduleUnsupported(
                data.platform,
            ));
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: SubmissionId::new(),
            release_id: data.release_id,
            platform: data.platform,
            version_name: data.version_name,
            status: SubmissionStatus::Pending,
            exposure_percent: ExposurePercent::ZERO,
            schedule: data.schedule,
            rollout_day: None,
            pause_reason: None,
            halt: None,
            rejection_reason: None,
            supersedes: data.supersedes,
            superseded_by: None,
            revision: 0,
            submitted_at: timestamp,
            released_at: None,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a submission from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedSubmissionData) -> Self {
        Self {
            id: data.id,
            release_id: data.release_id,
            platform: data.platform,
            version_name: data.version_name,
            status: data.status,
            exposure_percent: data.exposure_percent,
            schedule: data.schedule,
            rollout_day: data.rollout_day,
            pause_reason: data.pause_reason,
            halt: data.halt,
            rejection_reason: data.rejection_reason,
            supersedes: data.supersedes,
            superseded_by: data.superseded_by,
            revision: data.revision,
            submitted_at: data.submitted_at,
            released_at: data.released_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the submission identifier.
    #[must_use]
    pub const fn id(&self) -> SubmissionId {
        self.id
    }

    /// Returns the owning release.
    #[must_use]
    pub const fn release_id(&self) -> ReleaseId {
        self.release_id
    }

    /// Returns the target platform.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Returns the submitted version.
    #[must_use]
    pub const fn version_name(&self) -> &VersionName {
        &self.version_name
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> SubmissionStatus {
        self.status
    }

    /// Returns the current exposure.
    #[must_use]
    pub const fn exposure_percent(&self) -> ExposurePercent {
        self.exposure_percent
    }

    /// Returns the rollout schedule.
    #[must_use]
    pub const fn schedule(&self) -> RolloutSchedule {
        self.schedule
    }

    /// Returns the phased rollout day, if the store schedule has started.
    #[must_use]
    pub const fn rollout_day(&self) -> Option<u8> {
        self.rollout_day
    }

    /// Returns the pause reason while paused.
    #[must_use]
    pub fn pause_reason(&self) -> Option<&str> {
        self.pause_reason.as_deref()
    }

    /// Returns the halt record, if halted.
    #[must_use]
    pub const fn halt_record(&self) -> Option<&HaltRecord> {
        self.halt.as_ref()
    }

    /// Returns the store's rejection reason, if rejected.
    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// Returns the submission this one replaced, if any.
    #[must_use]
    pub const fn supersedes(&self) -> Option<SubmissionId> {
        self.supersedes
    }

    /// Returns the submission that replaced this one, if any.
    #[must_use]
    pub const fn superseded_by(&self) -> Option<SubmissionId> {
        self.superseded_by
    }

    /// Returns the revision counter, bumped on every mutation.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the submission timestamp.
    #[must_use]
    pub const fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Returns when exposure first reached every user.
    #[must_use]
    pub const fn released_at(&self) -> Option<DateTime<Utc>> {
        self.released_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether no newer submission replaced this one.
    #[must_use]
    pub const fn is_current(&self) -> bool {
        self.superseded_by.is_none()
    }

    /// Returns whether the submission is live for every user.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        matches!(self.status, SubmissionStatus::Live) && self.exposure_percent.is_full()
    }

    /// Records that the store picked the submission up for review.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionDomainError::InvalidTransition`] unless the
    /// submission is `PENDING`.
    pub fn mark_in_review(&mut self, clock: &impl Clock) -> Result<(), DistributionDomainError> {
        self.transition_to(SubmissionStatus::InReview)?;
        self.touch(clock);
        Ok(())
    }

    /// Records store approval.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionDomainError::InvalidTransition`] unless the
    /// submission is `PENDING` or `IN_REVIEW`.
    pub fn mark_approved(&mut self, clock: &impl Clock) -> Result<(), DistributionDomainError> {
        self.transition_to(SubmissionStatus::Approved)?;
        self.touch(clock);
        Ok(())
    }

    /// Releases an approved submission.
    ///
    /// Manual schedules go live at `exposure`. Store-phased schedules start on
    /// day one of the store schedule and ignore `exposure`.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionDomainError::ZeroExposure`] for a manual release
    /// at zero percent, or [`DistributionDomainError::InvalidTransition`]
    /// unless the submission is `APPROVED`.
    pub fn mark_live(
        &mut self,
        exposure: ExposurePercent,
        clock: &impl Clock,
    ) -> Result<(), DistributionDomainError> {
        let (initial, day) = match self.schedule {
            RolloutSchedule::Manual => {
                if exposure == ExposurePercent::ZERO {
                    return Err(DistributionDomainError::ZeroExposure);
                }
                (exposure, None)
            }
            RolloutSchedule::StorePhased => (phased_exposure(1)?, Some(1)),
        };
        self.transition_to(SubmissionStatus::Live)?;
        self.exposure_percent = initial;
        self.rollout_day = day;
        self.record_release_if_full(clock);
        self.touch(clock);
        Ok(())
    }

    /// Records a store rejection.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionDomainError::ResubmissionRequired`] once the
    /// submission has been released, [`DistributionDomainError::EmptyValue`]
    /// for a blank reason, or [`DistributionDomainError::InvalidTransition`]
    /// from other terminal states.
    pub fn mark_rejected(
        &mut self,
        reason: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), DistributionDomainError> {
        if matches!(
            self.status,
            SubmissionStatus::Live | SubmissionStatus::Paused | SubmissionStatus::Halted
        ) {
            return Err(DistributionDomainError::ResubmissionRequired {
                submission_id: self.id,
                status: self.status,
            });
        }
        let text = required_reason(reason, "rejection reason")?;
        self.transition_to(SubmissionStatus::Rejected)?;
        self.rejection_reason = Some(text);
        self.touch(clock);
        Ok(())
    }

    /// Withdraws an unreleased submission.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionDomainError::InvalidTransition`] once released
    /// or terminal.
    pub fn cancel(&mut self, clock: &impl Clock) -> Result<(), DistributionDomainError> {
        self.transition_to(SubmissionStatus::Cancelled)?;
        self.touch(clock);
        Ok(())
    }

    /// Sets a manual exposure.
    ///
    /// A live submission may only grow. A paused submission resumes at
    /// `percent`, which may be lower than the frozen value.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionDomainError::PhasedRolloutManaged`] for
    /// store-phased schedules, [`DistributionDomainError::ZeroExposure`],
    /// [`DistributionDomainError::ExposureDecrease`], or
    /// [`DistributionDomainError::InvalidTransition`] outside the live track.
    pub fn set_exposure(
        &mut self,
        percent: ExposurePercent,
        clock: &impl Clock,
    ) -> Result<(), DistributionDomainError> {
        self.ensure_current()?;
        if self.schedule == RolloutSchedule::StorePhased {
            return Err(DistributionDomainError::PhasedRolloutManaged {
                submission_id: self.id,
            });
        }
        if percent == ExposurePercent::ZERO {
            return Err(DistributionDomainError::ZeroExposure);
        }
        match self.status {
            SubmissionStatus::Live => {
                if percent < self.exposure_percent {
                    return Err(DistributionDomainError::ExposureDecrease {
                        submission_id: self.id,
                        current: self.exposure_percent,
                        requested: percent,
                    });
                }
            }
            SubmissionStatus::Paused => {
                self.transition_to(SubmissionStatus::Live)?;
                self.pause_reason = None;
            }
            other => {
                return Err(DistributionDomainError::InvalidTransition {
                    submission_id: self.id,
                    from: other,
                    to: SubmissionStatus::Live,
                });
            }
        }
        self.exposure_percent = percent;
        self.record_release_if_full(clock);
        self.touch(clock);
        Ok(())
    }

    /// Freezes the rollout at its current exposure.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionDomainError::EmptyValue`] for a blank reason,
    /// [`DistributionDomainError::InvalidTransition`] unless `LIVE`, or
    /// [`DistributionDomainError::RolloutComplete`] at full exposure.
    pub fn pause(
        &mut self,
        reason: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), DistributionDomainError> {
        let text = required_reason(reason, "pause reason")?;
        if self.status == SubmissionStatus::Live && self.exposure_percent.is_full() {
            return Err(DistributionDomainError::RolloutComplete {
                submission_id: self.id,
            });
        }
        self.transition_to(SubmissionStatus::Paused)?;
        self.pause_reason = Some(text);
        self.touch(clock);
        Ok(())
    }

    /// Returns a paused rollout to `LIVE` at the frozen exposure.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionDomainError::InvalidTransition`] unless `PAUSED`.
    pub fn resume(&mut self, clock: &impl Clock) -> Result<(), DistributionDomainError> {
        if self.status != SubmissionStatus::Paused {
            return Err(DistributionDomainError::InvalidTransition {
                submission_id: self.id,
                from: self.status,
                to: SubmissionStatus::Live,
            });
        }
        self.transition_to(SubmissionStatus::Live)?;
        self.pause_reason = None;
        self.touch(clock);
        Ok(())
    }

    /// Stops the rollout of this version for good.
    ///
    /// Exposure drops to zero; the previous value is kept in the halt record.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionDomainError::EmptyValue`] for a blank reason or
    /// [`DistributionDomainError::InvalidTransition`] outside the live track.
    pub fn halt(
        &mut self,
        reason: impl Into<String>,
        severity: HaltSeverity,
        clock: &impl Clock,
    ) -> Result<(), DistributionDomainError> {
        let text = required_reason(reason, "halt reason")?;
        self.transition_to(SubmissionStatus::Halted)?;
        self.halt = Some(HaltRecord {
            reason: text,
            severity,
            exposure_at_halt: self.exposure_percent,
            halted_at: clock.utc(),
        });
        self.exposure_percent = ExposurePercent::ZERO;
        self.pause_reason = None;
        self.touch(clock);
        Ok(())
    }

    /// Raises a live rollout straight to every user.
    ///
    /// This is the only manual override for store-phased schedules.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionDomainError::InvalidTransition`] unless `LIVE`,
    /// or [`DistributionDomainError::RolloutComplete`] at full exposure.
    pub fn complete_early(&mut self, clock: &impl Clock) -> Result<(), DistributionDomainError> {
        self.ensure_current()?;
        self.ensure_live()?;
        if self.exposure_percent.is_full() {
            return Err(DistributionDomainError::RolloutComplete {
                submission_id: self.id,
            });
        }
        self.exposure_percent = ExposurePercent::FULL;
        if self.schedule == RolloutSchedule::StorePhased {
            self.rollout_day = Some(PHASED_RELEASE_DAYS);
        }
        self.record_release_if_full(clock);
        self.touch(clock);
        Ok(())
    }

    /// Applies the exposure the store reports for `day` of its schedule.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionDomainError::NotPhased`] for manual schedules,
    /// [`DistributionDomainError::InvalidTransition`] unless `LIVE`,
    /// [`DistributionDomainError::InvalidRolloutDay`] outside `1..=7`, or
    /// [`DistributionDomainError::RolloutDayRegression`] for an earlier day.
    pub fn advance_phased_day(
        &mut self,
        day: u8,
        clock: &impl Clock,
    ) -> Result<(), DistributionDomainError> {
        self.ensure_current()?;
        if self.schedule != RolloutSchedule::StorePhased {
            return Err(DistributionDomainError::NotPhased {
                submission_id: self.id,
            });
        }
        self.ensure_live()?;
        let exposure = phased_exposure(day)?;
        let current = self.rollout_day.unwrap_or(1);
        if day < current {
            return Err(DistributionDomainError::RolloutDayRegression {
                current,
                requested: day,
            });
        }
        self.rollout_day = Some(day);
        self.exposure_percent = exposure;
        self.record_release_if_full(clock);
        self.touch(clock);
        Ok(())
    }

    /// Links this submission to the submission replacing it.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionDomainError::Superseded`] when already replaced.
    pub fn mark_superseded(
        &mut self,
        replacement: SubmissionId,
        clock: &impl Clock,
    ) -> Result<(), DistributionDomainError> {
        self.ensure_current()?;
        self.superseded_by = Some(replacement);
        self.touch(clock);
        Ok(())
    }

    fn ensure_current(&self) -> Result<(), DistributionDomainError> {
        match self.superseded_by {
            Some(superseded_by) => Err(DistributionDomainError::Superseded {
                submission_id: self.id,
                superseded_by,
            }),
            None => Ok(()),
        }
    }

    fn ensure_live(&self) -> Result<(), DistributionDomainError> {
        if self.status == SubmissionStatus::Live {
            return Ok(());
        }
        Err(DistributionDomainError::InvalidTransition {
            submission_id: self.id,
            from: self.status,
            to: SubmissionStatus::Live,
        })
    }

    fn transition_to(&mut self, target: SubmissionStatus) -> Result<(), DistributionDomainError> {
        self.ensure_current()?;
        if !self.status.can_transition_to(target) {
            return Err(DistributionDomainError::InvalidTransition {
                submission_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }

    fn record_release_if_full(&mut self, clock: &impl Clock) {
        if self.exposure_percent.is_full() && self.released_at.is_none() {
            self.released_at = Some(clock.utc());
        }
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
        self.revision = self.revision.saturating_add(1);
    }
}
