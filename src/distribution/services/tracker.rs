//! Store submission lifecycle tracking.
//!
//! The tracker owns every submission transition driven by the store (review,
//! approval, release, rejection, phased schedule progress) and by operators
//! creating or withdrawing submissions. Each mutation returns the updated
//! submission together with the recomputed release distribution.

use super::{
    conflict::{ConflictResolver, RolloutConflict, RolloutGuard},
    remote::{StoreCallError, call_store},
};
use crate::config::EngineConfig;
use crate::distribution::{
    domain::{
        DistributionDomainError, DistributionSnapshot, ExposurePercent, NewSubmission,
        ReleaseDistribution, RolloutSchedule, Submission, SubmissionId, SubmissionStatus,
        VersionName,
    },
    ports::{
        DistributionRepository, DistributionRepositoryError, DistributionRepositoryResult,
        StoreClient, StoreOperation,
    },
};
use crate::release::{Platform, ReleaseId};
use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for submission tracking.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] DistributionDomainError),

    /// The release has no registered target platforms.
    #[error("release {0} has no registered distribution")]
    ReleaseNotRegistered(ReleaseId),

    /// The platform is not a target of the release.
    #[error("release {release_id} does not target {platform}")]
    PlatformNotTargeted {
        /// Release identifier.
        release_id: ReleaseId,
        /// Requested platform.
        platform: Platform,
    },

    /// The platform already has a submission in flight or on sale.
    #[error("{platform} already has active submission {submission_id} ({status})")]
    ActiveSubmissionExists {
        /// Requested platform.
        platform: Platform,
        /// Current submission.
        submission_id: SubmissionId,
        /// Current submission status.
        status: SubmissionStatus,
    },

    /// The submission is still under review and can be cancelled instead.
    #[error("submission {submission_id} cannot be resubmitted while {status}")]
    ResubmissionNotAllowed {
        /// Submission identifier.
        submission_id: SubmissionId,
        /// Current status.
        status: SubmissionStatus,
    },

    /// The submission does not exist.
    #[error("submission not found: {0}")]
    NotFound(SubmissionId),

    /// The caller targeted a version that is no longer current.
    #[error(transparent)]
    Conflict(#[from] RolloutConflict),

    /// The store call failed or timed out.
    #[error(transparent)]
    Store(#[from] StoreCallError),

    /// Persistence failed.
    #[error(transparent)]
    Repository(#[from] DistributionRepositoryError),
}

/// Result type for submission tracking operations.
pub type SubmissionResult<T> = Result<T, SubmissionError>;

/// A submission after a mutation, with the recomputed release distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    /// Updated submission.
    pub submission: Submission,
    /// Distribution of the owning release.
    pub distribution: DistributionSnapshot,
}

/// Request payload for a store submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    release_id: ReleaseId,
    platform: Platform,
    version_name: String,
    schedule: RolloutSchedule,
}

impl SubmitRequest {
    /// Creates a request for a manually controlled rollout.
    #[must_use]
    pub fn new(release_id: ReleaseId, platform: Platform, version_name: impl Into<String>) -> Self {
        Self {
            release_id,
            platform,
            version_name: version_name.into(),
            schedule: RolloutSchedule::Manual,
        }
    }

    /// Selects the rollout schedule.
    #[must_use]
    pub const fn with_schedule(mut self, schedule: RolloutSchedule) -> Self {
        self.schedule = schedule;
        self
    }
}

pub(super) async fn load_snapshot<R>(
    repository: &R,
    release_id: ReleaseId,
) -> DistributionRepositoryResult<Option<DistributionSnapshot>>
where
    R: DistributionRepository + ?Sized,
{
    let Some(distribution) = repository.find_release(release_id).await? else {
        return Ok(None);
    };
    let submissions = repository.list_submissions(release_id).await?;
    Ok(Some(DistributionSnapshot::derive(&distribution, &submissions)))
}

/// Tracks store submissions and the release distribution they add up to.
#[derive(Clone)]
pub struct SubmissionTracker<R, T, C>
where
    R: DistributionRepository,
    T: StoreClient,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    store: Arc<T>,
    clock: Arc<C>,
    resolver: ConflictResolver,
    config: EngineConfig,
}

impl<R, T, C> SubmissionTracker<R, T, C>
where
    R: DistributionRepository,
    T: StoreClient,
    C: Clock + Send + Sync,
{
    /// Creates a tracker with default configuration and its own locks.
    #[must_use]
    pub fn new(repository: Arc<R>, store: Arc<T>, clock: Arc<C>) -> Self {
        Self {
            repository,
            store,
            clock,
            resolver: ConflictResolver::new(),
            config: EngineConfig::default(),
        }
    }

    /// Replaces the engine configuration.
    #[must_use]
    pub const fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Shares locks with a rollout controller.
    #[must_use]
    pub fn with_conflict_resolver(mut self, resolver: ConflictResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Registers the platforms a release is distributed to.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::Domain`] for an empty or duplicated
    /// platform list, or [`SubmissionError::Repository`] when the release is
    /// already registered.
    pub async fn register_release(
        &self,
        release_id: ReleaseId,
        platforms: &[Platform],
    ) -> SubmissionResult<ReleaseDistribution> {
        let distribution = ReleaseDistribution::new(release_id, platforms.iter().copied())?;
        self.repository.register_release(&distribution).await?;
        tracing::info!(
            release_id = %release_id,
            platforms = distribution.platforms().len(),
            "release distribution registered"
        );
        Ok(distribution)
    }

    /// Uploads a version to the store for one target platform.
    ///
    /// A terminal current submission (rejected, cancelled, halted) is
    /// superseded by the new one; an active one blocks the upload.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError`] when the release or platform is unknown,
    /// an active submission exists, validation fails, the store call fails,
    /// or persistence fails.
    pub async fn submit(&self, request: SubmitRequest) -> SubmissionResult<SubmissionOutcome> {
        let version_name = VersionName::new(request.version_name)?;
        let distribution = self.release(request.release_id).await?;
        if !distribution.targets(request.platform) {
            return Err(SubmissionError::PlatformNotTargeted {
                release_id: request.release_id,
                platform: request.platform,
            });
        }

        let _platform_guard = self
            .resolver
            .lock_platform(request.release_id, request.platform)
            .await;
        let listed = self
            .current_submission(request.release_id, request.platform)
            .await?;
        let (_submission_guard, current) = self.lock_current(listed).await?;
        if let Some(active) = current.as_ref().filter(|sub| !sub.status().is_terminal()) {
            return Err(SubmissionError::ActiveSubmissionExists {
                platform: request.platform,
                submission_id: active.id(),
                status: active.status(),
            });
        }
        self.create(
            &distribution,
            request.platform,
            version_name,
            request.schedule,
            current,
        )
        .await
    }

    /// Creates a new submission replacing `previous_id`.
    ///
    /// The previous record is kept for audit and linked to its replacement.
    /// `observed_version` is the version the caller believes is current.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::Conflict`] when the previous submission was
    /// already replaced or carries another version, and
    /// [`SubmissionError::ResubmissionNotAllowed`] while it is still awaiting
    /// review.
    pub async fn resubmit(
        &self,
        previous_id: SubmissionId,
        version_name: impl Into<String>,
        observed_version: &VersionName,
    ) -> SubmissionResult<SubmissionOutcome> {
        let new_version = VersionName::new(version_name)?;
        let located = self.load(previous_id).await?;
        let _platform_guard = self
            .resolver
            .lock_platform(located.release_id(), located.platform())
            .await;
        let _submission_guard = self.resolver.lock_submission(previous_id).await;
        let previous = self.load(previous_id).await?;
        ConflictResolver::verify_version(&previous, observed_version)?;
        if matches!(
            previous.status(),
            SubmissionStatus::Pending | SubmissionStatus::InReview | SubmissionStatus::Approved
        ) {
            return Err(SubmissionError::ResubmissionNotAllowed {
                submission_id: previous.id(),
                status: previous.status(),
            });
        }
        let distribution = self.release(previous.release_id()).await?;
        let platform = previous.platform();
        let schedule = previous.schedule();
        self.create(&distribution, platform, new_version, schedule, Some(previous))
            .await
    }

    /// Records that the store started reviewing the submission.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError`] when the submission is missing, the
    /// transition is invalid, or persistence fails.
    pub async fn mark_in_review(&self, id: SubmissionId) -> SubmissionResult<SubmissionOutcome> {
        self.apply(id, |submission, clock| submission.mark_in_review(clock))
            .await
    }

    /// Records store approval.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError`] when the submission is missing, the
    /// transition is invalid, or persistence fails.
    pub async fn mark_approved(&self, id: SubmissionId) -> SubmissionResult<SubmissionOutcome> {
        self.apply(id, |submission, clock| submission.mark_approved(clock))
            .await
    }

    /// Records the release of an approved submission.
    ///
    /// Store-phased submissions start on day one of the store schedule.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError`] when the submission is missing, the
    /// exposure or transition is invalid, or persistence fails.
    pub async fn mark_live(
        &self,
        id: SubmissionId,
        exposure: ExposurePercent,
    ) -> SubmissionResult<SubmissionOutcome> {
        self.apply(id, |submission, clock| submission.mark_live(exposure, clock))
            .await
    }

    /// Records a store rejection.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::Domain`] wrapping
    /// [`DistributionDomainError::ResubmissionRequired`] once the submission
    /// has been released; use [`Self::resubmit`] instead.
    pub async fn mark_rejected(
        &self,
        id: SubmissionId,
        reason: &str,
    ) -> SubmissionResult<SubmissionOutcome> {
        self.apply(id, |submission, clock| submission.mark_rejected(reason, clock))
            .await
    }

    /// Withdraws an unreleased submission from the store.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError`] when the submission is missing or already
    /// released, the store call fails, or persistence fails.
    pub async fn cancel(&self, id: SubmissionId) -> SubmissionResult<SubmissionOutcome> {
        let _guard = self.resolver.lock_submission(id).await;
        let current = self.load(id).await?;
        let mut next = current.clone();
        next.cancel(&*self.clock)?;
        call_store(
            self.config.store_call_timeout,
            StoreOperation::Cancel,
            id,
            self.store.cancel(&current),
        )
        .await?;
        self.commit(&current, next).await
    }

    /// Applies the store's reported phased rollout day.
    ///
    /// Reporting the day already recorded changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::Domain`] for manual schedules, days outside
    /// the schedule, or a day earlier than the recorded one.
    pub async fn sync_phased_day(
        &self,
        id: SubmissionId,
        day: u8,
    ) -> SubmissionResult<SubmissionOutcome> {
        let _guard = self.resolver.lock_submission(id).await;
        let current = self.load(id).await?;
        if current.schedule() == RolloutSchedule::StorePhased && current.rollout_day() == Some(day)
        {
            return self.outcome(current).await;
        }
        let mut next = current.clone();
        next.advance_phased_day(day, &*self.clock)?;
        self.commit(&current, next).await
    }

    /// Computes the release distribution from the current submissions.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::ReleaseNotRegistered`] for unknown
    /// releases or [`SubmissionError::Repository`] when loading fails.
    pub async fn get_distribution_status(
        &self,
        release_id: ReleaseId,
    ) -> SubmissionResult<DistributionSnapshot> {
        load_snapshot(&*self.repository, release_id)
            .await?
            .ok_or(SubmissionError::ReleaseNotRegistered(release_id))
    }

    async fn create(
        &self,
        distribution: &ReleaseDistribution,
        platform: Platform,
        version_name: VersionName,
        schedule: RolloutSchedule,
        previous: Option<Submission>,
    ) -> SubmissionResult<SubmissionOutcome> {
        let mut submission = Submission::new(
            NewSubmission {
                release_id: distribution.release_id(),
                platform,
                version_name,
                schedule,
                supersedes: previous.as_ref().map(Submission::id),
            },
            &*self.clock,
        )?;
        let receipt = call_store(
            self.config.store_call_timeout,
            StoreOperation::Submit,
            submission.id(),
            self.store.submit(&submission),
        )
        .await?;
        if receipt.in_review {
            submission.mark_in_review(&*self.clock)?;
        }

        match previous {
            Some(mut replaced) => {
                let expected = replaced.revision();
                replaced.mark_superseded(submission.id(), &*self.clock)?;
                self.repository
                    .supersede(&replaced, expected, &submission)
                    .await?;
            }
            None => self.repository.store_submission(&submission).await?,
        }

        tracing::info!(
            submission_id = %submission.id(),
            release_id = %submission.release_id(),
            platform = %platform,
            version = %submission.version_name(),
            status = %submission.status(),
            supersedes = ?submission.supersedes(),
            "store submission created"
        );
        self.outcome(submission).await
    }

    /// Locks the listed current submission and reloads it under the lock.
    ///
    /// Callers already hold the platform lock; the submission lock is always
    /// taken second.
    async fn lock_current(
        &self,
        listed: Option<Submission>,
    ) -> SubmissionResult<(Option<RolloutGuard>, Option<Submission>)> {
        let Some(found) = listed else {
            return Ok((None, None));
        };
        let guard = self.resolver.lock_submission(found.id()).await;
        let reloaded = self.load(found.id()).await?;
        Ok((Some(guard), Some(reloaded)))
    }

    async fn apply<F>(&self, id: SubmissionId, change: F) -> SubmissionResult<SubmissionOutcome>
    where
        F: FnOnce(&mut Submission, &C) -> Result<(), DistributionDomainError> + Send,
    {
        let _guard = self.resolver.lock_submission(id).await;
        let current = self.load(id).await?;
        let mut next = current.clone();
        change(&mut next, &*self.clock)?;
        self.commit(&current, next).await
    }

    async fn commit(
        &self,
        current: &Submission,
        next: Submission,
    ) -> SubmissionResult<SubmissionOutcome> {
        match self
            .repository
            .update_submission(&next, current.revision())
            .await
        {
            Ok(()) => {}
            Err(DistributionRepositoryError::StaleRevision {
                submission_id,
                expected,
                ..
            }) => {
                let stored = self.load(submission_id).await?;
                return Err(RolloutConflict::concurrent_write(&stored, expected).into());
            }
            Err(err) => return Err(err.into()),
        }
        tracing::info!(
            submission_id = %next.id(),
            platform = %next.platform(),
            from = %current.status(),
            to = %next.status(),
            exposure = %next.exposure_percent(),
            "store submission updated"
        );
        self.outcome(next).await
    }

    async fn outcome(&self, submission: Submission) -> SubmissionResult<SubmissionOutcome> {
        let distribution = self.get_distribution_status(submission.release_id()).await?;
        Ok(SubmissionOutcome {
            submission,
            distribution,
        })
    }

    async fn release(&self, release_id: ReleaseId) -> SubmissionResult<ReleaseDistribution> {
        self.repository
            .find_release(release_id)
            .await?
            .ok_or(SubmissionError::ReleaseNotRegistered(release_id))
    }

    async fn load(&self, id: SubmissionId) -> SubmissionResult<Submission> {
        self.repository
            .find_submission(id)
            .await?
            .ok_or(SubmissionError::NotFound(id))
    }

    async fn current_submission(
        &self,
        release_id: ReleaseId,
        platform: Platform,
    ) -> SubmissionResult<Option<Submission>> {
        let submissions = self.repository.list_submissions(release_id).await?;
        Ok(submissions
            .into_iter()
            .filter(|submission| submission.platform() == platform && submission.is_current())
            .max_by_key(Submission::submitted_at))
    }
}
