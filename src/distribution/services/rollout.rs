//! Rollout control for released store submissions.
//!
//! Every command follows the same sequence under the submission's lock:
//! load, reject terminal submissions, verify the caller's precondition,
//! validate the change on a copy, call the store, then compare-and-swap the
//! stored record. Nothing is persisted unless the store accepted the change.

use super::{
    conflict::{ConflictResolver, PreconditionScope, RolloutConflict, RolloutPrecondition},
    remote::{StoreCallError, call_store},
    tracker::{SubmissionOutcome, load_snapshot},
};
use crate::config::EngineConfig;
use crate::distribution::{
    domain::{
        DistributionDomainError, ExposurePercent, HaltSeverity, RolloutSchedule, Submission,
        SubmissionId, SubmissionStatus,
    },
    ports::{
        DistributionRepository, DistributionRepositoryError, StoreClient, StoreClientResult,
        StoreOperation,
    },
};
use crate::release::ReleaseId;
use mockable::Clock;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by rollout commands.
#[derive(Debug, Error)]
pub enum RolloutError {
    /// The submission does not exist.
    #[error("submission not found: {0}")]
    NotFound(SubmissionId),

    /// Halted, rejected and cancelled submissions accept no rollout change.
    #[error("submission {submission_id} is {status} at {exposure_percent} and accepts no rollout changes")]
    TerminalStateViolation {
        /// Submission identifier.
        submission_id: SubmissionId,
        /// Current status.
        status: SubmissionStatus,
        /// Current exposure.
        exposure_percent: ExposurePercent,
    },

    /// The caller's observed state is out of date.
    #[error(transparent)]
    ConflictDetected(#[from] RolloutConflict),

    /// The change is not valid for the submission.
    #[error(transparent)]
    Domain(#[from] DistributionDomainError),

    /// The store call failed or timed out; nothing was changed.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreCallError),

    /// The owning release has no registered distribution.
    #[error("release {0} has no registered distribution")]
    ReleaseNotRegistered(ReleaseId),

    /// Persistence failed.
    #[error(transparent)]
    Repository(#[from] DistributionRepositoryError),
}

/// Result type for rollout commands.
pub type RolloutResult<T> = Result<T, RolloutError>;

/// Applies exposure changes, pauses, resumes and halts to live submissions.
#[derive(Clone)]
pub struct RolloutController<R, T, C>
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

impl<R, T, C> RolloutController<R, T, C>
where
    R: DistributionRepository,
    T: StoreClient,
    C: Clock + Send + Sync,
{
    /// Creates a controller with default configuration and its own locks.
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

    /// Shares locks with a submission tracker.
    #[must_use]
    pub fn with_conflict_resolver(mut self, resolver: ConflictResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Sets the exposure of a manually controlled rollout.
    ///
    /// A live rollout may only grow; requesting the current value changes
    /// nothing and makes no store call. A paused rollout resumes at
    /// `percent`, which may be lower than the frozen value.
    ///
    /// # Errors
    ///
    /// Returns [`RolloutError::ConflictDetected`] when the observed version
    /// or exposure is stale, [`RolloutError::TerminalStateViolation`] for
    /// terminal submissions, and [`RolloutError::Domain`] for decreases, zero,
    /// or store-phased schedules.
    pub async fn update_rollout(
        &self,
        id: SubmissionId,
        percent: ExposurePercent,
        precondition: &RolloutPrecondition,
    ) -> RolloutResult<SubmissionOutcome> {
        let _guard = self.resolver.lock_submission(id).await;
        let current = self
            .load_for_command(id, precondition, PreconditionScope::VersionAndExposure)
            .await?;
        if current.status() == SubmissionStatus::Live && current.exposure_percent() == percent {
            tracing::debug!(submission_id = %id, exposure = %percent, "rollout exposure unchanged");
            return self.outcome(current).await;
        }
        let mut next = current.clone();
        next.set_exposure(percent, &*self.clock)?;
        self.call(
            StoreOperation::SetExposure,
            id,
            self.store.set_exposure(&current, percent),
        )
        .await?;
        self.commit(&current, next).await
    }

    /// Freezes a live rollout at its current exposure.
    ///
    /// # Errors
    ///
    /// Returns [`RolloutError::Domain`] for a blank reason, a submission that
    /// is not live, or one already at full exposure, plus the conflict and
    /// terminal errors of [`Self::update_rollout`].
    pub async fn pause_rollout(
        &self,
        id: SubmissionId,
        reason: &str,
        precondition: &RolloutPrecondition,
    ) -> RolloutResult<SubmissionOutcome> {
        let _guard = self.resolver.lock_submission(id).await;
        let current = self
            .load_for_command(id, precondition, PreconditionScope::Version)
            .await?;
        let mut next = current.clone();
        next.pause(reason, &*self.clock)?;
        self.call(StoreOperation::Pause, id, self.store.pause(&current))
            .await?;
        self.commit(&current, next).await
    }

    /// Returns a paused rollout to live at its frozen exposure.
    ///
    /// # Errors
    ///
    /// Returns [`RolloutError::Domain`] unless the submission is paused, plus
    /// the conflict and terminal errors of [`Self::update_rollout`].
    pub async fn resume_rollout(
        &self,
        id: SubmissionId,
        precondition: &RolloutPrecondition,
    ) -> RolloutResult<SubmissionOutcome> {
        let _guard = self.resolver.lock_submission(id).await;
        let current = self
            .load_for_command(id, precondition, PreconditionScope::Version)
            .await?;
        let mut next = current.clone();
        next.resume(&*self.clock)?;
        self.call(StoreOperation::Resume, id, self.store.resume(&current))
            .await?;
        self.commit(&current, next).await
    }

    /// Stops the rollout of this version permanently.
    ///
    /// Only a new submission can distribute the platform again.
    ///
    /// # Errors
    ///
    /// Returns [`RolloutError::Domain`] for a blank reason or a submission
    /// outside the live track, plus the conflict and terminal errors of
    /// [`Self::update_rollout`].
    pub async fn halt_rollout(
        &self,
        id: SubmissionId,
        reason: &str,
        severity: HaltSeverity,
        precondition: &RolloutPrecondition,
    ) -> RolloutResult<SubmissionOutcome> {
        let _guard = self.resolver.lock_submission(id).await;
        let current = self
            .load_for_command(id, precondition, PreconditionScope::Version)
            .await?;
        let mut next = current.clone();
        next.halt(reason, severity, &*self.clock)?;
        self.call(StoreOperation::Halt, id, self.store.halt(&current))
            .await?;
        tracing::warn!(
            submission_id = %id,
            platform = %current.platform(),
            severity = %severity,
            exposure_at_halt = %current.exposure_percent(),
            "rollout halted"
        );
        self.commit(&current, next).await
    }

    /// Releases a live rollout to every user now.
    ///
    /// For store-phased schedules this is the only manual override.
    ///
    /// # Errors
    ///
    /// Returns [`RolloutError::Domain`] unless the submission is live below
    /// full exposure, plus the conflict and terminal errors of
    /// [`Self::update_rollout`].
    pub async fn complete_early(
        &self,
        id: SubmissionId,
        precondition: &RolloutPrecondition,
    ) -> RolloutResult<SubmissionOutcome> {
        let _guard = self.resolver.lock_submission(id).await;
        let current = self
            .load_for_command(id, precondition, PreconditionScope::VersionAndExposure)
            .await?;
        let mut next = current.clone();
        next.complete_early(&*self.clock)?;
        match current.schedule() {
            RolloutSchedule::StorePhased => {
                self.call(
                    StoreOperation::CompletePhasedRelease,
                    id,
                    self.store.complete_phased_release(&current),
                )
                .await?;
            }
            RolloutSchedule::Manual => {
                self.call(
                    StoreOperation::SetExposure,
                    id,
                    self.store.set_exposure(&current, ExposurePercent::FULL),
                )
                .await?;
            }
        }
        self.commit(&current, next).await
    }

    async fn load_for_command(
        &self,
        id: SubmissionId,
        precondition: &RolloutPrecondition,
        scope: PreconditionScope,
    ) -> RolloutResult<Submission> {
        let current = self
            .repository
            .find_submission(id)
            .await?
            .ok_or(RolloutError::NotFound(id))?;
        if current.status().is_terminal() {
            return Err(RolloutError::TerminalStateViolation {
                submission_id: id,
                status: current.status(),
                exposure_percent: current.exposure_percent(),
            });
        }
        if let Err(conflict) = ConflictResolver::verify(&current, precondition, scope) {
            tracing::info!(submission_id = %id, conflict = %conflict, "rollout command rejected");
            return Err(conflict.into());
        }
        Ok(current)
    }

    async fn call<V>(
        &self,
        operation: StoreOperation,
        id: SubmissionId,
        remote: impl Future<Output = StoreClientResult<V>>,
    ) -> RolloutResult<V> {
        Ok(call_store(self.config.store_call_timeout, operation, id, remote).await?)
    }

    async fn commit(
        &self,
        current: &Submission,
        next: Submission,
    ) -> RolloutResult<SubmissionOutcome> {
        match self
            .repository
            .update_submission(&next, current.revision())
            .await
        {
            Ok(()) => {}
            Err(DistributionRepositoryError::StaleRevision {
                submission_id,
                expected,
                actual,
            }) => {
                tracing::warn!(
                    submission_id = %submission_id,
                    expected,
                    actual,
                    "submission changed during rollout command"
                );
                let stored = self
                    .repository
                    .find_submission(submission_id)
                    .await?
                    .ok_or(RolloutError::NotFound(submission_id))?;
                return Err(RolloutConflict::concurrent_write(&stored, expected).into());
            }
            Err(err) => return Err(err.into()),
        }
        tracing::info!(
            submission_id = %next.id(),
            platform = %next.platform(),
            status = %next.status(),
            exposure = %next.exposure_percent(),
            "rollout updated"
        );
        self.outcome(next).await
    }

    async fn outcome(&self, submission: Submission) -> RolloutResult<SubmissionOutcome> {
        let release_id = submission.release_id();
        let distribution = load_snapshot(&*self.repository, release_id)
            .await?
            .ok_or(RolloutError::ReleaseNotRegistered(release_id))?;
        Ok(SubmissionOutcome {
            submission,
            distribution,
        })
    }
}
