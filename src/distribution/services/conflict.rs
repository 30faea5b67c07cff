//! Detection of conflicting concurrent rollout commands.
//!
//! Every mutation of a submission runs under that submission's async lock,
//! held from the precondition check through the remote store call to the
//! compare-and-swap write. Creating a submission locks its release platform
//! instead, so two uploads for the same platform cannot both become current.
//! Replacing an existing submission takes both locks, the platform lock first,
//! so no rollout command on the replaced record can interleave with it.

use crate::distribution::domain::{
    ExposurePercent, Submission, SubmissionId, SubmissionStatus, VersionName,
};
use crate::release::{Platform, ReleaseId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// State the caller observed when deciding on a rollout command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutPrecondition {
    version_name: VersionName,
    exposure_percent: ExposurePercent,
}

impl RolloutPrecondition {
    /// Creates a precondition from observed values.
    #[must_use]
    pub const fn new(version_name: VersionName, exposure_percent: ExposurePercent) -> Self {
        Self {
            version_name,
            exposure_percent,
        }
    }

    /// Captures the values of `submission` as currently observed.
    #[must_use]
    pub fn observed(submission: &Submission) -> Self {
        Self::new(
            submission.version_name().clone(),
            submission.exposure_percent(),
        )
    }

    /// Returns the observed version.
    #[must_use]
    pub const fn version_name(&self) -> &VersionName {
        &self.version_name
    }

    /// Returns the observed exposure.
    #[must_use]
    pub const fn exposure_percent(&self) -> ExposurePercent {
        self.exposure_percent
    }
}

/// Which observed values an operation depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionScope {
    /// Only the targeted version must be unchanged.
    Version,
    /// The targeted version and the exposure must be unchanged.
    VersionAndExposure,
}

/// A rollout command rejected because its precondition no longer holds.
///
/// Each variant carries the current server-side value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RolloutConflict {
    /// The targeted submission was replaced by a newer one.
    #[error("submission {submission_id} was superseded by {superseded_by}")]
    Superseded {
        /// Targeted submission.
        submission_id: SubmissionId,
        /// Current submission for the platform.
        superseded_by: SubmissionId,
    },

    /// The targeted submission carries another version.
    #[error("version conflict on submission {submission_id}: observed {observed}, current {current}")]
    Version {
        /// Targeted submission.
        submission_id: SubmissionId,
        /// Version the caller observed.
        observed: VersionName,
        /// Version currently stored.
        current: VersionName,
    },

    /// Another operator changed the exposure first.
    #[error("exposure conflict on submission {submission_id}: observed {observed}, current {current}")]
    Exposure {
        /// Targeted submission.
        submission_id: SubmissionId,
        /// Exposure the caller observed.
        observed: ExposurePercent,
        /// Exposure currently stored.
        current: ExposurePercent,
    },

    /// A writer outside this process stored the submission first.
    #[error(
        "submission {submission_id} changed concurrently: revision {expected} is now {actual}, \
         currently {status} on {version_name} at {exposure_percent}"
    )]
    ConcurrentWrite {
        /// Targeted submission.
        submission_id: SubmissionId,
        /// Revision read before the change.
        expected: u64,
        /// Revision currently stored.
        actual: u64,
        /// Version currently stored.
        version_name: VersionName,
        /// Exposure currently stored.
        exposure_percent: ExposurePercent,
        /// Status currently stored.
        status: SubmissionStatus,
    },
}

impl RolloutConflict {
    /// Describes a lost compare-and-swap from the record that won it.
    #[must_use]
    pub fn concurrent_write(current: &Submission, expected: u64) -> Self {
        Self::ConcurrentWrite {
            submission_id: current.id(),
            expected,
            actual: current.revision(),
            version_name: current.version_name().clone(),
            exposure_percent: current.exposure_percent(),
            status: current.status(),
        }
    }

    /// Returns the targeted submission.
    #[must_use]
    pub const fn submission_id(&self) -> SubmissionId {
        match self {
            Self::Superseded { submission_id, .. }
            | Self::Version { submission_id, .. }
            | Self::Exposure { submission_id, .. }
            | Self::ConcurrentWrite { submission_id, .. } => *submission_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LockKey {
    Submission(SubmissionId),
    Platform(ReleaseId, Platform),
}

/// Exclusive hold on a submission or release platform.
#[derive(Debug)]
pub struct RolloutGuard {
    _guard: OwnedMutexGuard<()>,
}

/// Serialises mutations per submission and verifies caller preconditions.
///
/// Clones share their locks, so a tracker and a controller built with the
/// same resolver exclude each other.
#[derive(Debug, Clone, Default)]
pub struct ConflictResolver {
    locks: Arc<Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>>,
}

impl ConflictResolver {
    /// Creates a resolver with no held locks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to a submission.
    pub async fn lock_submission(&self, submission_id: SubmissionId) -> RolloutGuard {
        self.acquire(LockKey::Submission(submission_id)).await
    }

    /// Waits for exclusive access to the submissions of one release platform.
    pub async fn lock_platform(&self, release_id: ReleaseId, platform: Platform) -> RolloutGuard {
        self.acquire(LockKey::Platform(release_id, platform)).await
    }

    async fn acquire(&self, key: LockKey) -> RolloutGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries nobody holds or awaits are only referenced by the map.
            locks.retain(|_, entry| Arc::strong_count(entry) > 1);
            Arc::clone(locks.entry(key).or_default())
        };
        RolloutGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Checks that `current` is still the version the caller targeted.
    ///
    /// # Errors
    ///
    /// Returns [`RolloutConflict::Superseded`] or [`RolloutConflict::Version`].
    pub fn verify_version(
        current: &Submission,
        observed: &VersionName,
    ) -> Result<(), RolloutConflict> {
        if let Some(superseded_by) = current.superseded_by() {
            return Err(RolloutConflict::Superseded {
                submission_id: current.id(),
                superseded_by,
            });
        }
        if current.version_name() != observed {
            return Err(RolloutConflict::Version {
                submission_id: current.id(),
                observed: observed.clone(),
                current: current.version_name().clone(),
            });
        }
        Ok(())
    }

    /// Checks the caller's precondition against the stored submission.
    ///
    /// # Errors
    ///
    /// Returns a [`RolloutConflict`] carrying the current value that no
    /// longer matches.
    pub fn verify(
        current: &Submission,
        precondition: &RolloutPrecondition,
        scope: PreconditionScope,
    ) -> Result<(), RolloutConflict> {
        Self::verify_version(current, precondition.version_name())?;
        if scope == PreconditionScope::VersionAndExposure
            && current.exposure_percent() != precondition.exposure_percent()
        {
            return Err(RolloutConflict::Exposure {
                submission_id: current.id(),
                observed: precondition.exposure_percent(),
                current: current.exposure_percent(),
            });
        }
        Ok(())
    }
}
