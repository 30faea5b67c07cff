//! Build aggregate root and workflow/upload status types.

use super::{
    BuildDomainError, BuildId, BuildTarget, CiProviderType, ParseBuildValueError, QueueLocation,
    RunId, TaskId,
};
use crate::release::{Platform, ReleaseId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow status of a build on its CI/CD provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    /// Queued on the provider, not yet executing.
    Pending,
    /// Executing on the provider.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished unsuccessfully or cancelled.
    Failed,
}

impl WorkflowStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// Returns whether no further workflow transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns whether transition to `target` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Running | Self::Failed)
                | (Self::Running, Self::Completed | Self::Failed)
        )
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for WorkflowStatus {
    type Error = ParseBuildValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "RUNNING" => Ok(Self::Running),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(ParseBuildValueError::new("workflow status", value)),
        }
    }
}

/// Artifact upload status, owned by the upload collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadStatus {
    /// No artifact has been uploaded yet.
    Pending,
    /// The artifact has been uploaded.
    Uploaded,
    /// The artifact will never be uploaded.
    Failed,
}

impl UploadStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Uploaded => "UPLOADED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter object for creating a build after a successful trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBuild {
    /// Owning release.
    pub release_id: ReleaseId,
    /// Target platform.
    pub platform: Platform,
    /// Target within the platform.
    pub target: BuildTarget,
    /// Provider running the workflow.
    pub provider_type: CiProviderType,
    /// Queue handle returned by the trigger call.
    pub queue_location: QueueLocation,
    /// Optional release task fed by this build.
    pub task_id: Option<TaskId>,
}

/// Workflow fields written by one reconciliation step.
///
/// Persisting a transition touches only the workflow status, the run handle
/// and the update timestamp (plus the upload status when the workflow
/// fails), so fields owned by other writers survive a concurrent update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowTransition {
    /// Build identifier.
    pub build_id: BuildId,
    /// Workflow status the transition was computed from.
    pub expected: WorkflowStatus,
    /// Workflow status to write.
    pub status: WorkflowStatus,
    /// Run handle recorded by the transition, if any.
    pub run_id: Option<RunId>,
    /// Time the transition was made.
    pub occurred_at: DateTime<Utc>,
}

/// Build aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    id: BuildId,
    release_id: ReleaseId,
    platform: Platform,
    target: BuildTarget,
    provider_type: Option<CiProviderType>,
    queue_location: Option<QueueLocation>,
    run_id: Option<RunId>,
    workflow_status: WorkflowStatus,
    upload_status: UploadStatus,
    task_id: Option<TaskId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted build.
///
/// Provider handles are optional here because records written by older
/// trigger paths may lack them; the reconciler reports such records instead
/// of polling them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedBuildData {
    /// Persisted build identifier.
    pub id: BuildId,
    /// Persisted release identifier.
    pub release_id: ReleaseId,
    /// Persisted platform.
    pub platform: Platform,
    /// Persisted build target.
    pub target: BuildTarget,
    /// Persisted provider type, if any.
    pub provider_type: Option<CiProviderType>,
    /// Persisted queue location, if any.
    pub queue_location: Option<QueueLocation>,
    /// Persisted run identifier, if any.
    pub run_id: Option<RunId>,
    /// Persisted workflow status.
    pub workflow_status: WorkflowStatus,
    /// Persisted upload status.
    pub upload_status: UploadStatus,
    /// Persisted task reference, if any.
    pub task_id: Option<TaskId>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Build {
    /// Creates a `PENDING` build for a successfully triggered workflow.
    #[must_use]
    pub fn new(data: NewBuild, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: BuildId::new(),
            release_id: data.release_id,
            platform: data.platform,
            target: data.target,
            provider_type: Some(data.provider_type),
            queue_location: Some(data.queue_location),
            run_id: None,
            workflow_status: WorkflowStatus::Pending,
            upload_status: UploadStatus::Pending,
            task_id: data.task_id,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a build from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedBuildData) -> Self {
        Self {
            id: data.id,
            release_id: data.release_id,
            platform: data.platform,
            target: data.target,
            provider_type: data.provider_type,
            queue_location: data.queue_location,
            run_id: data.run_id,
            workflow_status: data.workflow_status,
            upload_status: data.upload_status,
            task_id: data.task_id,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the build identifier.
    #[must_use]
    pub const fn id(&self) -> BuildId {
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

    /// Returns the build target.
    #[must_use]
    pub const fn target(&self) -> &BuildTarget {
        &self.target
    }

    /// Returns the recorded provider type, if any.
    #[must_use]
    pub const fn provider_type(&self) -> Option<CiProviderType> {
        self.provider_type
    }

    /// Returns the queue location, if any.
    #[must_use]
    pub const fn queue_location(&self) -> Option<&QueueLocation> {
        self.queue_location.as_ref()
    }

    /// Returns the run identifier, if execution has started.
    #[must_use]
    pub const fn run_id(&self) -> Option<&RunId> {
        self.run_id.as_ref()
    }

    /// Returns the workflow status.
    #[must_use]
    pub const fn workflow_status(&self) -> WorkflowStatus {
        self.workflow_status
    }

    /// Returns the upload status.
    #[must_use]
    pub const fn upload_status(&self) -> UploadStatus {
        self.upload_status
    }

    /// Returns the task reference, if any.
    #[must_use]
    pub const fn task_id(&self) -> Option<&TaskId> {
        self.task_id.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Marks the workflow as started and records its run handle.
    ///
    /// # Errors
    ///
    /// Returns [`BuildDomainError::InvalidWorkflowTransition`] unless the
    /// build is `PENDING`.
    pub fn mark_running(
        &mut self,
        run_id: RunId,
        clock: &impl Clock,
    ) -> Result<(), BuildDomainError> {
        self.transition_to(WorkflowStatus::Running)?;
        self.run_id = Some(run_id);
        self.touch(clock);
        Ok(())
    }

    /// Marks the workflow as completed. The upload status is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`BuildDomainError::InvalidWorkflowTransition`] unless the
    /// build is `RUNNING`.
    pub fn mark_completed(&mut self, clock: &impl Clock) -> Result<(), BuildDomainError> {
        self.transition_to(WorkflowStatus::Completed)?;
        self.touch(clock);
        Ok(())
    }

    /// Marks the workflow as failed; the artifact upload fails with it.
    ///
    /// # Errors
    ///
    /// Returns [`BuildDomainError::InvalidWorkflowTransition`] when the build
    /// is already terminal.
    pub fn mark_failed(&mut self, clock: &impl Clock) -> Result<(), BuildDomainError> {
        self.transition_to(WorkflowStatus::Failed)?;
        self.upload_status = UploadStatus::Failed;
        self.touch(clock);
        Ok(())
    }

    /// Records the outcome of the artifact upload path.
    ///
    /// # Errors
    ///
    /// Returns [`BuildDomainError::UploadStatusLocked`] when the workflow has
    /// failed and `status` is anything other than `FAILED`.
    pub fn record_upload_status(
        &mut self,
        status: UploadStatus,
        clock: &impl Clock,
    ) -> Result<(), BuildDomainError> {
        self.apply_upload_status(status, clock.utc())
    }

    /// Applies an upload status recorded at `recorded_at`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildDomainError::UploadStatusLocked`] when the workflow has
    /// failed and `status` is anything other than `FAILED`.
    pub fn apply_upload_status(
        &mut self,
        status: UploadStatus,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), BuildDomainError> {
        if self.workflow_status == WorkflowStatus::Failed && status != UploadStatus::Failed {
            return Err(BuildDomainError::UploadStatusLocked {
                build_id: self.id,
                requested: status,
            });
        }
        self.upload_status = status;
        self.updated_at = recorded_at;
        Ok(())
    }

    /// Describes the workflow change made to this copy since it was read
    /// with status `expected`.
    #[must_use]
    pub fn workflow_transition(&self, expected: WorkflowStatus) -> WorkflowTransition {
        WorkflowTransition {
            build_id: self.id,
            expected,
            status: self.workflow_status,
            run_id: self.run_id.clone(),
            occurred_at: self.updated_at,
        }
    }

    /// Applies a transition computed from an earlier read of this build.
    ///
    /// Only workflow-owned fields change; a `FAILED` transition also fails
    /// the upload.
    ///
    /// # Errors
    ///
    /// Returns [`BuildDomainError::InvalidWorkflowTransition`] when the
    /// current status cannot move to the transition's status.
    pub fn apply_workflow_transition(
        &mut self,
        transition: &WorkflowTransition,
    ) -> Result<(), BuildDomainError> {
        self.transition_to(transition.status)?;
        if let Some(run_id) = &transition.run_id {
            self.run_id = Some(run_id.clone());
        }
        if transition.status == WorkflowStatus::Failed {
            self.upload_status = UploadStatus::Failed;
        }
        self.updated_at = transition.occurred_at;
        Ok(())
    }

    fn transition_to(&mut self, target: WorkflowStatus) -> Result<(), BuildDomainError> {
        if !self.workflow_status.can_transition_to(target) {
            return Err(BuildDomainError::InvalidWorkflowTransition {
                build_id: self.id,
                from: self.workflow_status,
                to: target,
            });
        }
        self.workflow_status = target;
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
