//! Build status reconciliation against CI/CD providers.
//!
//! A pass loads every build of a release in one workflow status, checks each
//! with its provider concurrently, applies the transition table, and then
//! fans out one callback per affected task once all transitions are final.

use super::{
    callbacks::{CallbackDispatcher, CallbackFailure},
    status_adapter::{ProviderRegistry, ProviderStatusError},
};
use crate::build::{
    domain::{
        Build, BuildDomainError, BuildId, CanonicalStatus, CiProviderType, TaskId, WorkflowStatus,
    },
    ports::{
        BuildRepository, BuildRepositoryError, CredentialStore, CredentialStoreError,
        TaskCallbackSink,
    },
};
use crate::config::EngineConfig;
use crate::release::{ReleaseId, TenantId};
use futures::stream::{self, StreamExt};
use mockable::Clock;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Per-build errors recorded in a poll batch.
///
/// None of these abort the batch; the build keeps its current status and is
/// retried on the next pass.
#[derive(Debug, Clone, Error)]
pub enum BuildPollError {
    /// A handle required for the status check is absent.
    #[error("build {build_id} is missing {field}")]
    MissingField {
        /// Build identifier.
        build_id: BuildId,
        /// Name of the missing field.
        field: &'static str,
    },

    /// The provider type has no adapter implementation.
    #[error("unsupported CI/CD provider: {0}")]
    UnsupportedProvider(CiProviderType),

    /// The provider has no client in the registry.
    #[error("CI/CD provider {0} is not configured")]
    ProviderNotConfigured(CiProviderType),

    /// The provider call failed or timed out.
    #[error("{provider} status check failed: {message}")]
    ProviderTransientFailure {
        /// Provider type.
        provider: CiProviderType,
        /// Failure description.
        message: String,
    },

    /// The stored handle is not valid for the provider.
    #[error("invalid {provider} handle '{handle}'")]
    InvalidHandle {
        /// Provider type.
        provider: CiProviderType,
        /// Offending handle.
        handle: String,
    },

    /// Tenant credentials could not be loaded.
    #[error(transparent)]
    Credentials(#[from] CredentialStoreError),

    /// The domain rejected the transition.
    #[error(transparent)]
    Transition(#[from] BuildDomainError),

    /// Persisting the transition failed.
    #[error(transparent)]
    Repository(#[from] BuildRepositoryError),
}

impl From<ProviderStatusError> for BuildPollError {
    fn from(err: ProviderStatusError) -> Self {
        match err {
            ProviderStatusError::UnsupportedProvider(provider) => {
                Self::UnsupportedProvider(provider)
            }
            ProviderStatusError::NotConfigured(provider) => Self::ProviderNotConfigured(provider),
            ProviderStatusError::InvalidHandle { provider, handle } => {
                Self::InvalidHandle { provider, handle }
            }
            ProviderStatusError::Api { provider, source } => Self::ProviderTransientFailure {
                provider,
                message: source.to_string(),
            },
        }
    }
}

/// Batch-level errors that prevent a pass from running at all.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Eligible builds could not be loaded.
    #[error(transparent)]
    Repository(#[from] BuildRepositoryError),
}

/// Result type for reconciliation passes.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Outcome of checking one build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPollResult {
    /// Build identifier.
    pub build_id: BuildId,
    /// Workflow status before the check.
    pub previous_status: WorkflowStatus,
    /// Workflow status after the check.
    pub new_status: WorkflowStatus,
    /// Whether a transition was persisted.
    pub updated: bool,
    /// Error recorded for this build, if any.
    #[serde(serialize_with = "serialize_poll_error")]
    pub error: Option<BuildPollError>,
}

impl BuildPollResult {
    const fn unchanged(build_id: BuildId, status: WorkflowStatus) -> Self {
        Self {
            build_id,
            previous_status: status,
            new_status: status,
            updated: false,
            error: None,
        }
    }

    const fn failed(build_id: BuildId, status: WorkflowStatus, error: BuildPollError) -> Self {
        Self {
            build_id,
            previous_status: status,
            new_status: status,
            updated: false,
            error: Some(error),
        }
    }
}

fn serialize_poll_error<S>(error: &Option<BuildPollError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match error {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Summary of one poll batch.
#[derive(Debug, Clone, Serialize)]
pub struct PollBatchSummary {
    /// Number of builds checked.
    pub processed: usize,
    /// Number of builds whose status changed.
    pub updated: usize,
    /// Number of task callbacks delivered.
    pub callbacks: usize,
    /// Task callbacks that failed.
    pub callback_failures: Vec<CallbackFailure>,
    /// Per-build outcomes, in load order.
    pub results: Vec<BuildPollResult>,
}

/// Summaries of the pending and running passes of one release.
#[derive(Debug, Clone, Serialize)]
pub struct ReleasePollSummary {
    /// Pending-pass summary.
    pub pending: PollBatchSummary,
    /// Running-pass summary.
    pub running: PollBatchSummary,
}

/// Transition applied after a queue-status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingTransition {
    Stay,
    Start,
    Fail,
}

/// A queue check that reports `completed` still only proves the job
/// started; completion is confirmed by the running pass.
const fn pending_transition(status: CanonicalStatus) -> PendingTransition {
    match status {
        CanonicalStatus::Running | CanonicalStatus::Completed => PendingTransition::Start,
        CanonicalStatus::Cancelled => PendingTransition::Fail,
        CanonicalStatus::Pending | CanonicalStatus::Failed => PendingTransition::Stay,
    }
}

/// Transition applied after a run-status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunningTransition {
    Stay,
    Complete,
    Fail,
}

const fn running_transition(status: CanonicalStatus) -> RunningTransition {
    match status {
        CanonicalStatus::Completed => RunningTransition::Complete,
        CanonicalStatus::Failed => RunningTransition::Fail,
        CanonicalStatus::Running | CanonicalStatus::Pending | CanonicalStatus::Cancelled => {
            RunningTransition::Stay
        }
    }
}

struct BuildOutcome {
    result: BuildPollResult,
    task_id: Option<TaskId>,
}

/// Drives the build workflow state machine by polling providers.
#[derive(Clone)]
pub struct BuildStatusReconciler<R, S, K, C>
where
    R: BuildRepository,
    S: CredentialStore,
    K: TaskCallbackSink,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    credentials: Arc<S>,
    registry: Arc<ProviderRegistry>,
    dispatcher: CallbackDispatcher<K>,
    clock: Arc<C>,
    config: EngineConfig,
}

impl<R, S, K, C> BuildStatusReconciler<R, S, K, C>
where
    R: BuildRepository,
    S: CredentialStore,
    K: TaskCallbackSink,
    C: Clock + Send + Sync,
{
    /// Creates a reconciler with default configuration.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        credentials: Arc<S>,
        registry: Arc<ProviderRegistry>,
        callbacks: Arc<K>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            credentials,
            registry,
            dispatcher: CallbackDispatcher::new(callbacks),
            clock,
            config: EngineConfig::default(),
        }
    }

    /// Replaces the engine configuration.
    #[must_use]
    pub const fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Checks every `PENDING` build of a release against its provider queue.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] only when the builds cannot be loaded;
    /// per-build failures are reported in the summary.
    pub async fn poll_pending_workflows(
        &self,
        release_id: ReleaseId,
        tenant_id: &TenantId,
    ) -> ReconcileResult<PollBatchSummary> {
        let builds = self
            .repository
            .find_by_release_and_status(release_id, WorkflowStatus::Pending)
            .await?;
        let outcomes = stream::iter(builds)
            .map(|build| self.reconcile_pending(tenant_id, build))
            .buffered(self.config.max_concurrent_checks.max(1))
            .collect::<Vec<_>>()
            .await;
        Ok(self.finish_batch(release_id, WorkflowStatus::Pending, outcomes).await)
    }

    /// Checks every `RUNNING` build of a release against its provider run.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] only when the builds cannot be loaded;
    /// per-build failures are reported in the summary.
    pub async fn poll_running_workflows(
        &self,
        release_id: ReleaseId,
        tenant_id: &TenantId,
    ) -> ReconcileResult<PollBatchSummary> {
        let builds = self
            .repository
            .find_by_release_and_status(release_id, WorkflowStatus::Running)
            .await?;
        let outcomes = stream::iter(builds)
            .map(|build| self.reconcile_running(tenant_id, build))
            .buffered(self.config.max_concurrent_checks.max(1))
            .collect::<Vec<_>>()
            .await;
        Ok(self.finish_batch(release_id, WorkflowStatus::Running, outcomes).await)
    }

    /// Runs the pending pass followed by the running pass.
    ///
    /// Builds started during the pending pass are checked by the running
    /// pass of the same call.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when either pass cannot load its builds.
    pub async fn poll_release(
        &self,
        release_id: ReleaseId,
        tenant_id: &TenantId,
    ) -> ReconcileResult<ReleasePollSummary> {
        let pending = self.poll_pending_workflows(release_id, tenant_id).await?;
        let running = self.poll_running_workflows(release_id, tenant_id).await?;
        Ok(ReleasePollSummary { pending, running })
    }

    async fn reconcile_pending(&self, tenant_id: &TenantId, build: Build) -> BuildOutcome {
        let build_id = build.id();
        let previous = build.workflow_status();
        let task_id = build.task_id().cloned();
        match self.advance_pending(tenant_id, build).await {
            Ok(Some(updated)) => Self::updated_outcome(previous, &updated, task_id),
            Ok(None) => BuildOutcome {
                result: BuildPollResult::unchanged(build_id, previous),
                task_id: None,
            },
            Err(error) => Self::failed_outcome(build_id, previous, error),
        }
    }

    async fn reconcile_running(&self, tenant_id: &TenantId, build: Build) -> BuildOutcome {
        let build_id = build.id();
        let previous = build.workflow_status();
        let task_id = build.task_id().cloned();
        match self.advance_running(tenant_id, build).await {
            Ok(Some(updated)) => Self::updated_outcome(previous, &updated, task_id),
            Ok(None) => BuildOutcome {
                result: BuildPollResult::unchanged(build_id, previous),
                task_id: None,
            },
            Err(error) => Self::failed_outcome(build_id, previous, error),
        }
    }

    fn updated_outcome(
        previous: WorkflowStatus,
        build: &Build,
        task_id: Option<TaskId>,
    ) -> BuildOutcome {
        tracing::info!(
            build_id = %build.id(),
            from = %previous,
            to = %build.workflow_status(),
            "build workflow status updated"
        );
        BuildOutcome {
            result: BuildPollResult {
                build_id: build.id(),
                previous_status: previous,
                new_status: build.workflow_status(),
                updated: true,
                error: None,
            },
            task_id,
        }
    }

    fn failed_outcome(
        build_id: BuildId,
        status: WorkflowStatus,
        error: BuildPollError,
    ) -> BuildOutcome {
        tracing::warn!(
            build_id = %build_id,
            status = %status,
            error = %error,
            "build status check skipped"
        );
        BuildOutcome {
            result: BuildPollResult::failed(build_id, status, error),
            task_id: None,
        }
    }

    async fn advance_pending(
        &self,
        tenant_id: &TenantId,
        mut build: Build,
    ) -> Result<Option<Build>, BuildPollError> {
        let queue_location = build
            .queue_location()
            .cloned()
            .ok_or(BuildPollError::MissingField {
                build_id: build.id(),
                field: "queue_location",
            })?;
        let provider = build.provider_type().ok_or(BuildPollError::MissingField {
            build_id: build.id(),
            field: "provider_type",
        })?;
        let adapter = self.registry.resolve(provider)?;
        let credentials = self
            .within_timeout(
                provider,
                "credential lookup",
                self.credentials.get_credentials(tenant_id, provider),
            )
            .await?;
        let report = self
            .within_timeout(
                provider,
                "status check",
                adapter.check_queue_status(&credentials, &queue_location),
            )
            .await?;

        match pending_transition(report.status) {
            PendingTransition::Stay => return Ok(None),
            PendingTransition::Start => {
                let run_id = report.run_id.ok_or(BuildPollError::MissingField {
                    build_id: build.id(),
                    field: "run_id",
                })?;
                build.mark_running(run_id, &*self.clock)?;
            }
            PendingTransition::Fail => build.mark_failed(&*self.clock)?,
        }

        let stored = self
            .repository
            .update_if_status(&build.workflow_transition(WorkflowStatus::Pending))
            .await?;
        Ok(Some(stored))
    }

    async fn advance_running(
        &self,
        tenant_id: &TenantId,
        mut build: Build,
    ) -> Result<Option<Build>, BuildPollError> {
        let run_id = build.run_id().cloned().ok_or(BuildPollError::MissingField {
            build_id: build.id(),
            field: "run_id",
        })?;
        let provider = build.provider_type().ok_or(BuildPollError::MissingField {
            build_id: build.id(),
            field: "provider_type",
        })?;
        let adapter = self.registry.resolve(provider)?;
        let credentials = self
            .within_timeout(
                provider,
                "credential lookup",
                self.credentials.get_credentials(tenant_id, provider),
            )
            .await?;
        let report = self
            .within_timeout(
                provider,
                "status check",
                adapter.check_build_status(&credentials, &run_id),
            )
            .await?;

        match running_transition(report.status) {
            RunningTransition::Stay => return Ok(None),
            RunningTransition::Complete => build.mark_completed(&*self.clock)?,
            RunningTransition::Fail => build.mark_failed(&*self.clock)?,
        }

        let stored = self
            .repository
            .update_if_status(&build.workflow_transition(WorkflowStatus::Running))
            .await?;
        Ok(Some(stored))
    }

    async fn within_timeout<T, E>(
        &self,
        provider: CiProviderType,
        operation: &'static str,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<T, BuildPollError>
    where
        BuildPollError: From<E>,
    {
        let timeout = self.config.status_check_timeout;
        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| BuildPollError::ProviderTransientFailure {
                provider,
                message: format!("{operation} timed out after {}ms", timeout.as_millis()),
            })?
            .map_err(BuildPollError::from)
    }

    async fn finish_batch(
        &self,
        release_id: ReleaseId,
        status: WorkflowStatus,
        outcomes: Vec<BuildOutcome>,
    ) -> PollBatchSummary {
        let task_ids: BTreeSet<TaskId> = outcomes
            .iter()
            .filter(|outcome| outcome.result.updated)
            .filter_map(|outcome| outcome.task_id.clone())
            .collect();
        let results: Vec<BuildPollResult> =
            outcomes.into_iter().map(|outcome| outcome.result).collect();
        let updated = results.iter().filter(|result| result.updated).count();
        let report = self
            .dispatcher
            .dispatch(&task_ids, self.config.callback_timeout)
            .await;

        tracing::info!(
            release_id = %release_id,
            status = %status,
            processed = results.len(),
            updated,
            callbacks = report.dispatched,
            "build poll batch finished"
        );

        PollBatchSummary {
            processed: results.len(),
            updated,
            callbacks: report.dispatched,
            callback_failures: report.failures,
            results,
        }
    }
}
