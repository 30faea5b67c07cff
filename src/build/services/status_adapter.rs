//! Provider status adapters and the registry that selects them.
//!
//! Each adapter translates one provider's raw vocabulary into
//! [`CanonicalStatus`]. The registry is built once at start-up and shared by
//! reference; resolution is an exhaustive match over [`CiProviderType`].

use crate::build::{
    domain::{
        BuildStatusReport, CanonicalStatus, CiProviderType, QueueLocation, QueueStatusReport,
        RunId,
    },
    ports::{
        GitHubActionsApi, GitHubWorkflowRun, JenkinsApi, JenkinsBuild, JenkinsQueueItem,
        ProviderApiError, ProviderCredentials, WorkflowTrigger,
    },
};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by status adapters and registry resolution.
#[derive(Debug, Clone, Error)]
pub enum ProviderStatusError {
    /// The provider type is declared but has no adapter implementation.
    #[error("unsupported CI/CD provider: {0}")]
    UnsupportedProvider(CiProviderType),

    /// The provider is implemented but no client was registered at start-up.
    #[error("CI/CD provider {0} is not configured in the provider registry")]
    NotConfigured(CiProviderType),

    /// A stored handle cannot be interpreted by the provider.
    #[error("invalid {provider} handle '{handle}'")]
    InvalidHandle {
        /// Provider type.
        provider: CiProviderType,
        /// Offending handle.
        handle: String,
    },

    /// The raw provider call failed.
    #[error("{provider} request failed: {source}")]
    Api {
        /// Provider type.
        provider: CiProviderType,
        /// Raw client error.
        #[source]
        source: ProviderApiError,
    },
}

impl ProviderStatusError {
    fn api(provider: CiProviderType) -> impl Fn(ProviderApiError) -> Self {
        move |source| Self::Api { provider, source }
    }
}

/// Result type for status adapter operations.
pub type ProviderStatusResult<T> = Result<T, ProviderStatusError>;

/// Translates a Jenkins queue item into a canonical queue report.
///
/// A non-empty executable URL means the job has started; the URL becomes the
/// run handle used by later build checks.
#[must_use]
pub fn map_jenkins_queue_item(item: &JenkinsQueueItem) -> QueueStatusReport {
    if item.cancelled {
        return QueueStatusReport::cancelled();
    }
    item.executable
        .as_ref()
        .and_then(|executable| RunId::new(executable.url.as_str()).ok())
        .map_or_else(QueueStatusReport::pending, |run_id| {
            QueueStatusReport::started(CanonicalStatus::Running, run_id)
        })
}

/// Translates a Jenkins build into a canonical status.
///
/// Unknown results are reported as running so the next cycle re-checks them.
#[must_use]
pub fn map_jenkins_build(build: &JenkinsBuild) -> CanonicalStatus {
    if build.building {
        return CanonicalStatus::Running;
    }
    match build.result.as_deref().map(str::to_ascii_uppercase).as_deref() {
        Some("SUCCESS") => CanonicalStatus::Completed,
        Some("FAILURE" | "ABORTED" | "UNSTABLE" | "NOT_BUILT") => CanonicalStatus::Failed,
        Some(other) => {
            tracing::warn!(result = other, "unrecognised Jenkins build result");
            CanonicalStatus::Running
        }
        None => CanonicalStatus::Running,
    }
}

/// Translates a GitHub Actions run into a canonical queue report.
///
/// A run that has left the queue reports its own identifier as the run
/// handle. Any completed run other than a cancelled one is reported as
/// `completed`: completion itself is confirmed by the run-status check.
#[must_use]
pub fn map_github_queue_run(run: &GitHubWorkflowRun) -> QueueStatusReport {
    let run_id = RunId::new(run.id.to_string()).ok();
    match (run.status.as_str(), run.conclusion.as_deref(), run_id) {
        ("completed", Some("cancelled"), _) => QueueStatusReport::cancelled(),
        ("in_progress", _, Some(run_id)) => {
            QueueStatusReport::started(CanonicalStatus::Running, run_id)
        }
        ("completed", _, Some(run_id)) => {
            QueueStatusReport::started(CanonicalStatus::Completed, run_id)
        }
        _ => QueueStatusReport::pending(),
    }
}

/// Translates a GitHub Actions run into a canonical run status.
///
/// The conclusion field decides the outcome of completed runs; every
/// failure, cancellation, or timeout conclusion maps to `failed`.
#[must_use]
pub fn map_github_run(run: &GitHubWorkflowRun) -> CanonicalStatus {
    if run.status != "completed" {
        return CanonicalStatus::Running;
    }
    match run.conclusion.as_deref() {
        Some("success" | "neutral") => CanonicalStatus::Completed,
        _ => CanonicalStatus::Failed,
    }
}

/// Status adapter for Jenkins.
#[derive(Clone)]
pub struct JenkinsStatusAdapter {
    api: Arc<dyn JenkinsApi>,
}

impl JenkinsStatusAdapter {
    /// Creates an adapter over a raw Jenkins client.
    #[must_use]
    pub fn new(api: Arc<dyn JenkinsApi>) -> Self {
        Self { api }
    }

    async fn trigger(
        &self,
        credentials: &ProviderCredentials,
        trigger: &WorkflowTrigger,
    ) -> ProviderStatusResult<QueueLocation> {
        let queue_url = self
            .api
            .trigger_job(credentials, trigger)
            .await
            .map_err(ProviderStatusError::api(CiProviderType::Jenkins))?;
        QueueLocation::new(queue_url.as_str()).map_err(|_| ProviderStatusError::InvalidHandle {
            provider: CiProviderType::Jenkins,
            handle: queue_url,
        })
    }

    async fn check_queue_status(
        &self,
        credentials: &ProviderCredentials,
        queue_location: &QueueLocation,
    ) -> ProviderStatusResult<QueueStatusReport> {
        let item = self
            .api
            .queue_item(credentials, queue_location.as_str())
            .await
            .map_err(ProviderStatusError::api(CiProviderType::Jenkins))?;
        Ok(map_jenkins_queue_item(&item))
    }

    async fn check_build_status(
        &self,
        credentials: &ProviderCredentials,
        run_id: &RunId,
    ) -> ProviderStatusResult<BuildStatusReport> {
        let build = self
            .api
            .build(credentials, run_id.as_str())
            .await
            .map_err(ProviderStatusError::api(CiProviderType::Jenkins))?;
        Ok(BuildStatusReport::new(map_jenkins_build(&build)))
    }
}

impl fmt::Debug for JenkinsStatusAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JenkinsStatusAdapter").finish_non_exhaustive()
    }
}

/// Status adapter for GitHub Actions.
#[derive(Clone)]
pub struct GitHubActionsStatusAdapter {
    api: Arc<dyn GitHubActionsApi>,
}

impl GitHubActionsStatusAdapter {
    /// Creates an adapter over a raw GitHub Actions client.
    #[must_use]
    pub fn new(api: Arc<dyn GitHubActionsApi>) -> Self {
        Self { api }
    }

    fn parse_run_id(handle: &str) -> ProviderStatusResult<u64> {
        handle
            .trim()
            .parse::<u64>()
            .map_err(|_| ProviderStatusError::InvalidHandle {
                provider: CiProviderType::GithubActions,
                handle: handle.to_owned(),
            })
    }

    async fn trigger(
        &self,
        credentials: &ProviderCredentials,
        trigger: &WorkflowTrigger,
    ) -> ProviderStatusResult<QueueLocation> {
        let run_id = self
            .api
            .dispatch_workflow(credentials, trigger)
            .await
            .map_err(ProviderStatusError::api(CiProviderType::GithubActions))?;
        QueueLocation::new(run_id.to_string()).map_err(|_| ProviderStatusError::InvalidHandle {
            provider: CiProviderType::GithubActions,
            handle: run_id.to_string(),
        })
    }

    async fn fetch_run(
        &self,
        credentials: &ProviderCredentials,
        handle: &str,
    ) -> ProviderStatusResult<GitHubWorkflowRun> {
        let run_id = Self::parse_run_id(handle)?;
        self.api
            .workflow_run(credentials, run_id)
            .await
            .map_err(ProviderStatusError::api(CiProviderType::GithubActions))
    }

    async fn check_queue_status(
        &self,
        credentials: &ProviderCredentials,
        queue_location: &QueueLocation,
    ) -> ProviderStatusResult<QueueStatusReport> {
        let run = self.fetch_run(credentials, queue_location.as_str()).await?;
        Ok(map_github_queue_run(&run))
    }

    async fn check_build_status(
        &self,
        credentials: &ProviderCredentials,
        run_id: &RunId,
    ) -> ProviderStatusResult<BuildStatusReport> {
        let run = self.fetch_run(credentials, run_id.as_str()).await?;
        Ok(BuildStatusReport::new(map_github_run(&run)))
    }
}

impl fmt::Debug for GitHubActionsStatusAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubActionsStatusAdapter")
            .finish_non_exhaustive()
    }
}

/// Adapter resolved for one provider type.
#[derive(Debug, Clone, Copy)]
pub enum ProviderStatusAdapter<'a> {
    /// Jenkins adapter.
    Jenkins(&'a JenkinsStatusAdapter),
    /// GitHub Actions adapter.
    GithubActions(&'a GitHubActionsStatusAdapter),
}

impl ProviderStatusAdapter<'_> {
    /// Returns the provider this adapter serves.
    #[must_use]
    pub const fn provider_type(&self) -> CiProviderType {
        match self {
            Self::Jenkins(_) => CiProviderType::Jenkins,
            Self::GithubActions(_) => CiProviderType::GithubActions,
        }
    }

    /// Triggers a workflow and returns its queue location.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderStatusError`] when the trigger call fails.
    pub async fn trigger(
        &self,
        credentials: &ProviderCredentials,
        trigger: &WorkflowTrigger,
    ) -> ProviderStatusResult<QueueLocation> {
        match self {
            Self::Jenkins(adapter) => adapter.trigger(credentials, trigger).await,
            Self::GithubActions(adapter) => adapter.trigger(credentials, trigger).await,
        }
    }

    /// Checks the status of a queued workflow.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderStatusError`] when the handle is invalid or the
    /// provider call fails.
    pub async fn check_queue_status(
        &self,
        credentials: &ProviderCredentials,
        queue_location: &QueueLocation,
    ) -> ProviderStatusResult<QueueStatusReport> {
        match self {
            Self::Jenkins(adapter) => adapter.check_queue_status(credentials, queue_location).await,
            Self::GithubActions(adapter) => {
                adapter.check_queue_status(credentials, queue_location).await
            }
        }
    }

    /// Checks the status of a running workflow.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderStatusError`] when the handle is invalid or the
    /// provider call fails.
    pub async fn check_build_status(
        &self,
        credentials: &ProviderCredentials,
        run_id: &RunId,
    ) -> ProviderStatusResult<BuildStatusReport> {
        match self {
            Self::Jenkins(adapter) => adapter.check_build_status(credentials, run_id).await,
            Self::GithubActions(adapter) => adapter.check_build_status(credentials, run_id).await,
        }
    }
}

/// Registry of configured provider adapters, built once at start-up.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    jenkins: Option<JenkinsStatusAdapter>,
    github_actions: Option<GitHubActionsStatusAdapter>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the Jenkins client.
    #[must_use]
    pub fn with_jenkins(mut self, api: Arc<dyn JenkinsApi>) -> Self {
        self.jenkins = Some(JenkinsStatusAdapter::new(api));
        self
    }

    /// Registers the GitHub Actions client.
    #[must_use]
    pub fn with_github_actions(mut self, api: Arc<dyn GitHubActionsApi>) -> Self {
        self.github_actions = Some(GitHubActionsStatusAdapter::new(api));
        self
    }

    /// Resolves the adapter for a provider type.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderStatusError::UnsupportedProvider`] for declared
    /// providers without an adapter, and
    /// [`ProviderStatusError::NotConfigured`] when an implemented provider
    /// has no registered client.
    pub fn resolve(
        &self,
        provider: CiProviderType,
    ) -> ProviderStatusResult<ProviderStatusAdapter<'_>> {
        match provider {
            CiProviderType::Jenkins => self
                .jenkins
                .as_ref()
                .map(ProviderStatusAdapter::Jenkins)
                .ok_or(ProviderStatusError::NotConfigured(provider)),
            CiProviderType::GithubActions => self
                .github_actions
                .as_ref()
                .map(ProviderStatusAdapter::GithubActions)
                .ok_or(ProviderStatusError::NotConfigured(provider)),
            CiProviderType::CircleCi | CiProviderType::GitlabCi => {
                Err(ProviderStatusError::UnsupportedProvider(provider))
            }
        }
    }
}
