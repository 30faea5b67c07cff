//! Raw CI/CD provider client ports.
//!
//! These contracts expose each provider's own vocabulary. Translation into
//! canonical statuses happens in the status adapters, never here.

use super::ProviderCredentials;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for raw provider client calls.
pub type ProviderApiResult<T> = Result<T, ProviderApiError>;

/// Workflow invocation parameters shared by all providers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTrigger {
    /// Jenkins job path or GitHub workflow file name.
    pub workflow: String,
    /// Git ref to build, where the provider needs one.
    pub git_ref: Option<String>,
    /// Free-form workflow parameters.
    pub parameters: BTreeMap<String, String>,
}

impl WorkflowTrigger {
    /// Creates a trigger for the given workflow.
    #[must_use]
    pub fn new(workflow: impl Into<String>) -> Self {
        Self {
            workflow: workflow.into(),
            ..Self::default()
        }
    }

    /// Sets the git ref to build.
    #[must_use]
    pub fn with_git_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = Some(git_ref.into());
        self
    }

    /// Adds a workflow parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// Jenkins queue item as returned by `<queue-item>/api/json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JenkinsQueueItem {
    /// Whether the item was cancelled before execution.
    #[serde(default)]
    pub cancelled: bool,
    /// Executable assigned once the item leaves the queue.
    #[serde(default)]
    pub executable: Option<JenkinsExecutable>,
    /// Human-readable reason the item is still waiting.
    #[serde(default)]
    pub why: Option<String>,
}

/// Executable reference attached to a Jenkins queue item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JenkinsExecutable {
    /// Build number.
    #[serde(default)]
    pub number: u64,
    /// Build URL, used as the run handle.
    #[serde(default)]
    pub url: String,
}

/// Jenkins build as returned by `<build-url>/api/json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JenkinsBuild {
    /// Whether the build is still executing.
    #[serde(default)]
    pub building: bool,
    /// Final result (`SUCCESS`, `FAILURE`, ...), absent while building.
    #[serde(default)]
    pub result: Option<String>,
}

/// GitHub Actions workflow run as returned by the runs API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubWorkflowRun {
    /// Run identifier.
    pub id: u64,
    /// Run status (`queued`, `in_progress`, `completed`, ...).
    pub status: String,
    /// Run conclusion, present once `status` is `completed`.
    #[serde(default)]
    pub conclusion: Option<String>,
}

/// Raw Jenkins remote API client.
#[async_trait]
pub trait JenkinsApi: Send + Sync {
    /// Queues a parameterised job and returns the queue item URL.
    async fn trigger_job(
        &self,
        credentials: &ProviderCredentials,
        trigger: &WorkflowTrigger,
    ) -> ProviderApiResult<String>;

    /// Fetches a queue item by its URL.
    async fn queue_item(
        &self,
        credentials: &ProviderCredentials,
        queue_url: &str,
    ) -> ProviderApiResult<JenkinsQueueItem>;

    /// Fetches a build by its URL.
    async fn build(
        &self,
        credentials: &ProviderCredentials,
        build_url: &str,
    ) -> ProviderApiResult<JenkinsBuild>;
}

/// Raw GitHub Actions REST client.
#[async_trait]
pub trait GitHubActionsApi: Send + Sync {
    /// Dispatches a workflow and returns the identifier of the created run.
    async fn dispatch_workflow(
        &self,
        credentials: &ProviderCredentials,
        trigger: &WorkflowTrigger,
    ) -> ProviderApiResult<u64>;

    /// Fetches a workflow run by identifier.
    async fn workflow_run(
        &self,
        credentials: &ProviderCredentials,
        run_id: u64,
    ) -> ProviderApiResult<GitHubWorkflowRun>;
}

/// Errors returned by raw provider clients.
#[derive(Debug, Clone, Error)]
pub enum ProviderApiError {
    /// The provider rejected the request.
    #[error("provider returned HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response summary.
        message: String,
    },

    /// The provider response could not be decoded.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// Transport-level failure.
    #[error("provider transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProviderApiError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Decodes a JSON payload, mapping decode failures to
    /// [`ProviderApiError::MalformedResponse`].
    ///
    /// # Errors
    ///
    /// Returns [`ProviderApiError::MalformedResponse`] when the payload does
    /// not match `T`.
    pub fn decode<T>(payload: &str) -> ProviderApiResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        serde_json::from_str(payload).map_err(|err| Self::MalformedResponse(err.to_string()))
    }
}
