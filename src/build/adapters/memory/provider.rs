//! Scripted CI/CD provider clients.
//!
//! Each client answers from a table of raw provider payloads that tests and
//! local runs edit between polls, and counts the calls it receives.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::build::ports::{
    GitHubActionsApi, GitHubWorkflowRun, JenkinsApi, JenkinsBuild, JenkinsQueueItem,
    ProviderApiError, ProviderApiResult, ProviderCredentials, WorkflowTrigger,
};

fn not_found(handle: &str) -> ProviderApiError {
    ProviderApiError::Http {
        status: 404,
        message: format!("{handle} not found"),
    }
}

#[derive(Debug, Default)]
struct ScriptState<Q, B> {
    queue: HashMap<String, Q>,
    runs: HashMap<String, B>,
    failures: HashMap<String, ProviderApiError>,
    delay: Option<Duration>,
    calls: usize,
    next_handle: u64,
}

impl<Q, B> ScriptState<Q, B> {
    fn begin_call(&mut self, handle: &str) -> Result<Option<Duration>, ProviderApiError> {
        self.calls += 1;
        if let Some(err) = self.failures.get(handle) {
            return Err(err.clone());
        }
        Ok(self.delay)
    }
}

/// Jenkins client answering from scripted queue items and builds.
#[derive(Debug, Clone, Default)]
pub struct ScriptedJenkinsApi {
    state: Arc<Mutex<ScriptState<JenkinsQueueItem, JenkinsBuild>>>,
}

impl ScriptedJenkinsApi {
    /// Creates a client with no scripted payloads.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut ScriptState<JenkinsQueueItem, JenkinsBuild>) -> T,
    ) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Sets the queue item returned for `queue_url`.
    pub fn set_queue_item(&self, queue_url: impl Into<String>, item: JenkinsQueueItem) {
        self.with_state(|state| state.queue.insert(queue_url.into(), item));
    }

    /// Sets the build returned for `build_url`.
    pub fn set_build(&self, build_url: impl Into<String>, build: JenkinsBuild) {
        self.with_state(|state| state.runs.insert(build_url.into(), build));
    }

    /// Makes every call for `handle` fail with `err`.
    pub fn fail_with(&self, handle: impl Into<String>, err: ProviderApiError) {
        self.with_state(|state| state.failures.insert(handle.into(), err));
    }

    /// Delays every call by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.with_state(|state| state.delay = Some(delay));
    }

    /// Returns the number of calls received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.with_state(|state| state.calls)
    }

    async fn answer<T>(
        &self,
        handle: &str,
        lookup: impl FnOnce(&ScriptState<JenkinsQueueItem, JenkinsBuild>) -> Option<T>,
    ) -> ProviderApiResult<T> {
        let delay = self.with_state(|state| state.begin_call(handle))?;
        if let Some(pause) = delay {
            tokio::time::sleep(pause).await;
        }
        self.with_state(|state| lookup(state)).ok_or_else(|| not_found(handle))
    }
}

#[async_trait]
impl JenkinsApi for ScriptedJenkinsApi {
    async fn trigger_job(
        &self,
        credentials: &ProviderCredentials,
        trigger: &WorkflowTrigger,
    ) -> ProviderApiResult<String> {
        let queue_url = self.with_state(|state| {
            state.calls += 1;
            state.next_handle += 1;
            let url = format!(
                "{}/queue/item/{}/",
                credentials.base_url().trim_end_matches('/'),
                state.next_handle
            );
            state.queue.insert(url.clone(), JenkinsQueueItem::default());
            url
        });
        tracing::debug!(
            workflow = %trigger.workflow,
            queue_url = %queue_url,
            "scripted Jenkins job queued"
        );
        Ok(queue_url)
    }

    async fn queue_item(
        &self,
        _credentials: &ProviderCredentials,
        queue_url: &str,
    ) -> ProviderApiResult<JenkinsQueueItem> {
        self.answer(queue_url, |state| state.queue.get(queue_url).cloned())
            .await
    }

    async fn build(
        &self,
        _credentials: &ProviderCredentials,
        build_url: &str,
    ) -> ProviderApiResult<JenkinsBuild> {
        self.answer(build_url, |state| state.runs.get(build_url).cloned())
            .await
    }
}

/// GitHub Actions client answering from scripted workflow runs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGitHubActionsApi {
    state: Arc<Mutex<ScriptState<(), GitHubWorkflowRun>>>,
}

impl ScriptedGitHubActionsApi {
    /// Creates a client with no scripted runs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ScriptState<(), GitHubWorkflowRun>) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Sets the run returned for its identifier.
    pub fn set_run(&self, run: GitHubWorkflowRun) {
        self.with_state(|state| state.runs.insert(run.id.to_string(), run));
    }

    /// Makes every call for `run_id` fail with `err`.
    pub fn fail_with(&self, run_id: u64, err: ProviderApiError) {
        self.with_state(|state| state.failures.insert(run_id.to_string(), err));
    }

    /// Delays every call by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.with_state(|state| state.delay = Some(delay));
    }

    /// Returns the number of calls received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.with_state(|state| state.calls)
    }
}

#[async_trait]
impl GitHubActionsApi for ScriptedGitHubActionsApi {
    async fn dispatch_workflow(
        &self,
        _credentials: &ProviderCredentials,
        trigger: &WorkflowTrigger,
    ) -> ProviderApiResult<u64> {
        let run_id = self.with_state(|state| {
            state.calls += 1;
            state.next_handle += 1;
            let run = GitHubWorkflowRun {
                id: state.next_handle,
                status: "queued".to_owned(),
                conclusion: None,
            };
            state.runs.insert(run.id.to_string(), run);
            state.next_handle
        });
        tracing::debug!(
            workflow = %trigger.workflow,
            run_id,
            "scripted GitHub workflow dispatched"
        );
        Ok(run_id)
    }

    async fn workflow_run(
        &self,
        _credentials: &ProviderCredentials,
        run_id: u64,
    ) -> ProviderApiResult<GitHubWorkflowRun> {
        let handle = run_id.to_string();
        let delay = self.with_state(|state| state.begin_call(&handle))?;
        if let Some(pause) = delay {
            tokio::time::sleep(pause).await;
        }
        self.with_state(|state| state.runs.get(&handle).cloned())
            .ok_or_else(|| not_found(&handle))
    }
}
