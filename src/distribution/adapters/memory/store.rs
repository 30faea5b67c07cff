//! Scripted app-store client.
//!
//! Records every call it receives and answers from a small script: whether
//! uploads land directly in review, which operations fail, and an optional
//! delay applied to every call.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::distribution::{
    domain::{ExposurePercent, Submission, SubmissionId},
    ports::{
        StoreClient, StoreClientError, StoreClientResult, StoreOperation, StoreSubmissionReceipt,
    },
};
use crate::release::Platform;

/// A call received by [`ScriptedStoreClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    /// Operation invoked.
    pub operation: StoreOperation,
    /// Submission the call was made for.
    pub submission_id: SubmissionId,
    /// Platform of the submission.
    pub platform: Platform,
    /// Requested exposure, for exposure changes.
    pub exposure: Option<ExposurePercent>,
}

#[derive(Debug, Default)]
struct ScriptedStoreState {
    calls: Vec<StoreCall>,
    failures: HashMap<StoreOperation, StoreClientError>,
    submit_in_review: bool,
    delay: Option<Duration>,
}

/// Store client answering from a script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStoreClient {
    state: Arc<Mutex<ScriptedStoreState>>,
}

impl ScriptedStoreClient {
    /// Creates a client that accepts every call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ScriptedStoreState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Sets whether uploads are acknowledged as already in review.
    pub fn set_submit_in_review(&self, in_review: bool) {
        self.with_state(|state| state.submit_in_review = in_review);
    }

    /// Makes every call of `operation` fail with `err`.
    pub fn fail_with(&self, operation: StoreOperation, err: StoreClientError) {
        self.with_state(|state| state.failures.insert(operation, err));
    }

    /// Removes every scripted failure.
    pub fn clear_failures(&self) {
        self.with_state(|state| state.failures.clear());
    }

    /// Delays every call by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.with_state(|state| state.delay = Some(delay));
    }

    /// Returns the calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.with_state(|state| state.calls.clone())
    }

    /// Returns the number of calls of `operation` received so far.
    #[must_use]
    pub fn call_count(&self, operation: StoreOperation) -> usize {
        self.with_state(|state| {
            state
                .calls
                .iter()
                .filter(|call| call.operation == operation)
                .count()
        })
    }

    async fn answer(
        &self,
        operation: StoreOperation,
        submission: &Submission,
        exposure: Option<ExposurePercent>,
    ) -> StoreClientResult<bool> {
        let (delay, failure, in_review) = self.with_state(|state| {
            state.calls.push(StoreCall {
                operation,
                submission_id: submission.id(),
                platform: submission.platform(),
                exposure,
            });
            (
                state.delay,
                state.failures.get(&operation).cloned(),
                state.submit_in_review,
            )
        });
        if let Some(pause) = delay {
            tokio::time::sleep(pause).await;
        }
        failure.map_or(Ok(in_review), Err)
    }
}

#[async_trait]
impl StoreClient for ScriptedStoreClient {
    async fn submit(&self, submission: &Submission) -> StoreClientResult<StoreSubmissionReceipt> {
        let in_review = self.answer(StoreOperation::Submit, submission, None).await?;
        tracing::debug!(
            submission_id = %submission.id(),
            in_review,
            "scripted store upload accepted"
        );
        Ok(StoreSubmissionReceipt { in_review })
    }

    async fn cancel(&self, submission: &Submission) -> StoreClientResult<()> {
        self.answer(StoreOperation::Cancel, submission, None)
            .await
            .map(drop)
    }

    async fn set_exposure(
        &self,
        submission: &Submission,
        percent: ExposurePercent,
    ) -> StoreClientResult<()> {
        self.answer(StoreOperation::SetExposure, submission, Some(percent))
            .await
            .map(drop)
    }

    async fn pause(&self, submission: &Submission) -> StoreClientResult<()> {
        self.answer(StoreOperation::Pause, submission, None)
            .await
            .map(drop)
    }

    async fn resume(&self, submission: &Submission) -> StoreClientResult<()> {
        self.answer(StoreOperation::Resume, submission, None)
            .await
            .map(drop)
    }

    async fn halt(&self, submission: &Submission) -> StoreClientResult<()> {
        self.answer(StoreOperation::Halt, submission, None)
            .await
            .map(drop)
    }

    async fn complete_phased_release(&self, submission: &Submission) -> StoreClientResult<()> {
        self.answer(
            StoreOperation::CompletePhasedRelease,
            submission,
            Some(ExposurePercent::FULL),
        )
        .await
        .map(drop)
    }
}
