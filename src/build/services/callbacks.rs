//! Deduplicated task callback fan-out for one poll batch.

use crate::build::{domain::TaskId, ports::TaskCallbackSink};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// A task callback that could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackFailure {
    /// Task reference.
    pub task_id: TaskId,
    /// Failure description.
    pub message: String,
}

/// Outcome of dispatching callbacks for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallbackReport {
    /// Number of callbacks delivered.
    pub dispatched: usize,
    /// Callbacks that failed.
    pub failures: Vec<CallbackFailure>,
}

/// Issues one callback per distinct task.
#[derive(Clone)]
pub struct CallbackDispatcher<K>
where
    K: TaskCallbackSink,
{
    sink: Arc<K>,
}

impl<K> CallbackDispatcher<K>
where
    K: TaskCallbackSink,
{
    /// Creates a dispatcher over the given sink.
    #[must_use]
    pub const fn new(sink: Arc<K>) -> Self {
        Self { sink }
    }

    /// Invokes the sink once for every task in `task_ids`, allowing each
    /// callback at most `timeout`.
    ///
    /// Failures and timeouts are collected rather than propagated; build
    /// transitions in the batch are already persisted and consumers
    /// re-derive task state from build records on the next callback.
    pub async fn dispatch(&self, task_ids: &BTreeSet<TaskId>, timeout: Duration) -> CallbackReport {
        let mut report = CallbackReport::default();
        for task_id in task_ids {
            let outcome = tokio::time::timeout(timeout, self.sink.process_callback(task_id))
                .await
                .map_err(|_| format!("callback timed out after {}ms", timeout.as_millis()))
                .and_then(|delivered| delivered.map_err(|err| err.to_string()));
            match outcome {
                Ok(()) => report.dispatched += 1,
                Err(message) => {
                    tracing::warn!(task_id = %task_id, error = %message, "task callback failed");
                    report.failures.push(CallbackFailure {
                        task_id: task_id.clone(),
                        message,
                    });
                }
            }
        }
        report
    }
}
