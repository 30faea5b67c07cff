//! Callback sink port for release tasks fed by builds.

use crate::build::domain::TaskId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Downstream consumer notified when builds under a task change status.
///
/// Consumers re-derive task state from persisted build records, so a
/// callback carries only the task reference.
#[async_trait]
pub trait TaskCallbackSink: Send + Sync {
    /// Notifies the consumer that builds under `task_id` changed.
    async fn process_callback(&self, task_id: &TaskId) -> Result<(), TaskCallbackError>;
}

/// Error returned by task callback sinks.
#[derive(Debug, Clone, Error)]
#[error("task callback for {task_id} failed: {cause}")]
pub struct TaskCallbackError {
    /// Task reference that could not be notified.
    pub task_id: TaskId,
    /// Underlying failure.
    pub cause: Arc<dyn std::error::Error + Send + Sync>,
}

impl TaskCallbackError {
    /// Wraps a consumer failure for the given task.
    pub fn new(task_id: TaskId, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            task_id,
            cause: Arc::new(err),
        }
    }
}
