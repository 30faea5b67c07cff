//! Recording task callback sink.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::build::{
    domain::TaskId,
    ports::{TaskCallbackError, TaskCallbackSink},
};

/// Callback sink that records every delivered task reference.
#[derive(Debug, Clone, Default)]
pub struct RecordingTaskCallbackSink {
    state: Arc<Mutex<RecordingState>>,
}

#[derive(Debug, Default)]
struct RecordingState {
    received: Vec<TaskId>,
    failing: HashSet<TaskId>,
    delay: Option<Duration>,
}

impl RecordingTaskCallbackSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every callback for `task_id` fail.
    pub fn fail_for(&self, task_id: TaskId) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .failing
            .insert(task_id);
    }

    /// Delays every callback by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .delay = Some(delay);
    }

    /// Returns delivered task references in delivery order.
    #[must_use]
    pub fn received(&self) -> Vec<TaskId> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .received
            .clone()
    }
}

#[async_trait]
impl TaskCallbackSink for RecordingTaskCallbackSink {
    async fn process_callback(&self, task_id: &TaskId) -> Result<(), TaskCallbackError> {
        let delay = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .delay;
        if let Some(pause) = delay {
            tokio::time::sleep(pause).await;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.failing.contains(task_id) {
            return Err(TaskCallbackError::new(
                task_id.clone(),
                std::io::Error::other("callback consumer unavailable"),
            ));
        }
        state.received.push(task_id.clone());
        Ok(())
    }
}
