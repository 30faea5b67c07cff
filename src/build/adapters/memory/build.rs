//! In-memory repository for build records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::build::{
    domain::{Build, BuildId, UploadStatus, WorkflowStatus, WorkflowTransition},
    ports::{BuildRepository, BuildRepositoryError, BuildRepositoryResult},
};
use crate::release::ReleaseId;

/// Thread-safe in-memory build repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBuildRepository {
    state: Arc<RwLock<InMemoryBuildState>>,
}

#[derive(Debug, Default)]
struct InMemoryBuildState {
    builds: HashMap<BuildId, Build>,
    insertion_order: Vec<BuildId>,
}

impl InMemoryBuildRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> BuildRepositoryError {
    BuildRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl BuildRepository for InMemoryBuildRepository {
    async fn store(&self, build: &Build) -> BuildRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.builds.contains_key(&build.id()) {
            return Err(BuildRepositoryError::DuplicateBuild(build.id()));
        }
        state.insertion_order.push(build.id());
        state.builds.insert(build.id(), build.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: BuildId) -> BuildRepositoryResult<Option<Build>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.builds.get(&id).cloned())
    }

    async fn find_by_release_and_status(
        &self,
        release_id: ReleaseId,
        status: WorkflowStatus,
    ) -> BuildRepositoryResult<Vec<Build>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .insertion_order
            .iter()
            .filter_map(|id| state.builds.get(id))
            .filter(|build| build.release_id() == release_id && build.workflow_status() == status)
            .cloned()
            .collect())
    }

    async fn update_if_status(
        &self,
        transition: &WorkflowTransition,
    ) -> BuildRepositoryResult<Build> {
        let mut state = self.state.write().map_err(lock_error)?;
        let build_id = transition.build_id;
        let stored = state
            .builds
            .get_mut(&build_id)
            .ok_or(BuildRepositoryError::NotFound(build_id))?;
        if stored.workflow_status() != transition.expected {
            return Err(BuildRepositoryError::StaleWrite {
                build_id,
                expected: transition.expected,
                actual: stored.workflow_status(),
            });
        }
        stored.apply_workflow_transition(transition)?;
        Ok(stored.clone())
    }

    async fn update_upload_status(
        &self,
        id: BuildId,
        status: UploadStatus,
        recorded_at: DateTime<Utc>,
    ) -> BuildRepositoryResult<Build> {
        let mut state = self.state.write().map_err(lock_error)?;
        let stored = state
            .builds
            .get_mut(&id)
            .ok_or(BuildRepositoryError::NotFound(id))?;
        stored.apply_upload_status(status, recorded_at)?;
        Ok(stored.clone())
    }
}
