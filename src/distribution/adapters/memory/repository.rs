//! In-memory repository for release distributions and submissions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::distribution::{
    domain::{ReleaseDistribution, Submission, SubmissionId},
    ports::{DistributionRepository, DistributionRepositoryError, DistributionRepositoryResult},
};
use crate::release::ReleaseId;

/// Thread-safe in-memory distribution repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDistributionRepository {
    state: Arc<RwLock<InMemoryDistributionState>>,
}

#[derive(Debug, Default)]
struct InMemoryDistributionState {
    releases: HashMap<ReleaseId, ReleaseDistribution>,
    submissions: HashMap<SubmissionId, Submission>,
    insertion_order: Vec<SubmissionId>,
}

impl InMemoryDistributionState {
    fn check_revision(
        &self,
        submission: &Submission,
        expected_revision: u64,
    ) -> DistributionRepositoryResult<()> {
        let stored = self
            .submissions
            .get(&submission.id())
            .ok_or(DistributionRepositoryError::NotFound(submission.id()))?;
        if stored.revision() != expected_revision {
            return Err(DistributionRepositoryError::StaleRevision {
                submission_id: submission.id(),
                expected: expected_revision,
                actual: stored.revision(),
            });
        }
        Ok(())
    }

    fn check_new(&self, submission: &Submission) -> DistributionRepositoryResult<()> {
        if self.submissions.contains_key(&submission.id()) {
            return Err(DistributionRepositoryError::DuplicateSubmission(
                submission.id(),
            ));
        }
        Ok(())
    }

    fn insert(&mut self, submission: &Submission) {
        self.insertion_order.push(submission.id());
        self.submissions.insert(submission.id(), submission.clone());
    }
}

impl InMemoryDistributionRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> DistributionRepositoryError {
    DistributionRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl DistributionRepository for InMemoryDistributionRepository {
    async fn register_release(
        &self,
        distribution: &ReleaseDistribution,
    ) -> DistributionRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.releases.contains_key(&distribution.release_id()) {
            return Err(DistributionRepositoryError::DuplicateRelease(
                distribution.release_id(),
            ));
        }
        state
            .releases
            .insert(distribution.release_id(), distribution.clone());
        Ok(())
    }

    async fn find_release(
        &self,
        release_id: ReleaseId,
    ) -> DistributionRepositoryResult<Option<ReleaseDistribution>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.releases.get(&release_id).cloned())
    }

    async fn store_submission(&self, submission: &Submission) -> DistributionRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.check_new(submission)?;
        state.insert(submission);
        Ok(())
    }

    async fn find_submission(
        &self,
        id: SubmissionId,
    ) -> DistributionRepositoryResult<Option<Submission>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.submissions.get(&id).cloned())
    }

    async fn list_submissions(
        &self,
        release_id: ReleaseId,
    ) -> DistributionRepositoryResult<Vec<Submission>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .insertion_order
            .iter()
            .filter_map(|id| state.submissions.get(id))
            .filter(|submission| submission.release_id() == release_id)
            .cloned()
            .collect())
    }

    async fn update_submission(
        &self,
        submission: &Submission,
        expected_revision: u64,
    ) -> DistributionRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.check_revision(submission, expected_revision)?;
        state.submissions.insert(submission.id(), submission.clone());
        Ok(())
    }

    async fn supersede(
        &self,
        previous: &Submission,
        expected_revision: u64,
        replacement: &Submission,
    ) -> DistributionRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.check_revision(previous, expected_revision)?;
        state.check_new(replacement)?;
        state.submissions.insert(previous.id(), previous.clone());
        state.insert(replacement);
        Ok(())
    }
}
