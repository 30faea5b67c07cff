//! Shared world state for rollout conflict BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use shipwright::distribution::{
    adapters::memory::{InMemoryDistributionRepository, ScriptedStoreClient},
    domain::{Submission, SubmissionId},
    ports::DistributionRepository,
    services::{
        ConflictResolver, RolloutController, RolloutResult, SubmissionOutcome, SubmissionTracker,
    },
};
use shipwright::release::{Platform, ReleaseId};

/// Tracker type used by the BDD world.
pub type TestTracker =
    SubmissionTracker<InMemoryDistributionRepository, ScriptedStoreClient, DefaultClock>;

/// Controller type used by the BDD world.
pub type TestController =
    RolloutController<InMemoryDistributionRepository, ScriptedStoreClient, DefaultClock>;

/// Scenario world for rollout conflict behaviour tests.
pub struct RolloutWorld {
    pub release_id: ReleaseId,
    pub repository: Arc<InMemoryDistributionRepository>,
    pub tracker: TestTracker,
    pub controller: TestController,
    pub live_submission: Option<SubmissionId>,
    pub command_results: Vec<RolloutResult<SubmissionOutcome>>,
}

impl RolloutWorld {
    /// Creates a world whose tracker and controller share one lock set.
    #[must_use]
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryDistributionRepository::new());
        let store = Arc::new(ScriptedStoreClient::new());
        let clock = Arc::new(DefaultClock);
        let resolver = ConflictResolver::new();
        let tracker = SubmissionTracker::new(
            Arc::clone(&repository),
            Arc::clone(&store),
            Arc::clone(&clock),
        )
        .with_conflict_resolver(resolver.clone());
        let controller = RolloutController::new(Arc::clone(&repository), store, clock)
            .with_conflict_resolver(resolver);

        Self {
            release_id: ReleaseId::new(),
            repository,
            tracker,
            controller,
            live_submission: None,
            command_results: Vec::new(),
        }
    }

    /// Returns the submission the scenario's commands target.
    ///
    /// # Errors
    ///
    /// Returns an error when no submission went live in the scenario.
    pub fn target(&self) -> Result<SubmissionId, eyre::Report> {
        self.live_submission
            .ok_or_else(|| eyre::eyre!("missing live submission in scenario world"))
    }

    /// Loads the stored state of the targeted submission.
    ///
    /// # Errors
    ///
    /// Returns an error when the submission cannot be loaded.
    pub fn stored(&self) -> Result<Submission, eyre::Report> {
        let id = self.target()?;
        run_async(self.repository.find_submission(id))?
            .ok_or_else(|| eyre::eyre!("submission {id} missing from repository"))
    }
}

impl Default for RolloutWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> RolloutWorld {
    RolloutWorld::default()
}

/// Parses a platform name used in feature files.
///
/// # Errors
///
/// Returns an error for unknown platform names.
pub fn platform(name: &str) -> Result<Platform, eyre::Report> {
    Platform::try_from(name).map_err(|err| eyre::eyre!("invalid platform in scenario: {err}"))
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
