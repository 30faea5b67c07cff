//! Application services for build triggering and status reconciliation.

mod callbacks;
mod reconciler;
mod status_adapter;
mod trigger;

pub use callbacks::{CallbackDispatcher, CallbackFailure, CallbackReport};
pub use reconciler::{
    BuildPollError, BuildPollResult, BuildStatusReconciler, PollBatchSummary, ReconcileError,
    ReconcileResult, ReleasePollSummary,
};
pub use status_adapter::{
    GitHubActionsStatusAdapter, JenkinsStatusAdapter, ProviderRegistry, ProviderStatusAdapter,
    ProviderStatusError, ProviderStatusResult, map_github_queue_run, map_github_run,
    map_jenkins_build, map_jenkins_queue_item,
};
pub use trigger::{BuildTriggerService, TriggerBuildRequest, TriggerError, TriggerResult};
