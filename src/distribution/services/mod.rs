//! Application services for submission tracking and rollout control.

mod conflict;
mod remote;
mod rollout;
mod tracker;

pub use conflict::{
    ConflictResolver, PreconditionScope, RolloutConflict, RolloutGuard, RolloutPrecondition,
};
pub use remote::StoreCallError;
pub use rollout::{RolloutController, RolloutError, RolloutResult};
pub use tracker::{
    SubmissionError, SubmissionOutcome, SubmissionResult, SubmissionTracker, SubmitRequest,
};
