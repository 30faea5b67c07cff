//! In-memory pipeline integration tests.
//!
//! Tests are organized into modules by functionality:
//! - `build_pipeline_tests`: Triggering, reconciliation passes, callbacks
//! - `rollout_pipeline_tests`: Submission, rollout control, distribution

mod pipeline {
    pub mod helpers;

    mod build_pipeline_tests;
    mod rollout_pipeline_tests;
}
