//! Step definitions for rollout conflict BDD scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
