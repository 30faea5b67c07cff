//! Step definitions for build reconciliation BDD scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
