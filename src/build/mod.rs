//! CI/CD build tracking for release pipelines.
//!
//! Builds are created when a workflow trigger succeeds and are advanced
//! through the canonical workflow state machine by polling the provider that
//! runs them. Status changes fan out to external release tasks through a
//! deduplicated callback. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
