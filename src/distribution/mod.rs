//! Store distribution and phased rollout control for releases.
//!
//! Each release targets a set of platforms. Store submissions per platform
//! move through review and release, and their exposure is steered by
//! operators or by the store's own phased schedule. The release-level
//! distribution status is derived from the current submissions after every
//! change. The module follows hexagonal architecture:
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
