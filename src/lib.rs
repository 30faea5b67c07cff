//! Shipwright: mobile release build tracking and store rollout control.
//!
//! This crate tracks the CI workflows that build a release, reconciles their
//! status with the CI providers, and steers the resulting store submissions
//! from upload through review to a staged, controllable rollout.
//!
//! # Architecture
//!
//! Shipwright follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (stores, CI providers)
//!
//! # Modules
//!
//! - [`build`]: CI workflow triggering and status reconciliation
//! - [`distribution`]: Store submissions, phased rollouts and conflict control
//! - [`config`]: Engine timeouts and concurrency limits
//! - [`release`]: Identifiers shared by both halves

pub mod build;
pub mod config;
pub mod distribution;
pub mod release;
