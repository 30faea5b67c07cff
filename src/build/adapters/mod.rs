//! Adapter implementations for build tracking ports.

pub mod memory;
