//! Unit tests for store distribution and rollout control.
