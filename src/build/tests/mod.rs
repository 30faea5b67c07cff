//! Unit tests for build tracking.

mod trigger_tests;
