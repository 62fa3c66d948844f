//! End-to-end test support for the rumina engine
//!
//! Shared harness and fixtures for the journey tests under `tests/`.

pub mod harness;
pub mod mocks;
