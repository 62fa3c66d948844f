//! Test harness modules

mod store_manager;

pub use store_manager::{memory_harness, memory_harness_with_config, sqlite_harness, TestHarness};
