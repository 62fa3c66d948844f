//! Test data modules

pub mod fixtures;
