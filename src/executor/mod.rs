//! Test execution module
//!
//! Provides the harness core that sequences test runs.

mod runner;

pub use runner::Harness;
