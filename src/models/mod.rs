//! Data models for API testing
//!
//! This module contains all data structures used throughout the application.

mod environment;
mod test_case;
mod test_result;

pub use environment::{Environment, EnvironmentInfo, EnvironmentRegistry, Oauth2Settings};
pub use test_case::{TestDefinition, TestSuite};
pub use test_result::{RunSummary, TestOutcome, TestResult};
