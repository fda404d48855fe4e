//! HTTP client module
//!
//! Provides the single-attempt HTTP executor used by the test runner.

mod client;

pub use client::{ApiRequest, ApiResponse, HttpClient, HttpError};
