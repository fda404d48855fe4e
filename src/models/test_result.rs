//! Test result models
//!
//! Defines per-test outcomes and the run summary aggregation.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::TestDefinition;

/// Outcome of a single test execution.
///
/// `Blocked` is distinct from failure: the request was never sent because
/// the production safety gate rejected it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    Passed,
    Failed,
    Blocked,
}

impl TestOutcome {
    pub fn symbol(&self) -> &'static str {
        match self {
            TestOutcome::Passed => "✓",
            TestOutcome::Failed => "✗",
            TestOutcome::Blocked => "⛔",
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, TestOutcome::Blocked)
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Passed => write!(f, "PASS"),
            TestOutcome::Failed => write!(f, "FAIL"),
            TestOutcome::Blocked => write!(f, "BLOCKED"),
        }
    }
}

/// Result of a single test execution. Never mutated after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestResult {
    pub test_id: String,
    pub test_name: String,
    pub category: String,
    pub environment: String,
    pub outcome: TestOutcome,
    /// HTTP status; absent for blocked tests and transport failures
    pub status_code: Option<u16>,
    pub duration_ms: u64,
    /// Request body as it would have been sent
    pub request_body: serde_json::Value,
    /// Response body, when a response was received
    pub response_body: Option<String>,
    /// Error detail or block reason
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TestResult {
    pub fn passed(
        test: &TestDefinition,
        environment: &str,
        status_code: u16,
        duration_ms: u64,
        response_body: String,
    ) -> Self {
        Self::from_response(
            test,
            environment,
            TestOutcome::Passed,
            status_code,
            duration_ms,
            response_body,
        )
    }

    /// A response arrived but its status was outside [200, 300).
    pub fn failed(
        test: &TestDefinition,
        environment: &str,
        status_code: u16,
        duration_ms: u64,
        response_body: String,
    ) -> Self {
        Self::from_response(
            test,
            environment,
            TestOutcome::Failed,
            status_code,
            duration_ms,
            response_body,
        )
    }

    /// No response: transport failure, timeout, or token refresh failure.
    pub fn failed_with_error(
        test: &TestDefinition,
        environment: &str,
        duration_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            test_id: test.id.clone(),
            test_name: test.name.clone(),
            category: test.category.clone(),
            environment: environment.to_string(),
            outcome: TestOutcome::Failed,
            status_code: None,
            duration_ms,
            request_body: test.body.clone(),
            response_body: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    /// Rejected by the production safety gate; the request was never sent.
    pub fn blocked(test: &TestDefinition, environment: &str, reason: impl Into<String>) -> Self {
        Self {
            test_id: test.id.clone(),
            test_name: test.name.clone(),
            category: test.category.clone(),
            environment: environment.to_string(),
            outcome: TestOutcome::Blocked,
            status_code: None,
            duration_ms: 0,
            request_body: test.body.clone(),
            response_body: None,
            error: Some(reason.into()),
            timestamp: Utc::now(),
        }
    }

    fn from_response(
        test: &TestDefinition,
        environment: &str,
        outcome: TestOutcome,
        status_code: u16,
        duration_ms: u64,
        response_body: String,
    ) -> Self {
        Self {
            test_id: test.id.clone(),
            test_name: test.name.clone(),
            category: test.category.clone(),
            environment: environment.to_string(),
            outcome,
            status_code: Some(status_code),
            duration_ms,
            request_body: test.body.clone(),
            response_body: Some(response_body),
            error: None,
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}) [{}ms]",
            self.outcome.symbol(),
            self.test_name,
            self.outcome,
            self.duration_ms
        )?;
        if let Some(status) = self.status_code {
            write!(f, " HTTP {status}")?;
        }
        if let Some(err) = &self.error {
            write!(f, " - {err}")?;
        }
        Ok(())
    }
}

/// Summary of one `run_all` invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub environment: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub blocked: usize,
    /// Average over passed+failed tests; blocked tests never ran
    pub avg_response_time_ms: f64,
    pub total_duration_ms: u64,
    pub results: Vec<TestResult>,
    pub timestamp: DateTime<Utc>,
}

impl RunSummary {
    pub fn new(environment: impl Into<String>, results: Vec<TestResult>) -> Self {
        let total = results.len();
        let passed = results
            .iter()
            .filter(|r| r.outcome == TestOutcome::Passed)
            .count();
        let failed = results
            .iter()
            .filter(|r| r.outcome == TestOutcome::Failed)
            .count();
        let blocked = results
            .iter()
            .filter(|r| r.outcome == TestOutcome::Blocked)
            .count();

        let executed = passed + failed;
        let avg_response_time_ms = if executed > 0 {
            let timed: u64 = results
                .iter()
                .filter(|r| r.outcome != TestOutcome::Blocked)
                .map(|r| r.duration_ms)
                .sum();
            timed as f64 / executed as f64
        } else {
            0.0
        };

        let total_duration_ms = results.iter().map(|r| r.duration_ms).sum();

        Self {
            environment: environment.into(),
            total,
            passed,
            failed,
            blocked,
            avg_response_time_ms,
            total_duration_ms,
            results,
            timestamp: Utc::now(),
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.passed == self.total
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run against {}", self.environment)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for result in &self.results {
            writeln!(f, "  {result}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Blocked: {}",
            self.total, self.passed, self.failed, self.blocked
        )?;
        writeln!(
            f,
            "Pass Rate: {:.1}% | Avg Response: {:.1}ms",
            self.pass_rate(),
            self.avg_response_time_ms
        )
    }
}
