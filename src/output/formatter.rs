//! Output formatters for test results
//!
//! Provides table, JSON, CSV, and summary output formats.

#![allow(dead_code)]

use crate::models::{RunSummary, TestOutcome, TestResult};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Format a single test result
    pub fn format_result(&self, result: &TestResult) -> String {
        match self.format {
            OutputFormat::Table => self.format_result_table(result),
            OutputFormat::Json => serde_json::to_string(result).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(result).unwrap_or_default(),
            OutputFormat::Csv => self.format_result_csv(result),
            OutputFormat::Summary => self.format_result_summary(result),
        }
    }

    fn outcome_label(&self, outcome: TestOutcome) -> String {
        if self.colorize {
            match outcome {
                TestOutcome::Passed => "\x1b[32m✓ PASS\x1b[0m".to_string(),
                TestOutcome::Failed => "\x1b[31m✗ FAIL\x1b[0m".to_string(),
                TestOutcome::Blocked => "\x1b[33m⛔ BLOCKED\x1b[0m".to_string(),
            }
        } else {
            format!("{} {}", outcome.symbol(), outcome)
        }
    }

    fn format_result_table(&self, result: &TestResult) -> String {
        let status = result
            .status_code
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{:24} {:14} {:>5} [{:>6}ms] {}",
            result.test_id,
            self.outcome_label(result.outcome),
            status,
            result.duration_ms,
            result.error.as_deref().unwrap_or("")
        )
    }

    fn format_result_csv(&self, result: &TestResult) -> String {
        format!(
            "{},{},{},{},{},\"{}\"",
            result.test_id,
            result.category,
            result.outcome,
            result
                .status_code
                .map(|s| s.to_string())
                .unwrap_or_default(),
            result.duration_ms,
            result.error.as_deref().unwrap_or("").replace('"', "\"\"")
        )
    }

    fn format_result_summary(&self, result: &TestResult) -> String {
        format!(
            "{} {} ({}ms)",
            result.outcome.symbol(),
            result.test_name,
            result.duration_ms
        )
    }

    /// Format a run summary
    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Table => self.format_summary_table(summary),
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary).unwrap_or_default(),
            OutputFormat::Csv => self.format_summary_csv(summary),
            OutputFormat::Summary => self.format_summary_brief(summary),
        }
    }

    fn format_summary_table(&self, summary: &RunSummary) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nRun against {}\n", summary.environment));
        output.push_str(
            "──────────────────────────────────────────────────────────────────────\n",
        );

        for result in &summary.results {
            output.push_str(&format!("  {}\n", self.format_result_table(result)));
        }

        output.push_str(
            "──────────────────────────────────────────────────────────────────────\n",
        );
        output.push_str(&format!(
            "Total: {} | Pass: {} | Fail: {} | Blocked: {}\n",
            summary.total, summary.passed, summary.failed, summary.blocked
        ));
        output.push_str(&format!(
            "Pass Rate: {:.1}% | Avg Response: {:.1}ms\n",
            summary.pass_rate(),
            summary.avg_response_time_ms
        ));

        output
    }

    fn format_summary_csv(&self, summary: &RunSummary) -> String {
        let mut output =
            String::from("test_id,category,outcome,status_code,duration_ms,error\n");
        for result in &summary.results {
            output.push_str(&self.format_result_csv(result));
            output.push('\n');
        }
        output
    }

    fn format_summary_brief(&self, summary: &RunSummary) -> String {
        format!(
            "{}: {}/{} passed ({:.1}%), {} failed, {} blocked, avg {:.1}ms",
            summary.environment,
            summary.passed,
            summary.total,
            summary.pass_rate(),
            summary.failed,
            summary.blocked,
            summary.avg_response_time_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestDefinition;
    use std::collections::HashMap;

    fn sample_summary() -> RunSummary {
        let test = TestDefinition {
            id: "balance-check".to_string(),
            name: "Balance Check".to_string(),
            method: "GET".to_string(),
            endpoint: "/v1/balance".to_string(),
            headers: HashMap::new(),
            body: serde_json::Value::Null,
            category: "Payments".to_string(),
            requires_auth: true,
        };

        RunSummary::new(
            "stage-a",
            vec![
                TestResult::passed(&test, "stage-a", 200, 150, "{}".to_string()),
                TestResult::blocked(&test, "stage-a", "customer id is required"),
            ],
        )
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(OutputFormat::from_str("table"), Some(OutputFormat::Table));
        assert_eq!(
            OutputFormat::from_str("json-pretty"),
            Some(OutputFormat::JsonPretty)
        );
        assert_eq!(OutputFormat::from_str("bogus"), None);
    }

    #[test]
    fn test_json_format_is_parseable() {
        let formatter = ResultFormatter::new(OutputFormat::Json);
        let rendered = formatter.format_summary(&sample_summary());

        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["total"], 2);
        assert_eq!(parsed["blocked"], 1);
    }

    #[test]
    fn test_csv_format_has_header_and_rows() {
        let formatter = ResultFormatter::new(OutputFormat::Csv);
        let rendered = formatter.format_summary(&sample_summary());

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("test_id,"));
        assert!(lines[1].contains("PASS"));
        assert!(lines[2].contains("BLOCKED"));
    }

    #[test]
    fn test_table_format_marks_blocked() {
        let formatter = ResultFormatter::new(OutputFormat::Table).no_color();
        let rendered = formatter.format_summary(&sample_summary());

        assert!(rendered.contains("BLOCKED"));
        assert!(rendered.contains("Blocked: 1"));
    }
}
