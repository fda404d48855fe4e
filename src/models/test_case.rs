//! Test case definitions
//!
//! Declarative API test cases loaded from suite files.

#![allow(dead_code)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use super::Environment;

/// A single declarative API test case.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestDefinition {
    /// Unique test identifier within a suite
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// HTTP method (GET, POST, PUT, DELETE)
    pub method: String,
    /// Request path appended to the base URL
    pub endpoint: String,
    /// Test-specific headers; highest precedence when composing
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// JSON request body; sent as query params for GET
    #[serde(default)]
    pub body: serde_json::Value,
    /// Category used for grouping in listings
    #[serde(default = "default_category")]
    pub category: String,
    /// Whether a bearer token is attached to the request
    #[serde(default = "default_true")]
    pub requires_auth: bool,
}

fn default_category() -> String {
    "Uncategorized".to_string()
}

fn default_true() -> bool {
    true
}

impl fmt::Display for TestDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{} {}]", self.name, self.method, self.endpoint)
    }
}

/// Ordered collection of test cases for one environment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TestSuite {
    /// Base URL override; falls back to the environment's base URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// Test cases in execution order
    #[serde(default)]
    pub test_cases: Vec<TestDefinition>,
}

impl TestSuite {
    /// Load a suite from a JSON or YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read test suite: {}", path.display()))?;

        let suite: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML test suite: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON test suite: {}", path.display()))?
        };

        suite.validate()?;
        Ok(suite)
    }

    /// Reject suites with duplicate test ids.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for case in &self.test_cases {
            if !seen.insert(case.id.as_str()) {
                anyhow::bail!("Duplicate test id in suite: {}", case.id);
            }
        }
        Ok(())
    }

    /// Find a test case by id.
    pub fn find(&self, test_id: &str) -> Option<&TestDefinition> {
        self.test_cases.iter().find(|t| t.id == test_id)
    }

    /// Base URL for requests, preferring the suite override.
    pub fn resolve_base_url<'a>(&'a self, env: &'a Environment) -> &'a str {
        self.base_url.as_deref().unwrap_or(&env.base_url)
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for case in &self.test_cases {
            if !seen.contains(&case.category.as_str()) {
                seen.push(case.category.as_str());
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.test_cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.test_cases.is_empty()
    }
}

fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SUITE_JSON: &str = r#"{
        "base_url": "https://api.example.com",
        "test_cases": [
            {
                "id": "balance-check",
                "name": "Balance Check",
                "method": "GET",
                "endpoint": "/v1/balance",
                "category": "Payments"
            },
            {
                "id": "create-payment",
                "name": "Create Payment",
                "method": "POST",
                "endpoint": "/v1/payments",
                "body": {"cid": 4547, "amount": 10},
                "headers": {"x-request-source": "harness"}
            }
        ]
    }"#;

    #[test]
    fn test_suite_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("suite.json");
        std::fs::write(&path, SUITE_JSON).unwrap();

        let suite = TestSuite::load(&path).unwrap();
        assert_eq!(suite.len(), 2);
        assert_eq!(suite.base_url.as_deref(), Some("https://api.example.com"));

        let test = suite.find("create-payment").unwrap();
        assert_eq!(test.method, "POST");
        assert_eq!(test.body["cid"], 4547);
        assert_eq!(test.headers["x-request-source"], "harness");
    }

    #[test]
    fn test_definition_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("suite.json");
        std::fs::write(&path, SUITE_JSON).unwrap();

        let suite = TestSuite::load(&path).unwrap();
        let test = suite.find("balance-check").unwrap();

        assert!(test.requires_auth);
        assert!(test.body.is_null());
        assert!(test.headers.is_empty());
        assert_eq!(suite.find("create-payment").unwrap().category, "Uncategorized");
    }

    #[test]
    fn test_suite_load_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("suite.yaml");
        std::fs::write(
            &path,
            "test_cases:\n  - id: ping\n    name: Ping\n    method: GET\n    endpoint: /ping\n",
        )
        .unwrap();

        let suite = TestSuite::load(&path).unwrap();
        assert_eq!(suite.len(), 1);
        assert!(suite.base_url.is_none());
    }

    #[test]
    fn test_duplicate_test_ids_rejected() {
        let suite = TestSuite {
            base_url: None,
            test_cases: vec![
                TestDefinition {
                    id: "dup".to_string(),
                    name: "First".to_string(),
                    method: "GET".to_string(),
                    endpoint: "/a".to_string(),
                    headers: HashMap::new(),
                    body: serde_json::Value::Null,
                    category: default_category(),
                    requires_auth: true,
                },
                TestDefinition {
                    id: "dup".to_string(),
                    name: "Second".to_string(),
                    method: "GET".to_string(),
                    endpoint: "/b".to_string(),
                    headers: HashMap::new(),
                    body: serde_json::Value::Null,
                    category: default_category(),
                    requires_auth: true,
                },
            ],
        };

        assert!(suite.validate().is_err());
    }

    #[test]
    fn test_categories_in_order() {
        let suite: TestSuite = serde_json::from_str(SUITE_JSON).unwrap();
        assert_eq!(suite.categories(), vec!["Payments", "Uncategorized"]);
    }
}
