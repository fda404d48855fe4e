//! Environments file management
//!
//! Handles finding, loading, and validating the environments file that
//! declares every target the harness can run against.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environments file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./environments.yaml",
    "./environments.yml",
    "./environments.json",
    "./.api-harness/environments.yaml",
    "~/.config/api-harness/environments.yaml",
];

/// Full environments file structure
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnvironmentsFile {
    /// Version of config file format
    #[serde(default = "default_version")]
    pub version: String,

    /// Default static headers merged under every environment's own
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Declared environments
    #[serde(default)]
    pub environments: Vec<EnvironmentEntry>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for EnvironmentsFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            headers: HashMap::new(),
            environments: Vec::new(),
        }
    }
}

impl EnvironmentsFile {
    /// Find an environments file in standard locations
    pub fn find() -> Option<PathBuf> {
        for location in CONFIG_LOCATIONS {
            let path = expand_path(location);
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    /// Load from the first standard location, or fail with guidance
    pub fn load_default() -> Result<(Self, PathBuf)> {
        let path = Self::find().context(
            "No environments file found; run `api-harness config init` or pass --config",
        )?;
        let file = Self::load(&path)?;
        Ok((file, path))
    }

    /// Load from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read environments file: {}", path.display()))?;

        let file: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content).with_context(|| {
                format!("Failed to parse YAML environments file: {}", path.display())
            })?
        } else {
            serde_json::from_str(&content).with_context(|| {
                format!("Failed to parse JSON environments file: {}", path.display())
            })?
        };

        file.validate()?;
        Ok(file)
    }

    /// Save to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize environments file")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize environments file")?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write environments file: {}", path.display()))?;

        Ok(())
    }

    /// Validate structure
    pub fn validate(&self) -> Result<()> {
        if !["1.0", "1.1"].contains(&self.version.as_str()) {
            anyhow::bail!("Unsupported environments file version: {}", self.version);
        }

        let mut seen = std::collections::HashSet::new();
        for entry in &self.environments {
            if !seen.insert(entry.id.as_str()) {
                anyhow::bail!("Duplicate environment id: {}", entry.id);
            }
            if !entry.base_url.starts_with("http://") && !entry.base_url.starts_with("https://") {
                anyhow::bail!(
                    "Environment {} has a base_url without an http(s) scheme: {}",
                    entry.id,
                    entry.base_url
                );
            }
        }

        Ok(())
    }

    /// Get environment entry by id
    pub fn environment(&self, id: &str) -> Option<&EnvironmentEntry> {
        self.environments.iter().find(|e| e.id == id)
    }

    /// Generate example file
    pub fn example() -> Self {
        Self {
            version: "1.0".to_string(),
            headers: HashMap::from([(
                "x-client-type".to_string(),
                "mobile-android".to_string(),
            )]),
            environments: vec![
                EnvironmentEntry {
                    id: "rapid-stage".to_string(),
                    name: "Rapid Staging".to_string(),
                    base_url: "https://stage.example.com".to_string(),
                    env_prefix: "RAPID_STAGE".to_string(),
                    production: false,
                    allowed_cids: Vec::new(),
                    test_cases_file: "test-cases/rapid-stage.json".to_string(),
                    headers: HashMap::new(),
                },
                EnvironmentEntry {
                    id: "rapid-prod".to_string(),
                    name: "Rapid Production".to_string(),
                    base_url: "https://api.example.com".to_string(),
                    env_prefix: "RAPID_PROD".to_string(),
                    production: true,
                    allowed_cids: vec![4547, 1995],
                    test_cases_file: "test-cases/rapid-prod.json".to_string(),
                    headers: HashMap::new(),
                },
            ],
        }
    }
}

/// One declared environment. Credentials are not here; they come from
/// `{env_prefix}_*` process environment variables.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnvironmentEntry {
    /// Unique identifier, e.g. "rapid-prod"
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Base URL for API requests
    pub base_url: String,

    /// Prefix for credential environment variables
    pub env_prefix: String,

    /// Production flag; enables the safety gate
    #[serde(default)]
    pub production: bool,

    /// Customer ids permitted in production request bodies
    #[serde(default)]
    pub allowed_cids: Vec<i64>,

    /// Test suite file, relative to this environments file
    pub test_cases_file: String,

    /// Environment-specific static headers; override file-level defaults
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl EnvironmentEntry {
    /// Resolve the test suite path relative to the environments file.
    pub fn suite_path(&self, base_dir: &Path) -> PathBuf {
        let path = Path::new(&self.test_cases_file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Static headers for this environment: file-level defaults with
    /// per-environment overrides applied on top.
    pub fn merged_headers(&self, defaults: &HashMap<String, String>) -> HashMap<String, String> {
        let mut merged = defaults.clone();
        for (name, value) in &self.headers {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_file() {
        let file = EnvironmentsFile::default();
        assert_eq!(file.version, "1.0");
        assert!(file.environments.is_empty());
    }

    #[test]
    fn test_example_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("environments.yaml");

        let file = EnvironmentsFile::example();
        file.save(&path).unwrap();

        let loaded = EnvironmentsFile::load(&path).unwrap();
        assert_eq!(loaded.environments.len(), 2);

        let prod = loaded.environment("rapid-prod").unwrap();
        assert!(prod.production);
        assert_eq!(prod.allowed_cids, vec![4547, 1995]);
        assert_eq!(loaded.headers["x-client-type"], "mobile-android");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut file = EnvironmentsFile::example();
        let mut dup = file.environments[0].clone();
        dup.name = "Copy".to_string();
        file.environments.push(dup);

        assert!(file.validate().is_err());
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let mut file = EnvironmentsFile::example();
        file.environments[0].base_url = "ftp://example.com".to_string();
        assert!(file.validate().is_err());
    }

    #[test]
    fn test_suite_path_resolution() {
        let file = EnvironmentsFile::example();
        let entry = &file.environments[0];
        let resolved = entry.suite_path(Path::new("/etc/api-harness"));
        assert_eq!(
            resolved,
            PathBuf::from("/etc/api-harness/test-cases/rapid-stage.json")
        );
    }

    #[test]
    fn test_merged_headers_precedence() {
        let mut entry = EnvironmentsFile::example().environments[0].clone();
        entry
            .headers
            .insert("x-client-type".to_string(), "web".to_string());

        let defaults = HashMap::from([
            ("x-client-type".to_string(), "mobile-android".to_string()),
            ("x-trace".to_string(), "on".to_string()),
        ]);

        let merged = entry.merged_headers(&defaults);
        assert_eq!(merged["x-client-type"], "web");
        assert_eq!(merged["x-trace"], "on");
    }

    #[test]
    fn test_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("environments.json");
        EnvironmentsFile::example().save(&path).unwrap();

        let loaded = EnvironmentsFile::load(&path).unwrap();
        assert_eq!(loaded.version, "1.0");
    }
}
