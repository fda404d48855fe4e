//! Results storage and retrieval
//!
//! Persists run summaries as JSON per environment, with CSV/JSON export.
//! This stores results only; tokens are never written to disk.

#![allow(dead_code)]

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::RunSummary;

/// One persisted run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredRun {
    /// Unique run ID
    pub id: String,

    /// Environment the run targeted
    pub environment: String,

    /// Timestamp when the run was saved
    pub saved_at: DateTime<Utc>,

    /// Tool version that produced the run
    pub tool_version: String,

    /// The run summary itself
    pub summary: RunSummary,
}

impl StoredRun {
    pub fn new(summary: RunSummary) -> Self {
        Self {
            id: generate_run_id(),
            environment: summary.environment.clone(),
            saved_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            summary,
        }
    }
}

/// Generate unique run ID
fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let random: u32 = rand::random::<u32>() % 10000;
    format!("{timestamp}_{random:04}")
}

/// Results storage manager
pub struct ResultsStorage {
    /// Base directory for results
    base_dir: PathBuf,
}

impl ResultsStorage {
    /// Create a new results storage
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Create with default directory
    pub fn default_dir() -> Self {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("api-harness")
            .join("results");
        Self::new(base_dir)
    }

    fn environment_dir(&self, environment: &str) -> PathBuf {
        self.base_dir.join(environment)
    }

    fn run_path(&self, environment: &str, run_id: &str) -> PathBuf {
        self.environment_dir(environment).join(format!("{run_id}.json"))
    }

    /// Save a run
    pub fn save(&self, run: &StoredRun) -> Result<PathBuf> {
        let env_dir = self.environment_dir(&run.environment);
        fs::create_dir_all(&env_dir)?;

        let path = self.run_path(&run.environment, &run.id);
        let file = File::create(&path).context("Failed to create results file")?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, run).context("Failed to write results")?;

        info!("Saved run results to {}", path.display());
        Ok(path)
    }

    /// Load a run
    pub fn load(&self, environment: &str, run_id: &str) -> Result<StoredRun> {
        let path = self.run_path(environment, run_id);
        self.load_from_path(&path)
    }

    /// Load from a specific path
    pub fn load_from_path(&self, path: &Path) -> Result<StoredRun> {
        let file = File::open(path).context("Failed to open results file")?;
        let reader = BufReader::new(file);
        let run = serde_json::from_reader(reader).context("Failed to parse results")?;
        debug!("Loaded run results from {}", path.display());
        Ok(run)
    }

    /// Load all runs for an environment, newest first
    pub fn load_environment(&self, environment: &str) -> Result<Vec<StoredRun>> {
        let env_dir = self.environment_dir(environment);
        if !env_dir.exists() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in fs::read_dir(&env_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match self.load_from_path(&path) {
                    Ok(run) => runs.push(run),
                    Err(e) => {
                        debug!("Failed to load {}: {}", path.display(), e);
                    }
                }
            }
        }

        runs.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(runs)
    }

    /// List environments with stored results
    pub fn list_environments(&self) -> Result<Vec<String>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut environments = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    environments.push(name.to_string());
                }
            }
        }

        environments.sort();
        Ok(environments)
    }

    /// Latest run for an environment
    pub fn latest(&self, environment: &str) -> Result<Option<StoredRun>> {
        let runs = self.load_environment(environment)?;
        Ok(runs.into_iter().next())
    }

    /// Delete a run
    pub fn delete(&self, environment: &str, run_id: &str) -> Result<()> {
        let path = self.run_path(environment, run_id);
        if path.exists() {
            fs::remove_file(&path)?;
            info!("Deleted results: {}", path.display());
        }
        Ok(())
    }

    /// Export a run to a file
    pub fn export(&self, run: &StoredRun, path: &Path, format: ExportFormat) -> Result<()> {
        match format {
            ExportFormat::Json => {
                let file = File::create(path)?;
                let writer = BufWriter::new(file);
                serde_json::to_writer_pretty(writer, run)?;
            }
            ExportFormat::Csv => {
                let mut writer = csv::Writer::from_path(path)?;

                writer.write_record([
                    "test_id",
                    "test_name",
                    "category",
                    "environment",
                    "outcome",
                    "status_code",
                    "duration_ms",
                    "error",
                ])?;

                for result in &run.summary.results {
                    writer.write_record([
                        result.test_id.clone(),
                        result.test_name.clone(),
                        result.category.clone(),
                        result.environment.clone(),
                        result.outcome.to_string(),
                        result
                            .status_code
                            .map(|s| s.to_string())
                            .unwrap_or_default(),
                        result.duration_ms.to_string(),
                        result.error.clone().unwrap_or_default(),
                    ])?;
                }
                writer.flush()?;
            }
        }

        info!("Exported results to {}", path.display());
        Ok(())
    }
}

/// Export format
#[derive(Clone, Copy, Debug)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_str)
    }
}
