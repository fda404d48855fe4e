//! Configuration module
//!
//! Loads the environments file, resolves credentials from the process
//! environment, and builds the validated environment registry.

#![allow(dead_code)]

use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Environment, EnvironmentRegistry, Oauth2Settings};

mod env;
mod file;

pub use env::{load_credentials, EnvBuilder, EnvConfig, EnvCredentials, EnvGuard};
pub use file::{EnvironmentEntry, EnvironmentsFile};

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration-time errors. Fatal for the affected environment only;
/// the rest of the registry stays usable.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment {id}: missing credential variables: {vars}")]
    MissingCredentials { id: String, vars: String },
}

impl ConfigError {
    /// Id of the environment this error disabled.
    pub fn environment_id(&self) -> &str {
        match self {
            ConfigError::MissingCredentials { id, .. } => id,
        }
    }
}

/// Build the registry from a loaded environments file.
///
/// Environments with incomplete credentials are skipped and reported;
/// they never become selectable.
pub fn build_registry(
    file: &EnvironmentsFile,
    base_dir: &Path,
) -> (EnvironmentRegistry, Vec<ConfigError>) {
    let mut environments = Vec::new();
    let mut errors = Vec::new();

    for entry in &file.environments {
        match load_credentials(&entry.env_prefix) {
            Ok(creds) => {
                info!("Loaded OAuth2 credentials for {}", entry.id);
                environments.push(build_environment(entry, creds, file, base_dir));
            }
            Err(missing) => {
                let error = ConfigError::MissingCredentials {
                    id: entry.id.clone(),
                    vars: missing.join(", "),
                };
                warn!("{error}");
                errors.push(error);
            }
        }
    }

    (EnvironmentRegistry::new(environments), errors)
}

fn build_environment(
    entry: &EnvironmentEntry,
    creds: EnvCredentials,
    file: &EnvironmentsFile,
    base_dir: &Path,
) -> Environment {
    Environment {
        id: entry.id.clone(),
        name: entry.name.clone(),
        base_url: entry.base_url.clone(),
        oauth2: Oauth2Settings::client_credentials(
            creds.token_url,
            creds.client_id,
            creds.client_secret,
        )
        .with_scope(creds.scope),
        api_key: creds.api_key,
        static_headers: entry.merged_headers(&file.headers),
        production: entry.production,
        allowed_cids: entry.allowed_cids.clone(),
        test_cases_file: entry.suite_path(base_dir),
    }
}
