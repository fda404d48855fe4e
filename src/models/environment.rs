//! Target environment models
//!
//! Defines the validated environment records and the registry that owns them.

#![allow(dead_code)]

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// OAuth2 client-credentials settings for one environment.
#[derive(Clone)]
pub struct Oauth2Settings {
    /// Token endpoint URL
    pub token_url: String,
    /// OAuth2 client id
    pub client_id: String,
    /// OAuth2 client secret
    pub client_secret: String,
    /// Grant type, normally `client_credentials`
    pub grant_type: String,
    /// Requested scope, may be empty
    pub scope: String,
}

impl fmt::Debug for Oauth2Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Oauth2Settings")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("grant_type", &self.grant_type)
            .field("scope", &self.scope)
            .finish()
    }
}

impl Oauth2Settings {
    /// Create settings with the client-credentials grant.
    pub fn client_credentials(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            grant_type: "client_credentials".to_string(),
            scope: String::new(),
        }
    }

    /// Set the requested scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }
}

/// A validated target environment.
///
/// Immutable after load; credentials are resolved once at startup and an
/// environment missing them never reaches the registry.
#[derive(Clone, Debug)]
pub struct Environment {
    /// Unique identifier, e.g. `rapid-prod`
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Base URL for API requests
    pub base_url: String,
    /// OAuth2 settings for the token endpoint
    pub oauth2: Oauth2Settings,
    /// Environment API key, sent as `x-api-key`
    pub api_key: Option<String>,
    /// Static headers injected into every request (e.g. `x-client-type`)
    pub static_headers: HashMap<String, String>,
    /// Production flag; enables the safety gate
    pub production: bool,
    /// Customer ids permitted in production request bodies
    pub allowed_cids: Vec<i64>,
    /// Path to the test suite file for this environment
    pub test_cases_file: PathBuf,
}

impl Environment {
    /// Static header pairs in injection order: API key first, then the
    /// configured header map.
    pub fn static_header_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(key) = &self.api_key {
            pairs.push(("x-api-key".to_string(), key.clone()));
        }
        for (name, value) in &self.static_headers {
            pairs.push((name.clone(), value.clone()));
        }
        pairs
    }

    /// Secret-free projection for listings.
    pub fn info(&self) -> EnvironmentInfo {
        EnvironmentInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            base_url: self.base_url.clone(),
            production: self.production,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Environment metadata exposed to callers. Carries no credentials.
#[derive(Clone, Debug, Serialize)]
pub struct EnvironmentInfo {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub production: bool,
}

/// Registry of all environments that passed validation at startup.
#[derive(Clone, Debug, Default)]
pub struct EnvironmentRegistry {
    environments: Vec<Arc<Environment>>,
}

impl EnvironmentRegistry {
    /// Build a registry from validated environments, preserving order.
    pub fn new(environments: Vec<Environment>) -> Self {
        Self {
            environments: environments.into_iter().map(Arc::new).collect(),
        }
    }

    /// Look up an environment by id.
    pub fn get(&self, id: &str) -> Option<&Arc<Environment>> {
        self.environments.iter().find(|e| e.id == id)
    }

    /// All environment ids in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.environments.iter().map(|e| e.id.clone()).collect()
    }

    /// Secret-free metadata for every environment.
    pub fn infos(&self) -> Vec<EnvironmentInfo> {
        self.environments.iter().map(|e| e.info()).collect()
    }

    /// Iterate over registered environments.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Environment>> {
        self.environments.iter()
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }
}
