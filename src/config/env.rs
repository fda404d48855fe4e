//! Environment variable configuration
//!
//! Harness-level overrides plus the per-environment OAuth2 credential
//! source. Secrets live only in process environment variables, never in
//! config files.

#![allow(dead_code)]

use std::env;

/// Environment variable prefix for harness overrides
const ENV_PREFIX: &str = "API_HARNESS";

/// Variables required for an environment's OAuth2 exchange, relative to
/// its credential prefix.
const REQUIRED_CREDENTIAL_VARS: &[&str] = &["TOKEN_URL", "CLIENT_ID", "CLIENT_SECRET"];

/// Harness configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Timeout from API_HARNESS_TIMEOUT
    pub timeout: Option<u64>,
    /// Config file from API_HARNESS_CONFIG
    pub config_file: Option<String>,
    /// Default environment from API_HARNESS_ENV
    pub environment: Option<String>,
    /// Output format from API_HARNESS_FORMAT
    pub format: Option<String>,
    /// Verbose from API_HARNESS_VERBOSE
    pub verbose: Option<bool>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            timeout: get_env_parse("TIMEOUT"),
            config_file: get_env("CONFIG"),
            environment: get_env("ENV"),
            format: get_env("FORMAT"),
            verbose: get_env_bool("VERBOSE"),
        }
    }

    pub fn has_any(&self) -> bool {
        self.timeout.is_some()
            || self.config_file.is_some()
            || self.environment.is_some()
            || self.format.is_some()
            || self.verbose.is_some()
    }

    pub fn timeout_or(&self, default: u64) -> u64 {
        self.timeout.unwrap_or(default)
    }
}

/// OAuth2 material for one environment, read from `{PREFIX}_*` variables.
#[derive(Clone)]
pub struct EnvCredentials {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for EnvCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvCredentials")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Read credentials for an environment's variable prefix.
///
/// Returns the names of missing required variables on failure, so startup
/// logs can say exactly what to export.
pub fn load_credentials(prefix: &str) -> Result<EnvCredentials, Vec<String>> {
    let missing: Vec<String> = REQUIRED_CREDENTIAL_VARS
        .iter()
        .filter(|var| env::var(format!("{prefix}_{var}")).is_err())
        .map(|var| format!("{prefix}_{var}"))
        .collect();

    if !missing.is_empty() {
        return Err(missing);
    }

    let get = |var: &str| env::var(format!("{prefix}_{var}")).unwrap_or_default();

    Ok(EnvCredentials {
        token_url: get("TOKEN_URL"),
        client_id: get("CLIENT_ID"),
        client_secret: get("CLIENT_SECRET"),
        scope: get("OAUTH_SCOPE"),
        api_key: env::var(format!("{prefix}_API_KEY")).ok(),
    })
}

/// Get environment variable with the harness prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables (useful for testing)
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    /// Set a raw variable
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.push((key.into(), value.into()));
        self
    }

    /// Set a harness override variable
    pub fn harness(self, name: &str, value: impl Into<String>) -> Self {
        let key = format!("{ENV_PREFIX}_{name}");
        self.set(key, value)
    }

    /// Set the required credential trio for a prefix
    pub fn credentials(
        self,
        prefix: &str,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.set(format!("{prefix}_TOKEN_URL"), token_url)
            .set(format!("{prefix}_CLIENT_ID"), client_id)
            .set(format!("{prefix}_CLIENT_SECRET"), client_secret)
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::default();
        assert!(config.timeout.is_none());
        assert!(!config.has_any());
        assert_eq!(config.timeout_or(30), 30);
    }

    #[test]
    fn test_credentials_complete() {
        let _guard = EnvBuilder::new()
            .credentials(
                "CRED_TEST_A",
                "https://auth.example.com/token",
                "client-id",
                "client-secret",
            )
            .set("CRED_TEST_A_OAUTH_SCOPE", "payments:read")
            .set("CRED_TEST_A_API_KEY", "key-1")
            .apply_scoped();

        let creds = load_credentials("CRED_TEST_A").unwrap();
        assert_eq!(creds.token_url, "https://auth.example.com/token");
        assert_eq!(creds.scope, "payments:read");
        assert_eq!(creds.api_key.as_deref(), Some("key-1"));
    }

    #[test]
    fn test_credentials_missing_vars_named() {
        let _guard = EnvBuilder::new()
            .set("CRED_TEST_B_TOKEN_URL", "https://auth.example.com/token")
            .apply_scoped();

        let missing = load_credentials("CRED_TEST_B").unwrap_err();
        assert_eq!(
            missing,
            vec!["CRED_TEST_B_CLIENT_ID", "CRED_TEST_B_CLIENT_SECRET"]
        );
    }

    #[test]
    fn test_credentials_debug_redacts() {
        let creds = EnvCredentials {
            token_url: "https://auth.example.com/token".to_string(),
            client_id: "client".to_string(),
            client_secret: "hunter2".to_string(),
            scope: String::new(),
            api_key: Some("key-9".to_string()),
        };

        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("key-9"));
    }

    #[test]
    fn test_scoped_guard_restores() {
        env::remove_var("CRED_TEST_C_TOKEN_URL");
        {
            let _guard = EnvBuilder::new()
                .set("CRED_TEST_C_TOKEN_URL", "https://example.com")
                .apply_scoped();
            assert!(env::var("CRED_TEST_C_TOKEN_URL").is_ok());
        }
        assert!(env::var("CRED_TEST_C_TOKEN_URL").is_err());
    }
}
