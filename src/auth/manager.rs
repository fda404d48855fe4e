//! OAuth2 token lifecycle manager
//!
//! Performs the client-credentials exchange and keeps each environment's
//! cached token valid ahead of use.

#![allow(dead_code)]

use futures::future::join_all;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{Environment, Oauth2Settings};

use super::token::{TokenState, TokenStore, REFRESH_MARGIN};

/// Default TTL when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: u64 = 300;

/// Connection timeout for the token endpoint client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Token refresh errors.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("no token slot for environment: {0}")]
    UnknownEnvironment(String),

    #[error("token endpoint request failed: {0}")]
    Transport(String),

    #[error("token endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed token response: {0}")]
    MalformedResponse(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Token endpoint response, per RFC 6749 §5.1.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

fn default_expires_in() -> u64 {
    DEFAULT_EXPIRES_IN_SECS
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Manages one token lifecycle per environment.
pub struct TokenManager {
    store: TokenStore,
    http: reqwest::Client,
    margin: Duration,
}

impl TokenManager {
    /// Create a manager with one token slot per environment id.
    pub fn new(
        environment_ids: impl IntoIterator<Item = String>,
        timeout: Duration,
    ) -> Result<Self, TokenError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| TokenError::Client(e.to_string()))?;

        Ok(Self {
            store: TokenStore::new(environment_ids),
            http,
            margin: REFRESH_MARGIN,
        })
    }

    /// Override the refresh margin.
    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    /// The underlying store; used for status reporting.
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Guarantee a token valid for at least the refresh margin.
    ///
    /// Check and refresh run as one critical section under the
    /// environment's mutex: concurrent callers for the same environment
    /// trigger at most one refresh, and readers can never observe a token
    /// from one refresh paired with the expiry of another. A failed
    /// refresh leaves the cached state untouched.
    pub async fn ensure_valid_token(&self, env: &Environment) -> Result<TokenState, TokenError> {
        let entry = self
            .store
            .entry(&env.id)
            .ok_or_else(|| TokenError::UnknownEnvironment(env.id.clone()))?;

        let mut state = entry.lock().await;
        if state.valid_for(self.margin) {
            debug!("Reusing cached token for {}", env.id);
            return Ok(state.clone());
        }

        if state.is_empty() {
            info!("No token for {}, requesting one", env.id);
        } else {
            info!("Token for {} expires soon, refreshing", env.id);
        }

        let fresh = self.request_token(&env.oauth2).await?;
        let ttl = Duration::from_secs(fresh.expires_in);
        state.install(fresh.access_token, ttl);
        info!("Token for {} refreshed, valid for {}s", env.id, fresh.expires_in);

        Ok(state.clone())
    }

    /// One client-credentials exchange against the token endpoint.
    async fn request_token(&self, oauth2: &Oauth2Settings) -> Result<TokenResponse, TokenError> {
        let mut form: Vec<(&str, &str)> = vec![("grant_type", oauth2.grant_type.as_str())];
        if !oauth2.scope.is_empty() {
            form.push(("scope", oauth2.scope.as_str()));
        }

        debug!("Requesting token from {}", oauth2.token_url);

        let response = self
            .http
            .post(&oauth2.token_url)
            .basic_auth(&oauth2.client_id, Some(&oauth2.client_secret))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| TokenError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| TokenError::MalformedResponse(e.to_string()))
    }

    /// Proactively refresh every environment concurrently.
    ///
    /// Lifecycles are independent: a failure in one environment is
    /// reported for that environment only.
    pub async fn warm<'a>(
        &self,
        environments: impl IntoIterator<Item = &'a Environment>,
    ) -> Vec<(String, Result<TokenState, TokenError>)> {
        let futures: Vec<_> = environments
            .into_iter()
            .map(|env| async move {
                let result = self.ensure_valid_token(env).await;
                if let Err(e) = &result {
                    warn!("Token warm-up failed for {}: {}", env.id, e);
                }
                (env.id.clone(), result)
            })
            .collect();

        join_all(futures).await
    }
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("environments", &self.store.len())
            .field("margin", &self.margin)
            .finish()
    }
}
