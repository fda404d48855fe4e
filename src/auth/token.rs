//! Per-environment token state
//!
//! Holds the cached bearer token and its expiry for each environment.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Lead time before expiry at which a token is refreshed.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Cached OAuth2 token for one environment.
///
/// Both fields are always replaced together by a successful refresh; a
/// failed refresh leaves the pair untouched.
#[derive(Clone, Default)]
pub struct TokenState {
    access_token: String,
    expires_at: Option<Instant>,
}

impl TokenState {
    /// True when no token has ever been obtained.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty()
    }

    /// True when the token will still be valid `margin` from now.
    pub fn valid_for(&self, margin: Duration) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        match self.expires_at {
            Some(at) => at
                .checked_duration_since(Instant::now())
                .map(|remaining| remaining > margin)
                .unwrap_or(false),
            None => false,
        }
    }

    /// Replace the token and expiry as one unit.
    pub fn install(&mut self, access_token: String, ttl: Duration) {
        self.access_token = access_token;
        self.expires_at = Some(Instant::now() + ttl);
    }

    /// The raw bearer token.
    pub fn bearer(&self) -> &str {
        &self.access_token
    }

    /// Remaining validity, if a token is held.
    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    #[cfg(test)]
    pub fn with_expiry(access_token: impl Into<String>, expires_at: Instant) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: Some(expires_at),
        }
    }
}

impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenState")
            .field(
                "access_token",
                if self.access_token.is_empty() {
                    &"<none>"
                } else {
                    &"[REDACTED]"
                },
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Per-environment token slots, created once at startup.
///
/// Each environment owns an independent mutex, so a refresh in one
/// environment never blocks another.
#[derive(Debug, Default)]
pub struct TokenStore {
    entries: HashMap<String, Arc<Mutex<TokenState>>>,
}

impl TokenStore {
    pub fn new(environment_ids: impl IntoIterator<Item = String>) -> Self {
        let entries = environment_ids
            .into_iter()
            .map(|id| (id, Arc::new(Mutex::new(TokenState::default()))))
            .collect();
        Self { entries }
    }

    /// The mutex guarding one environment's token state.
    pub fn entry(&self, environment_id: &str) -> Option<Arc<Mutex<TokenState>>> {
        self.entries.get(environment_id).cloned()
    }

    /// A point-in-time copy of one environment's state.
    pub async fn snapshot(&self, environment_id: &str) -> Option<TokenState> {
        match self.entries.get(environment_id) {
            Some(entry) => Some(entry.lock().await.clone()),
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state_never_valid() {
        let state = TokenState::default();
        assert!(state.is_empty());
        assert!(!state.valid_for(REFRESH_MARGIN));
        assert!(!state.valid_for(Duration::ZERO));
    }

    #[test]
    fn test_valid_for_margin_boundaries() {
        let now = Instant::now();

        // Expires in 30s: inside the 60s margin, must refresh.
        let expiring = TokenState::with_expiry("abc", now + Duration::from_secs(30));
        assert!(!expiring.valid_for(REFRESH_MARGIN));

        // Expires in 5 minutes: well outside the margin, reusable.
        let fresh = TokenState::with_expiry("abc", now + Duration::from_secs(300));
        assert!(fresh.valid_for(REFRESH_MARGIN));
    }

    #[test]
    fn test_install_replaces_pair() {
        let mut state = TokenState::default();
        state.install("first".to_string(), Duration::from_secs(300));
        assert_eq!(state.bearer(), "first");
        assert!(state.valid_for(REFRESH_MARGIN));

        state.install("second".to_string(), Duration::from_secs(600));
        assert_eq!(state.bearer(), "second");
        let remaining = state.expires_in().unwrap();
        assert!(remaining > Duration::from_secs(500));
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut state = TokenState::default();
        state.install("super-secret".to_string(), Duration::from_secs(300));
        let debug = format!("{state:?}");
        assert!(!debug.contains("super-secret"));
    }

    #[tokio::test]
    async fn test_store_entries_are_independent() {
        let store = TokenStore::new(vec!["stage-a".to_string(), "prod-a".to_string()]);
        assert_eq!(store.len(), 2);

        {
            let entry = store.entry("stage-a").unwrap();
            let mut state = entry.lock().await;
            state.install("stage-token".to_string(), Duration::from_secs(300));
        }

        let stage = store.snapshot("stage-a").await.unwrap();
        let prod = store.snapshot("prod-a").await.unwrap();
        assert_eq!(stage.bearer(), "stage-token");
        assert!(prod.is_empty());
        assert!(store.snapshot("missing").await.is_none());
    }
}
