//! Outbound header composition
//!
//! Merges test headers, the environment bearer token, and environment
//! static headers into one outbound set.

use std::collections::HashMap;

use crate::models::Environment;

use super::manager::{TokenError, TokenManager};

const AUTHORIZATION: &str = "Authorization";

/// Compose the outbound header set for one request.
///
/// Precedence: explicit test headers, then the injected bearer token,
/// then environment static headers. An existing key is never overwritten.
pub async fn compose_headers(
    test_headers: &HashMap<String, String>,
    env: &Environment,
    requires_auth: bool,
    tokens: &TokenManager,
) -> Result<HashMap<String, String>, TokenError> {
    let mut headers = test_headers.clone();

    if requires_auth {
        let token = tokens.ensure_valid_token(env).await?;
        if !headers.contains_key(AUTHORIZATION) {
            headers.insert(
                AUTHORIZATION.to_string(),
                format!("Bearer {}", token.bearer()),
            );
        }
    }

    for (name, value) in env.static_header_pairs() {
        headers.entry(name).or_insert(value);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Oauth2Settings;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    use crate::auth::token::TokenState;

    fn sample_env() -> Environment {
        Environment {
            id: "stage-a".to_string(),
            name: "Stage A".to_string(),
            base_url: "https://api.example.com".to_string(),
            oauth2: Oauth2Settings::client_credentials(
                "http://127.0.0.1:1/oauth/token",
                "client",
                "secret",
            ),
            api_key: Some("env-api-key".to_string()),
            static_headers: HashMap::from([(
                "x-client-type".to_string(),
                "mobile-android".to_string(),
            )]),
            production: false,
            allowed_cids: Vec::new(),
            test_cases_file: PathBuf::from("tests.json"),
        }
    }

    /// Manager with a pre-seeded valid token, so no network is touched.
    async fn seeded_manager(env: &Environment, token: &str) -> TokenManager {
        let manager = TokenManager::new(vec![env.id.clone()], Duration::from_secs(5)).unwrap();
        let entry = manager.store().entry(&env.id).unwrap();
        *entry.lock().await =
            TokenState::with_expiry(token, Instant::now() + Duration::from_secs(600));
        manager
    }

    #[tokio::test]
    async fn test_bearer_and_static_headers_injected() {
        let env = sample_env();
        let manager = seeded_manager(&env, "tok-123").await;

        let headers = compose_headers(&HashMap::new(), &env, true, &manager)
            .await
            .unwrap();

        assert_eq!(headers["Authorization"], "Bearer tok-123");
        assert_eq!(headers["x-api-key"], "env-api-key");
        assert_eq!(headers["x-client-type"], "mobile-android");
    }

    #[tokio::test]
    async fn test_explicit_headers_win() {
        let env = sample_env();
        let manager = seeded_manager(&env, "tok-123").await;

        let test_headers = HashMap::from([
            ("Authorization".to_string(), "Bearer my-own".to_string()),
            ("x-api-key".to_string(), "override-key".to_string()),
        ]);

        let headers = compose_headers(&test_headers, &env, true, &manager)
            .await
            .unwrap();

        assert_eq!(headers["Authorization"], "Bearer my-own");
        assert_eq!(headers["x-api-key"], "override-key");
        assert_eq!(headers["x-client-type"], "mobile-android");
    }

    #[tokio::test]
    async fn test_no_auth_requested_skips_token() {
        let env = sample_env();
        // No seeded token and an unreachable endpoint: composing must not
        // need either when auth is off.
        let manager = TokenManager::new(vec![env.id.clone()], Duration::from_secs(5)).unwrap();

        let headers = compose_headers(&HashMap::new(), &env, false, &manager)
            .await
            .unwrap();

        assert!(!headers.contains_key("Authorization"));
        assert_eq!(headers["x-api-key"], "env-api-key");
    }

    #[tokio::test]
    async fn test_token_failure_propagates() {
        let env = sample_env();
        let manager = TokenManager::new(vec![env.id.clone()], Duration::from_secs(5)).unwrap();

        let result = compose_headers(&HashMap::new(), &env, true, &manager).await;
        assert!(result.is_err());
    }
}
