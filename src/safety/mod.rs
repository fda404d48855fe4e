//! Production safety gate
//!
//! Blocks requests whose customer id is missing or not allow-listed when
//! the target environment is flagged as production. Runs before any token
//! work, so blocked requests never consume a refresh or reach the network.

#![allow(dead_code)]

use serde_json::Value;
use tracing::debug;

use crate::models::Environment;

/// Request-body field holding the customer id.
pub const SAFETY_FIELD: &str = "cid";

/// Verdict of the safety gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    Blocked(String),
}

impl GateDecision {
    pub fn is_blocked(&self) -> bool {
        matches!(self, GateDecision::Blocked(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            GateDecision::Allowed => None,
            GateDecision::Blocked(reason) => Some(reason),
        }
    }
}

/// Check a request body against the environment's allow-list.
///
/// Pure function of (environment, body). Non-production environments are
/// always allowed.
pub fn check_allowed(env: &Environment, body: &Value) -> GateDecision {
    if !env.production {
        return GateDecision::Allowed;
    }

    let Some(raw) = body.get(SAFETY_FIELD) else {
        return GateDecision::Blocked(format!(
            "customer id is required for production environment {}",
            env.id
        ));
    };

    let Some(cid) = coerce_cid(raw) else {
        return GateDecision::Blocked(format!("invalid customer id format: {raw}"));
    };

    if !env.allowed_cids.contains(&cid) {
        return GateDecision::Blocked(format!(
            "customer id {cid} is not permitted in production"
        ));
    }

    debug!("Customer id {} permitted for {}", cid, env.id);
    GateDecision::Allowed
}

/// Accepts JSON integers and integer strings, nothing else.
fn coerce_cid(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Oauth2Settings;
    use serde_json::json;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn env(production: bool, allowed_cids: Vec<i64>) -> Environment {
        Environment {
            id: if production { "prod-a" } else { "stage-a" }.to_string(),
            name: "Test".to_string(),
            base_url: "https://api.example.com".to_string(),
            oauth2: Oauth2Settings::client_credentials(
                "https://auth.example.com/token",
                "client",
                "secret",
            ),
            api_key: None,
            static_headers: HashMap::new(),
            production,
            allowed_cids,
            test_cases_file: PathBuf::from("tests.json"),
        }
    }

    #[test]
    fn test_allow_listed_cid_is_allowed() {
        let env = env(true, vec![4547, 1995]);
        let decision = check_allowed(&env, &json!({"cid": 4547, "amount": 10}));
        assert_eq!(decision, GateDecision::Allowed);
    }

    #[test]
    fn test_unlisted_cid_is_blocked() {
        let env = env(true, vec![4547, 1995]);
        let decision = check_allowed(&env, &json!({"cid": 9999}));
        assert!(decision.is_blocked());
        assert!(decision.reason().unwrap().contains("not permitted"));
    }

    #[test]
    fn test_missing_cid_is_blocked() {
        let env = env(true, vec![4547, 1995]);
        let decision = check_allowed(&env, &json!({}));
        assert!(decision.is_blocked());
        assert!(decision.reason().unwrap().contains("required"));
    }

    #[test]
    fn test_null_body_is_blocked_in_production() {
        let env = env(true, vec![4547]);
        assert!(check_allowed(&env, &Value::Null).is_blocked());
    }

    #[test]
    fn test_non_numeric_cid_is_blocked() {
        let env = env(true, vec![4547, 1995]);
        let decision = check_allowed(&env, &json!({"cid": "not-a-number"}));
        assert!(decision.is_blocked());
        assert!(decision.reason().unwrap().contains("invalid"));

        assert!(check_allowed(&env, &json!({"cid": [4547]})).is_blocked());
        assert!(check_allowed(&env, &json!({"cid": 4547.5})).is_blocked());
    }

    #[test]
    fn test_string_cid_coerces() {
        let env = env(true, vec![4547, 1995]);
        assert_eq!(
            check_allowed(&env, &json!({"cid": "1995"})),
            GateDecision::Allowed
        );
    }

    #[test]
    fn test_non_production_never_blocks() {
        let env = env(false, Vec::new());
        assert_eq!(
            check_allowed(&env, &json!({"cid": 9999})),
            GateDecision::Allowed
        );
        assert_eq!(check_allowed(&env, &json!({})), GateDecision::Allowed);
        assert_eq!(check_allowed(&env, &Value::Null), GateDecision::Allowed);
    }

    #[test]
    fn test_empty_allow_list_blocks_everything() {
        let env = env(true, Vec::new());
        assert!(check_allowed(&env, &json!({"cid": 4547})).is_blocked());
    }
}
