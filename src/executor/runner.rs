//! Test execution runner
//!
//! Owns the environment registry, loaded suites, token manager, and HTTP
//! client; sequences test execution and folds every failure mode into a
//! `TestResult`.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::auth::{compose_headers, TokenError, TokenManager, TokenState};
use crate::http::{ApiRequest, HttpClient};
use crate::models::{
    Environment, EnvironmentInfo, EnvironmentRegistry, RunSummary, TestDefinition, TestResult,
    TestSuite,
};
use crate::safety::{self, GateDecision};
use crate::utils::Timer;

/// The harness core: everything needed to run tests against any
/// registered environment.
pub struct Harness {
    registry: EnvironmentRegistry,
    suites: HashMap<String, TestSuite>,
    tokens: TokenManager,
    client: HttpClient,
}

impl Harness {
    /// Build the harness from a validated registry.
    ///
    /// Test suites are loaded here, once; an environment whose suite is
    /// missing or invalid stays listed but cannot run tests.
    pub fn new(registry: EnvironmentRegistry, timeout_secs: u64) -> Result<Self> {
        let mut suites = HashMap::new();
        for env in registry.iter() {
            match TestSuite::load(&env.test_cases_file) {
                Ok(suite) => {
                    info!("Loaded {} test cases for {}", suite.len(), env.id);
                    suites.insert(env.id.clone(), suite);
                }
                Err(e) => {
                    warn!("No usable test suite for {}: {e:#}", env.id);
                }
            }
        }

        let tokens = TokenManager::new(registry.ids(), Duration::from_secs(timeout_secs))?;
        let client = HttpClient::with_timeout(timeout_secs)?;

        Ok(Self {
            registry,
            suites,
            tokens,
            client,
        })
    }

    /// Secret-free metadata for all registered environments.
    pub fn list_environments(&self) -> Vec<EnvironmentInfo> {
        self.registry.infos()
    }

    /// The loaded suite for an environment, if any.
    pub fn suite(&self, environment_id: &str) -> Option<&TestSuite> {
        self.suites.get(environment_id)
    }

    /// Run a single test case by id.
    pub async fn run_test(&self, environment_id: &str, test_id: &str) -> Result<TestResult> {
        let (env, suite) = self.resolve(environment_id)?;
        let test = suite
            .find(test_id)
            .ok_or_else(|| anyhow!("Unknown test in {environment_id}: {test_id}"))?;

        Ok(self.execute_case(env, suite, test).await)
    }

    /// Run every test case for an environment, in suite order.
    ///
    /// Never aborts early: each test yields exactly one result, and one
    /// test's failure or block is isolated from the rest.
    pub async fn run_all(&self, environment_id: &str) -> Result<RunSummary> {
        let (env, suite) = self.resolve(environment_id)?;

        info!("Running {} tests against {}", suite.len(), env.id);
        let timer = Timer::start("run_all");

        let mut results = Vec::with_capacity(suite.len());
        for test in &suite.test_cases {
            let result = self.execute_case(env, suite, test).await;
            info!("  {result}");
            results.push(result);
        }

        let summary = RunSummary::new(env.id.clone(), results);
        info!(
            "Run completed in {}ms - Pass: {}/{} ({:.1}%), Blocked: {}",
            timer.elapsed_ms(),
            summary.passed,
            summary.total,
            summary.pass_rate(),
            summary.blocked
        );

        Ok(summary)
    }

    /// Proactively refresh tokens for all environments concurrently.
    pub async fn warm_tokens(&self) -> Vec<(String, Result<TokenState, TokenError>)> {
        let envs: Vec<&Environment> = self.registry.iter().map(|e| e.as_ref()).collect();
        self.tokens.warm(envs).await
    }

    /// Proactively refresh the token for one environment.
    pub async fn refresh_token(&self, environment_id: &str) -> Result<TokenState> {
        let env = self
            .registry
            .get(environment_id)
            .ok_or_else(|| anyhow!("Unknown environment: {environment_id}"))?;
        Ok(self.tokens.ensure_valid_token(env).await?)
    }

    /// Current token state for one environment.
    pub async fn token_snapshot(&self, environment_id: &str) -> Option<TokenState> {
        self.tokens.store().snapshot(environment_id).await
    }

    fn resolve(&self, environment_id: &str) -> Result<(&Environment, &TestSuite)> {
        let env = self
            .registry
            .get(environment_id)
            .ok_or_else(|| anyhow!("Unknown environment: {environment_id}"))?;
        let suite = self
            .suites
            .get(environment_id)
            .ok_or_else(|| anyhow!("No test suite loaded for environment: {environment_id}"))?;
        Ok((env.as_ref(), suite))
    }

    /// Execute one test case. The safety gate runs first, so blocked
    /// requests never trigger a token refresh or reach the network.
    async fn execute_case(
        &self,
        env: &Environment,
        suite: &TestSuite,
        test: &TestDefinition,
    ) -> TestResult {
        if let GateDecision::Blocked(reason) = safety::check_allowed(env, &test.body) {
            warn!("Safety gate blocked {} on {}: {}", test.id, env.id, reason);
            return TestResult::blocked(test, &env.id, reason);
        }

        let headers =
            match compose_headers(&test.headers, env, test.requires_auth, &self.tokens).await {
                Ok(headers) => headers,
                Err(e) => {
                    error!("Token refresh failed for {}: {}", env.id, e);
                    return TestResult::failed_with_error(
                        test,
                        &env.id,
                        0,
                        format!("token refresh failed: {e}"),
                    );
                }
            };

        let url = format!(
            "{}{}",
            suite.resolve_base_url(env).trim_end_matches('/'),
            test.endpoint
        );

        let mut request = ApiRequest::new(&test.method, url).headers(headers);
        if !test.body.is_null() {
            request = request.body(test.body.clone());
        }

        let timer = Timer::start(&test.id);
        match self.client.send(request).await {
            Ok(response) => {
                if response.is_success() {
                    TestResult::passed(
                        test,
                        &env.id,
                        response.status_code,
                        response.duration_ms,
                        response.body,
                    )
                } else {
                    TestResult::failed(
                        test,
                        &env.id,
                        response.status_code,
                        response.duration_ms,
                        response.body,
                    )
                }
            }
            Err(e) => TestResult::failed_with_error(test, &env.id, timer.elapsed_ms(), e.to_string()),
        }
    }
}
