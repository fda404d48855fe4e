//! HTTP client for API test execution
//!
//! Issues a single bounded-timeout attempt per request and captures
//! timing alongside the response.

#![allow(dead_code)]

use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// HTTP execution errors. Status-code classification happens one layer up;
/// these cover the cases where no usable response exists at all.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Connection refused to {0}")]
    ConnectionRefused(String),

    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Malformed response body: {0}")]
    MalformedResponse(String),
}

/// HTTP client for test execution
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout_secs: u64,
}

impl HttpClient {
    /// Create a client with the given request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| HttpError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    /// Send one request. Exactly one attempt, no retries.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, HttpError> {
        debug!("Sending {} request to {}", request.method, request.url);

        let method = Method::from_bytes(request.method.to_uppercase().as_bytes())
            .map_err(|_| HttpError::InvalidMethod(request.method.clone()))?;

        let mut req_builder = self.client.request(method.clone(), &request.url);

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key.as_str(), value.as_str());
        }

        // GET carries the body as query parameters; everything else as JSON.
        if let Some(body) = &request.body {
            if method == Method::GET {
                req_builder = req_builder.query(&query_pairs(body));
            } else {
                req_builder = req_builder.json(body);
            }
        }

        let start = std::time::Instant::now();

        let response = req_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                HttpError::ConnectionRefused(request.url.clone())
            } else {
                HttpError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();

        let mut response_headers = HashMap::new();
        for (key, value) in response.headers().iter() {
            if let Ok(v) = value.to_str() {
                response_headers.insert(key.to_string(), v.to_string());
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| HttpError::MalformedResponse(e.to_string()))?;

        let duration_ms = start.elapsed().as_millis() as u64;

        debug!(
            "Response: {} {} in {}ms",
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            duration_ms
        );

        Ok(ApiResponse {
            status_code: status.as_u16(),
            headers: response_headers,
            body,
            duration_ms,
        })
    }
}

/// Flatten a JSON object into query pairs; scalar values only.
fn query_pairs(body: &Value) -> Vec<(String, String)> {
    match body {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| {
                let rendered = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), rendered)
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Outbound request description
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Received response with timing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub duration_ms: u64,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }
}
