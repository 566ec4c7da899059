//! Single-attempt HTTP transport.
//!
//! A [`Transport`] executes exactly one request and reports what happened as
//! a [`CallOutcome`]. It knows nothing about credentials and never retries;
//! both belong to the dispatcher.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

pub use reqwest::Method;

/// Longest error body kept in `CallOutcome::error_text`.
const MAX_ERROR_BODY_CHARS: usize = 500;

// ─────────────────────────────────────────────
// Request / outcome
// ─────────────────────────────────────────────

/// A fully-formed request, credentials already attached.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub timeout: Duration,
}

/// Decoded response body.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Text(String),
    Binary(Vec<u8>),
    #[default]
    Empty,
}

impl Payload {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Take the body as raw bytes (text is UTF-8 encoded, JSON re-serialized).
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Payload::Binary(b) => b,
            Payload::Text(t) => t.into_bytes(),
            Payload::Json(v) => v.to_string().into_bytes(),
            Payload::Empty => Vec::new(),
        }
    }
}

/// Result of one transport attempt.
///
/// `status == 0` means no HTTP response was received (connect error,
/// timeout, invalid request).
#[derive(Clone, Debug, Default)]
pub struct CallOutcome {
    pub ok: bool,
    pub payload: Payload,
    pub error_text: String,
    pub status: u16,
    /// Response headers with lower-cased names.
    pub headers: HashMap<String, String>,
}

impl CallOutcome {
    /// A transport-level failure (no response).
    pub fn transport_error(error_text: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_text: error_text.into(),
            ..Default::default()
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

// ─────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────

/// Executes one HTTP request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &HttpRequest) -> CallOutcome;
}

// ─────────────────────────────────────────────
// reqwest implementation
// ─────────────────────────────────────────────

/// [`Transport`] backed by a shared, connection-pooled `reqwest::Client`.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("salesreel/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self { client }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &HttpRequest) -> CallOutcome {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(resp) => resp,
            Err(e) => {
                debug!(url = %redact_url(&request.url), error = %e, "HTTP request failed");
                return CallOutcome::transport_error(format!("request failed: {e}"));
            }
        };

        let status = response.status();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let content_type = headers
            .get(CONTENT_TYPE.as_str())
            .cloned()
            .unwrap_or_default();

        let bytes = match response.bytes().await {
            Ok(b) => b.to_vec(),
            Err(e) => {
                return CallOutcome {
                    ok: false,
                    payload: Payload::Empty,
                    error_text: format!("failed to read response body: {e}"),
                    status: status.as_u16(),
                    headers,
                };
            }
        };
        let payload = decode_body(&content_type, bytes);

        if status.is_success() {
            CallOutcome {
                ok: true,
                payload,
                error_text: String::new(),
                status: status.as_u16(),
                headers,
            }
        } else {
            CallOutcome {
                ok: false,
                error_text: error_text_for(status.as_u16(), &payload),
                payload,
                status: status.as_u16(),
                headers,
            }
        }
    }
}

/// Decode a response body by content type.
fn decode_body(content_type: &str, bytes: Vec<u8>) -> Payload {
    if bytes.is_empty() {
        return Payload::Empty;
    }
    let ct = content_type.to_ascii_lowercase();
    if ct.contains("json") {
        match serde_json::from_slice(&bytes) {
            Ok(v) => Payload::Json(v),
            Err(_) => Payload::Text(String::from_utf8_lossy(&bytes).into_owned()),
        }
    } else if ct.starts_with("text/") {
        Payload::Text(String::from_utf8_lossy(&bytes).into_owned())
    } else {
        Payload::Binary(bytes)
    }
}

/// Human-readable error for a non-2xx response.
///
/// Prefers the conventional `{"error": {"message": ...}}` field.
fn error_text_for(status: u16, payload: &Payload) -> String {
    let detail = match payload {
        Payload::Json(v) => v
            .pointer("/error/message")
            .and_then(|m| m.as_str())
            .map(String::from)
            .or_else(|| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or_else(|| v.to_string()),
        Payload::Text(t) => t.clone(),
        Payload::Binary(b) => format!("<{} bytes>", b.len()),
        Payload::Empty => String::new(),
    };
    let detail = salesreel_core::utils::truncate_string(detail.trim(), MAX_ERROR_BODY_CHARS);
    if detail.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {detail}")
    }
}

/// Strip the query string so `?key=` credentials never reach the logs.
pub(crate) fn redact_url(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
