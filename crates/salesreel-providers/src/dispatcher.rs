//! Credential-rotating provider dispatcher.
//!
//! One [`ProviderDispatcher`] per provider family. A dispatch:
//!
//! 1. refreshes the credential registry (one config snapshot per dispatch)
//! 2. merges the provider's credentials and rotates them so the next
//!    round-robin credential goes first
//! 3. falls back to a single anonymous attempt if there are none
//! 4. tries credentials in order, each behind the provider's concurrency
//!    gate, and lets a [`RetryPolicy`] decide what happens after each attempt
//! 5. returns the first success, or a [`DispatchFailure`] describing the
//!    last attempt

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use salesreel_core::config::Config;
use salesreel_core::credentials::{merge_credentials, Credential, CredentialRegistry};
use salesreel_core::ProgressSink;

use crate::error::{DispatchFailure, FailureKind};
use crate::gate::ConcurrencyGate;
use crate::policy::{classify, AttemptClass, GenericPolicy, RetryPolicy, Step};
use crate::registry::{AuthScheme, ProviderSpec};
use crate::transport::{redact_url, CallOutcome, HttpRequest, Method, Payload, Transport};

// ─────────────────────────────────────────────
// Request / result types
// ─────────────────────────────────────────────

/// A request as the caller describes it, before credentials are attached.
#[derive(Clone, Debug)]
pub struct LogicalRequest {
    pub method: Method,
    /// Absolute URL, or a path relative to the provider's API base.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// Per-attempt timeout; `None` uses `dispatch.timeoutSecs`.
    pub timeout: Option<Duration>,
}

impl LogicalRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A successful dispatch.
#[derive(Clone, Debug)]
pub struct DispatchSuccess {
    pub payload: Payload,
    pub status: u16,
    pub headers: std::collections::HashMap<String, String>,
    /// Number of transport attempts made, including the successful one.
    pub attempts: usize,
}

/// Outcome of a full dispatch.
pub type DispatchResult = Result<DispatchSuccess, DispatchFailure>;

// ─────────────────────────────────────────────
// Shared context
// ─────────────────────────────────────────────

/// Everything dispatchers share: the credential registry, the concurrency
/// gate, the transport, and the progress sink.
#[derive(Clone)]
pub struct DispatchContext {
    pub registry: Arc<CredentialRegistry>,
    pub gate: Arc<ConcurrencyGate>,
    pub transport: Arc<dyn Transport>,
    pub progress: ProgressSink,
}

impl std::fmt::Debug for DispatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchContext")
            .field("registry", &self.registry)
            .field("gate", &self.gate)
            .field("progress", &self.progress)
            .finish()
    }
}

// ─────────────────────────────────────────────
// ProviderDispatcher
// ─────────────────────────────────────────────

/// Executes logical requests against one provider with credential rotation.
#[derive(Clone, Debug)]
pub struct ProviderDispatcher {
    spec: &'static ProviderSpec,
    ctx: DispatchContext,
}

impl ProviderDispatcher {
    pub fn new(spec: &'static ProviderSpec, ctx: DispatchContext) -> Self {
        Self { spec, ctx }
    }

    pub fn spec(&self) -> &'static ProviderSpec {
        self.spec
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn context(&self) -> &DispatchContext {
        &self.ctx
    }

    /// Dispatch with the generic policy: rotate on 401/403, stop on anything
    /// else.
    pub async fn dispatch(&self, request: LogicalRequest) -> DispatchResult {
        self.dispatch_with_policy(request, &GenericPolicy).await
    }

    /// Dispatch with an explicit retry policy.
    pub async fn dispatch_with_policy(
        &self,
        request: LogicalRequest,
        policy: &dyn RetryPolicy,
    ) -> DispatchResult {
        let provider = self.spec.name;
        let config = self.ctx.registry.refresh();
        let url = self.resolve_url(&config, &request.url);
        let timeout = request
            .timeout
            .unwrap_or_else(|| Duration::from_secs(config.dispatch.timeout_secs));

        let attempts = self.attempt_plan(&config);
        let total = attempts.len();
        let mut last: Option<(AttemptClass, CallOutcome)> = None;
        let mut made = 0;

        for (idx, credential) in attempts.iter().enumerate() {
            let http = self.attach(&request, &url, timeout, credential.as_ref());

            debug!(
                provider,
                attempt = idx + 1,
                of = total,
                credential = %credential.as_ref().map(Credential::redacted).unwrap_or_else(|| "anonymous".into()),
                url = %redact_url(&url),
                "dispatching"
            );

            let outcome = {
                let _permit = match self.ctx.gate.acquire(provider).await {
                    Ok(permit) => permit,
                    Err(e) => {
                        warn!(provider, error = %e, "concurrency gate refused admission");
                        let mut failure =
                            DispatchFailure::without_response(provider, FailureKind::Gate, e.to_string());
                        failure.attempts = made;
                        return Err(failure);
                    }
                };
                self.ctx.transport.execute(&http).await
            };
            made += 1;

            let class = classify(&outcome);
            match policy.next_step(class) {
                Step::Return => {
                    if idx > 0 {
                        info!(provider, attempt = idx + 1, "succeeded after rotating credentials");
                    }
                    return Ok(DispatchSuccess {
                        payload: outcome.payload,
                        status: outcome.status,
                        headers: outcome.headers,
                        attempts: made,
                    });
                }
                Step::Rotate => {
                    self.narrate_rotation(idx, total, &outcome);
                    last = Some((class, outcome));
                }
                Step::Backoff(delay) => {
                    self.narrate_rotation(idx, total, &outcome);
                    last = Some((class, outcome));
                    if idx + 1 < total {
                        self.ctx.progress.emit(&format!(
                            "{}: rate limited, waiting {:.1}s before the next credential",
                            self.spec.display_name,
                            delay.as_secs_f64()
                        ));
                        tokio::time::sleep(delay).await;
                    }
                }
                Step::Stop => {
                    last = Some((class, outcome));
                    break;
                }
            }
        }

        Err(self.failure(last, made))
    }

    /// Fetch an absolute URL through this provider's gate without attaching
    /// a credential (e.g. a pre-signed download link).
    pub async fn fetch_unauthenticated(&self, url: &str, timeout: Duration) -> DispatchResult {
        let provider = self.spec.name;
        let http = HttpRequest {
            method: Method::GET,
            url: url.to_string(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            timeout,
        };
        let outcome = {
            let _permit = self.ctx.gate.acquire(provider).await.map_err(|e| {
                DispatchFailure::without_response(provider, FailureKind::Gate, e.to_string())
            })?;
            self.ctx.transport.execute(&http).await
        };
        if outcome.ok {
            Ok(DispatchSuccess {
                payload: outcome.payload,
                status: outcome.status,
                headers: outcome.headers,
                attempts: 1,
            })
        } else {
            let class = classify(&outcome);
            Err(self.failure(Some((class, outcome)), 1))
        }
    }

    /// Credentials to try, in order. Never empty: with no credentials a
    /// single anonymous attempt is made.
    fn attempt_plan(&self, config: &Config) -> Vec<Option<Credential>> {
        let base = merge_credentials(self.spec.name, &config.credentials);
        let view = self.ctx.registry.rotated_list(self.spec.name, base.as_slice());
        if view.is_empty() {
            debug!(provider = self.spec.name, "no credentials configured, trying anonymously");
            return vec![None];
        }
        view.into_iter().map(Some).collect()
    }

    /// Absolute URL for `path` under the configured API base.
    pub fn url(&self, path: &str) -> String {
        self.resolve_url(&self.ctx.registry.config(), path)
    }

    /// Absolute URL for `url` (config override, else the provider default).
    pub fn resolve_url(&self, config: &Config, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        let base = config
            .dispatch
            .api_bases
            .get(self.spec.name)
            .map(String::as_str)
            .unwrap_or(self.spec.default_api_base);
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }

    /// Build the transport request for one attempt.
    fn attach(
        &self,
        request: &LogicalRequest,
        url: &str,
        timeout: Duration,
        credential: Option<&Credential>,
    ) -> HttpRequest {
        let mut headers = request.headers.clone();
        let mut query = request.query.clone();

        if let Some(cred) = credential {
            match self.spec.auth {
                AuthScheme::Bearer => {
                    headers.retain(|(k, _)| !k.eq_ignore_ascii_case("authorization"));
                    headers.push(("authorization".into(), format!("Bearer {}", cred.expose())));
                }
                AuthScheme::Header(name) => {
                    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
                    headers.push((name.to_string(), cred.expose().to_string()));
                }
                AuthScheme::QueryParam(name) => {
                    query.retain(|(k, _)| k != name);
                    query.push((name.to_string(), cred.expose().to_string()));
                }
            }
        }

        HttpRequest {
            method: request.method.clone(),
            url: url.to_string(),
            headers,
            query,
            body: request.body.clone(),
            timeout,
        }
    }

    fn narrate_rotation(&self, idx: usize, total: usize, outcome: &CallOutcome) {
        let next = if idx + 1 < total {
            "trying the next one"
        } else {
            "no credentials left"
        };
        warn!(
            provider = self.spec.name,
            status = outcome.status,
            attempt = idx + 1,
            of = total,
            "credential rejected"
        );
        self.ctx.progress.emit(&format!(
            "{}: credential {}/{} failed (HTTP {}), {}",
            self.spec.display_name,
            idx + 1,
            total,
            outcome.status,
            next
        ));
    }

    fn failure(&self, last: Option<(AttemptClass, CallOutcome)>, attempts: usize) -> DispatchFailure {
        let provider = self.spec.name;
        let failure = match last {
            Some((class, outcome)) => DispatchFailure {
                provider: provider.to_string(),
                kind: FailureKind::from_last_attempt(class, outcome.status),
                trace_id: outcome
                    .header(self.spec.trace_header)
                    .unwrap_or_default()
                    .to_string(),
                error_text: outcome.error_text,
                status: outcome.status,
                headers: outcome.headers,
                attempts,
            },
            None => {
                let mut f = DispatchFailure::without_response(
                    provider,
                    FailureKind::CredentialsExhausted,
                    "no attempt was made",
                );
                f.attempts = attempts;
                f
            }
        };

        warn!(
            provider,
            kind = ?failure.kind,
            status = failure.status,
            attempts = failure.attempts,
            trace_id = %failure.trace_id,
            "dispatch failed"
        );
        self.ctx.progress.emit(&format!(
            "{}: request failed: {}",
            self.spec.display_name, failure.error_text
        ));
        failure
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ImagePolicy;
    use crate::registry::find_by_name;
    use crate::transport::ReqwestTransport;
    use salesreel_core::config::SharedConfig;
    use std::sync::Mutex;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Harness {
        config: Arc<SharedConfig>,
        ctx: DispatchContext,
        lines: Arc<Mutex<Vec<String>>>,
    }

    fn harness(server: &MockServer, provider: &str, f: impl FnOnce(&mut Config)) -> Harness {
        let mut config = Config::default();
        config
            .dispatch
            .api_bases
            .insert(provider.to_string(), server.uri());
        f(&mut config);
        let config = Arc::new(SharedConfig::new(config));
        let lines = Arc::new(Mutex::new(Vec::new()));
        let captured = lines.clone();
        let ctx = DispatchContext {
            registry: Arc::new(CredentialRegistry::new(config.clone())),
            gate: Arc::new(ConcurrencyGate::default()),
            transport: Arc::new(ReqwestTransport::new()),
            progress: ProgressSink::new(move |m| captured.lock().unwrap().push(m.to_string())),
        };
        Harness { config, ctx, lines }
    }

    fn dispatcher(h: &Harness, provider: &str) -> ProviderDispatcher {
        ProviderDispatcher::new(find_by_name(provider).unwrap(), h.ctx.clone())
    }

    #[test]
    fn test_resolve_url() {
        let ctx = DispatchContext {
            registry: Arc::new(CredentialRegistry::new(Arc::new(Config::default()))),
            gate: Arc::new(ConcurrencyGate::default()),
            transport: Arc::new(ReqwestTransport::new()),
            progress: ProgressSink::noop(),
        };
        let d = ProviderDispatcher::new(find_by_name("elevenlabs").unwrap(), ctx);
        let mut config = Config::default();
        assert_eq!(
            d.resolve_url(&config, "/text-to-speech/v1"),
            "https://api.elevenlabs.io/v1/text-to-speech/v1"
        );
        config
            .dispatch
            .api_bases
            .insert("elevenlabs".into(), "http://localhost:9/".into());
        assert_eq!(d.resolve_url(&config, "voices"), "http://localhost:9/voices");
        assert_eq!(d.resolve_url(&config, "https://cdn.test/x.png"), "https://cdn.test/x.png");
    }

    #[tokio::test]
    async fn test_rotates_past_401_and_stops_at_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(query_param("key", "k1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(query_param("key", "k2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(query_param("key", "k3"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let h = harness(&server, "google", |c| {
            c.credentials.google_api_keys = vec!["k1".into(), "k2".into(), "k3".into()];
        });
        let result = dispatcher(&h, "google").dispatch(LogicalRequest::get("models")).await;

        let success = result.unwrap();
        assert_eq!(success.status, 200);
        assert_eq!(success.attempts, 2);
        assert_eq!(success.payload, Payload::Json(serde_json::json!({"models": []})));
        assert!(h.lines.lock().unwrap()[0].contains("credential 1/3 failed (HTTP 401)"));
    }

    #[tokio::test]
    async fn test_server_error_stops_without_rotating() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-1"))
            .respond_with(
                ResponseTemplate::new(500)
                    .insert_header("x-request-id", "trace-500")
                    .set_body_json(serde_json::json!({"error": {"message": "upstream exploded"}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-2"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let h = harness(&server, "openai", |c| {
            c.credentials.openai_api_keys = vec!["sk-1".into(), "sk-2".into()];
        });
        let failure = dispatcher(&h, "openai")
            .dispatch(LogicalRequest::post("chat/completions").json(serde_json::json!({})))
            .await
            .unwrap_err();

        assert_eq!(failure.kind, FailureKind::Http);
        assert_eq!(failure.status, 500);
        assert_eq!(failure.attempts, 1);
        assert_eq!(failure.trace_id, "trace-500");
        assert!(failure.error_text.contains("upstream exploded"));
    }

    #[tokio::test]
    async fn test_429_is_terminal_for_generic_dispatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/text-to-speech/voice"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server, "elevenlabs", |c| {
            c.credentials.elevenlabs_api_keys = vec!["e1".into(), "e2".into()];
        });
        let failure = dispatcher(&h, "elevenlabs")
            .dispatch(LogicalRequest::post("text-to-speech/voice"))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::RateLimited);
        assert_eq!(failure.attempts, 1);
    }

    #[tokio::test]
    async fn test_image_policy_waits_after_429_before_next_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/m:generateContent"))
            .and(query_param("key", "k1"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/m:generateContent"))
            .and(query_param("key", "k2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server, "google", |c| {
            c.credentials.google_api_keys = vec!["k1".into(), "k2".into()];
        });
        let delay = Duration::from_millis(300);
        let started = std::time::Instant::now();
        let success = dispatcher(&h, "google")
            .dispatch_with_policy(
                LogicalRequest::post("models/m:generateContent"),
                &ImagePolicy::new(delay),
            )
            .await
            .unwrap();

        assert!(started.elapsed() >= delay);
        assert_eq!(success.attempts, 2);
        let lines = h.lines.lock().unwrap();
        assert_eq!(lines.iter().filter(|l| l.contains("waiting")).count(), 1);
    }

    #[tokio::test]
    async fn test_image_policy_does_not_wait_after_last_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/m:generateContent"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let h = harness(&server, "google", |c| {
            c.credentials.google_api_keys = vec!["k1".into(), "k2".into(), "k3".into()];
        });
        let delay = Duration::from_millis(300);
        let started = std::time::Instant::now();
        let failure = dispatcher(&h, "google")
            .dispatch_with_policy(
                LogicalRequest::post("models/m:generateContent"),
                &ImagePolicy::new(delay),
            )
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert_eq!(failure.kind, FailureKind::RateLimited);
        assert_eq!(failure.attempts, 3);
        // Two waits between three credentials, none after the last.
        assert!(elapsed >= delay * 2);
        assert!(elapsed < delay * 3);
        let lines = h.lines.lock().unwrap();
        assert_eq!(lines.iter().filter(|l| l.contains("waiting")).count(), 2);
    }

    #[tokio::test]
    async fn test_all_credentials_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/whoami"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .expect(2)
            .mount(&server)
            .await;

        let h = harness(&server, "labs", |c| {
            c.credentials.labs_tokens = vec!["t1".into(), "t2".into()];
        });
        let failure = dispatcher(&h, "labs")
            .dispatch(LogicalRequest::get("whoami"))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::CredentialsExhausted);
        assert_eq!(failure.attempts, 2);
        assert_eq!(failure.status, 403);
        assert_eq!(failure.trace_id, "");
        assert!(failure.error_text.contains("forbidden"));
    }

    #[tokio::test]
    async fn test_no_credentials_makes_one_anonymous_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/voices"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server, "elevenlabs", |_| {});
        let failure = dispatcher(&h, "elevenlabs")
            .dispatch(LogicalRequest::get("voices"))
            .await
            .unwrap_err();
        assert_eq!(failure.attempts, 1);
        assert_eq!(failure.status, 401);

        let received = server.received_requests().await.unwrap();
        assert!(received[0].headers.get("xi-api-key").is_none());
    }

    #[tokio::test]
    async fn test_transport_error_is_structured_failure() {
        let server = MockServer::start().await;
        let h = harness(&server, "openai", |c| {
            c.credentials.openai_api_keys = vec!["a".into(), "b".into()];
            c.dispatch
                .api_bases
                .insert("openai".into(), "http://127.0.0.1:1".into());
        });
        let failure = dispatcher(&h, "openai")
            .dispatch(LogicalRequest::get("models"))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Transport);
        assert_eq!(failure.status, 0);
        assert_eq!(failure.attempts, 1);
    }

    #[tokio::test]
    async fn test_consecutive_dispatches_start_on_different_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let h = harness(&server, "labs", |c| {
            c.credentials.labs_tokens = vec!["t1".into(), "t2".into(), "t3".into()];
        });
        let d = dispatcher(&h, "labs");
        for _ in 0..3 {
            d.dispatch(LogicalRequest::get("ping")).await.unwrap();
        }

        let auths: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| r.headers.get("authorization").unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(auths, vec!["Bearer t1", "Bearer t2", "Bearer t3"]);
    }

    #[tokio::test]
    async fn test_config_changes_are_picked_up_per_dispatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(header("authorization", "Bearer new-token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let h = harness(&server, "labs", |c| c.credentials.labs_tokens = vec!["old".into()]);
        let d = dispatcher(&h, "labs");
        assert!(d.dispatch(LogicalRequest::get("ping")).await.is_err());

        h.config
            .update(|c| c.credentials.labs_tokens = vec!["new-token".into()]);
        assert!(d.dispatch(LogicalRequest::get("ping")).await.is_ok());
    }

    #[tokio::test]
    async fn test_caller_auth_header_is_replaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(header("authorization", "Bearer pooled"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server, "openai", |c| c.credentials.openai_api_keys = vec!["pooled".into()]);
        let result = dispatcher(&h, "openai")
            .dispatch(LogicalRequest::get("ping").header("Authorization", "Bearer stale"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_closed_gate_is_structured_failure() {
        let server = MockServer::start().await;
        let h = harness(&server, "google", |_| {});
        h.ctx.gate.close("google");
        let failure = dispatcher(&h, "google")
            .dispatch(LogicalRequest::get("models"))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Gate);
        assert_eq!(failure.attempts, 0);
    }
}
