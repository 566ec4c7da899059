//! Gemini image generation over the google credentials.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};
use tracing::debug;

use salesreel_core::config::ImageConfig;

use crate::dispatcher::{LogicalRequest, ProviderDispatcher};
use crate::error::FailureKind;
use crate::policy::ImagePolicy;

use super::{ImageError, ImageRequest, ImageWorkflow};

const NAME: &str = "gemini";

/// Single `generateContent` call; 429s back off and move to the next key.
#[derive(Clone, Debug)]
pub struct GeminiImageWorkflow {
    dispatcher: ProviderDispatcher,
    model: String,
    policy: ImagePolicy,
    timeout: Duration,
}

impl GeminiImageWorkflow {
    pub fn new(dispatcher: ProviderDispatcher, model: impl Into<String>, policy: ImagePolicy, timeout: Duration) -> Self {
        Self {
            dispatcher,
            model: model.into(),
            policy,
            timeout,
        }
    }

    pub fn from_config(dispatcher: ProviderDispatcher, config: &ImageConfig) -> Self {
        Self::new(
            dispatcher,
            config.gemini_model.clone(),
            ImagePolicy::new(Duration::from_millis(config.rate_limit_delay_ms)),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn request_body(request: &ImageRequest) -> Value {
        let mut parts = vec![json!({ "text": request.prompt })];
        for reference in &request.references {
            parts.push(json!({
                "inlineData": {
                    "mimeType": reference.mime_type,
                    "data": BASE64.encode(&reference.data),
                }
            }));
        }
        json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
        })
    }
}

#[async_trait]
impl ImageWorkflow for GeminiImageWorkflow {
    fn name(&self) -> &str {
        NAME
    }

    async fn generate(&self, request: &ImageRequest) -> Result<Vec<u8>, ImageError> {
        let logical = LogicalRequest::post(format!("models/{}:generateContent", self.model))
            .json(Self::request_body(request))
            .timeout(self.timeout);

        let success = self
            .dispatcher
            .dispatch_with_policy(logical, &self.policy)
            .await
            .map_err(|failure| match failure.kind {
                FailureKind::RateLimited => ImageError::RateLimited {
                    provider: NAME.to_string(),
                    attempts: failure.attempts,
                    message: failure.error_text,
                },
                _ => ImageError::Dispatch {
                    provider: NAME.to_string(),
                    step: "generate",
                    source: failure,
                },
            })?;

        let invalid = |message: &str| ImageError::InvalidResponse {
            provider: NAME.to_string(),
            step: "generate",
            message: message.to_string(),
        };

        let body = success
            .payload
            .as_json()
            .ok_or_else(|| invalid("response body is not JSON"))?;
        let data = first_inline_image(body).ok_or_else(|| invalid("no inlineData part in the first candidate"))?;
        let bytes = BASE64
            .decode(data)
            .map_err(|e| invalid(&format!("inlineData is not valid base64: {e}")))?;

        debug!(model = %self.model, bytes = bytes.len(), "gemini image generated");
        Ok(bytes)
    }
}

/// Base64 data of the first inline part of the first candidate.
fn first_inline_image(body: &Value) -> Option<&str> {
    body.pointer("/candidates/0/content/parts")?
        .as_array()?
        .iter()
        .find_map(|part| {
            part.get("inlineData")
                .or_else(|| part.get("inline_data"))
                .and_then(|d| d.get("data"))
                .and_then(Value::as_str)
        })
}
