//! Gemini text generation (sales scripts).

use std::time::Duration;

use serde_json::{json, Value};
use tracing::debug;

use salesreel_core::config::TextConfig;

use crate::dispatcher::{LogicalRequest, ProviderDispatcher};
use crate::error::ClientError;

#[derive(Clone, Debug)]
pub struct GeminiText {
    dispatcher: ProviderDispatcher,
    model: String,
    timeout: Duration,
}

impl GeminiText {
    pub fn new(dispatcher: ProviderDispatcher, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            dispatcher,
            model: model.into(),
            timeout,
        }
    }

    pub fn from_config(dispatcher: ProviderDispatcher, config: &TextConfig) -> Self {
        Self::new(dispatcher, config.model.clone(), Duration::from_secs(config.timeout_secs))
    }

    /// Generate text; returns the joined text parts of the first candidate.
    pub async fn generate(&self, system: &str, user: &str) -> Result<String, ClientError> {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": user }] }],
        });
        if !system.trim().is_empty() {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }

        let request = LogicalRequest::post(format!("models/{}:generateContent", self.model))
            .json(body)
            .timeout(self.timeout);
        let success = self.dispatcher.dispatch(request).await?;

        let text = success
            .payload
            .as_json()
            .and_then(candidate_text)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ClientError::InvalidResponse {
                provider: self.dispatcher.name().to_string(),
                message: "no text in the first candidate".into(),
            })?;
        debug!(model = %self.model, chars = text.len(), "text generated");
        Ok(text)
    }

    /// Generate text and parse the JSON object inside it.
    pub async fn generate_json(&self, system: &str, user: &str) -> Result<Value, ClientError> {
        let raw = self.generate(system, user).await?;
        let invalid = |message: String| ClientError::InvalidResponse {
            provider: self.dispatcher.name().to_string(),
            message,
        };
        let object = extract_json_object(&raw).ok_or_else(|| invalid("no JSON object in the reply".into()))?;
        serde_json::from_str(&object).map_err(|e| invalid(format!("reply is not valid JSON: {e}")))
    }
}

fn candidate_text(body: &Value) -> Option<String> {
    let parts = body.pointer("/candidates/0/content/parts")?.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    Some(text)
}

/// The outermost `{...}` of `raw`, with code fences removed.
///
/// Models often wrap JSON in prose or a fenced block; this keeps everything
/// from the first `{` to the last `}`.
pub fn extract_json_object(raw: &str) -> Option<String> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end < start {
        return None;
    }
    Some(cleaned[start..=end].to_string())
}
