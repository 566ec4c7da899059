//! Configuration schema.
//!
//! Hierarchy: `Config` → `CredentialSources` (flattened at the root),
//! `DispatchConfig`, `ImageConfig`, `TextConfig`, `SpeechConfig`.
//!
//! New sections use **camelCase** keys on disk. The credential fields keep
//! their historical snake_case names (`google_api_keys`, `tokens`, …) so that
//! existing config files keep working.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.salesreel/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    #[serde(flatten)]
    pub credentials: CredentialSources,
    pub dispatch: DispatchConfig,
    pub image: ImageConfig,
    pub text: TextConfig,
    pub speech: SpeechConfig,
}

// ─────────────────────────────────────────────
// Credentials
// ─────────────────────────────────────────────

/// Every place a credential may live in the config file.
///
/// Several generations of the file format coexist: per-provider lists,
/// a single legacy Google key, and a mixed `tokens` list. The merge into
/// one ordered set per provider happens in [`crate::credentials::merge`].
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CredentialSources {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub google_api_keys: Vec<String>,
    /// Legacy single Google key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_api_key: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub openai_api_keys: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub elevenlabs_api_keys: Vec<String>,
    /// Google Labs session tokens (bearer).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labs_tokens: Vec<String>,
    /// Legacy mixed store: kind-tagged records and bare session tokens.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<LegacyToken>,
}

/// One entry of the legacy `tokens` list.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LegacyToken {
    /// `{"kind": "gemini", "token": "..."}` (older files used `value`).
    Record {
        kind: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    /// A bare string, historically a Labs session token.
    Bare(String),
    /// Anything else. Kept so one odd entry cannot fail the whole file.
    Other(serde_json::Value),
}

impl LegacyToken {
    /// Shorthand for a kind-tagged record.
    pub fn record(kind: &str, token: &str) -> Self {
        LegacyToken::Record {
            kind: kind.to_string(),
            token: Some(token.to_string()),
            value: None,
        }
    }
}

// ─────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────

/// Transport and admission settings shared by every provider dispatcher.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatchConfig {
    /// Per-attempt HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// In-flight request limit for providers without an explicit entry.
    pub default_concurrency: usize,
    /// Per-provider in-flight limits, keyed by provider name.
    pub concurrency: HashMap<String, usize>,
    /// Per-provider API base overrides, keyed by provider name.
    pub api_bases: HashMap<String, String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            default_concurrency: 4,
            concurrency: HashMap::new(),
            api_bases: HashMap::new(),
        }
    }
}

impl DispatchConfig {
    /// Concurrency limit for a provider (explicit entry or the default).
    pub fn limit_for(&self, provider: &str) -> usize {
        self.concurrency
            .get(provider)
            .copied()
            .unwrap_or(self.default_concurrency)
    }
}

// ─────────────────────────────────────────────
// Image / text / speech
// ─────────────────────────────────────────────

/// Which image provider is tried first.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageProviderChoice {
    #[default]
    Gemini,
    Whisk,
}

/// Image generation settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageConfig {
    pub provider: ImageProviderChoice,
    pub gemini_model: String,
    /// Wait after a 429 before moving to the next credential.
    pub rate_limit_delay_ms: u64,
    /// Wait between consecutive scenes of a batch.
    pub scene_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            provider: ImageProviderChoice::Gemini,
            gemini_model: "gemini-2.5-flash-image-preview".to_string(),
            rate_limit_delay_ms: 2500,
            scene_delay_ms: 2500,
            timeout_secs: 120,
        }
    }
}

/// Script (text generation) settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TextConfig {
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            timeout_secs: 240,
        }
    }
}

/// Text-to-speech settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeechConfig {
    pub model_id: String,
    pub output_format: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            model_id: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_44100_128".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
