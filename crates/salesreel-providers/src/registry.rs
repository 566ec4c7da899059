//! Provider registry — static specs for every provider family.
//!
//! Each `ProviderSpec` describes how to talk to one provider: where it lives,
//! how a credential is attached, and which header carries the trace id.

use salesreel_core::credentials::providers::{ELEVENLABS, GOOGLE, LABS, OPENAI};

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one provider
// ─────────────────────────────────────────────

/// How a credential is attached to a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <credential>`.
    Bearer,
    /// A custom header, e.g. `xi-api-key: <credential>`.
    Header(&'static str),
    /// A query parameter, e.g. `?key=<credential>`.
    QueryParam(&'static str),
}

/// What a provider is used for by the shipped clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Text,
    Image,
    Speech,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Text => "text",
            Capability::Image => "image",
            Capability::Speech => "speech",
        }
    }
}

/// Static specification describing one provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name, also the credential pool key (e.g. `"google"`).
    pub name: &'static str,
    /// Human-readable name for logs. E.g. `"Google Gemini"`.
    pub display_name: &'static str,
    pub auth: AuthScheme,
    /// API base used when the config has no override.
    pub default_api_base: &'static str,
    /// Response header holding the request's trace id.
    pub trace_header: &'static str,
    pub capabilities: &'static [Capability],
}

/// Gemini text and image generation, API key in `?key=`.
pub static GOOGLE_SPEC: ProviderSpec = ProviderSpec {
    name: GOOGLE,
    display_name: "Google Gemini",
    auth: AuthScheme::QueryParam("key"),
    default_api_base: "https://generativelanguage.googleapis.com/v1beta",
    trace_header: "x-request-id",
    capabilities: &[Capability::Text, Capability::Image],
};

/// Credentials are pooled and rotated, but no client consumes them yet.
pub static OPENAI_SPEC: ProviderSpec = ProviderSpec {
    name: OPENAI,
    display_name: "OpenAI",
    auth: AuthScheme::Bearer,
    default_api_base: "https://api.openai.com/v1",
    trace_header: "x-request-id",
    capabilities: &[],
};

pub static ELEVENLABS_SPEC: ProviderSpec = ProviderSpec {
    name: ELEVENLABS,
    display_name: "ElevenLabs",
    auth: AuthScheme::Header("xi-api-key"),
    default_api_base: "https://api.elevenlabs.io/v1",
    trace_header: "x-request-id",
    capabilities: &[Capability::Speech],
};

/// Google Labs (Whisk image remix), session bearer tokens.
pub static LABS_SPEC: ProviderSpec = ProviderSpec {
    name: LABS,
    display_name: "Google Labs Whisk",
    auth: AuthScheme::Bearer,
    default_api_base: "https://aisandbox-pa.googleapis.com/v1",
    trace_header: "x-request-id",
    capabilities: &[Capability::Image],
};

/// Every supported provider.
pub static PROVIDERS: &[&ProviderSpec] = &[&GOOGLE_SPEC, &OPENAI_SPEC, &ELEVENLABS_SPEC, &LABS_SPEC];

/// Find a provider spec by its internal name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().copied().find(|s| s.name == name)
}

impl ProviderSpec {
    /// Comma-separated capability names, `"-"` when there are none.
    pub fn capability_label(&self) -> String {
        if self.capabilities.is_empty() {
            return "-".to_string();
        }
        self.capabilities
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
