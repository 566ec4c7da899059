//! Merge the credential fields of a config into one set per provider.
//!
//! Precedence, per provider:
//! 1. the provider's list field (`google_api_keys`, `openai_api_keys`, …)
//! 2. the legacy single value (`google_api_key`, Google only)
//! 3. `tokens` records whose `kind` is one of the provider's aliases
//!    (value from `token`, else `value`)
//! 4. for `labs` only: bare `tokens` strings longer than 30 chars
//!
//! The result is de-duplicated with the first occurrence kept.

use crate::config::{CredentialSources, LegacyToken};

use super::providers::{ELEVENLABS, GOOGLE, LABS, OPENAI};
use super::CredentialSet;

/// Every provider that has credential fields in the config.
pub const KNOWN_PROVIDERS: &[&str] = &[GOOGLE, OPENAI, ELEVENLABS, LABS];

/// Bare legacy tokens shorter than this are not session tokens.
const MIN_BARE_TOKEN_LEN: usize = 30;

/// `tokens[].kind` values that count for a provider.
fn kind_aliases(provider: &str) -> &'static [&'static str] {
    match provider {
        GOOGLE => &["google", "gemini", "google_tts"],
        OPENAI => &["openai"],
        ELEVENLABS => &["elevenlabs"],
        LABS => &["labs", "whisk"],
        _ => &[],
    }
}

/// Build the credential set for `provider`. Unknown providers get an empty set.
pub fn merge_credentials(provider: &str, sources: &CredentialSources) -> CredentialSet {
    let mut out: Vec<String> = Vec::new();

    match provider {
        GOOGLE => {
            out.extend(sources.google_api_keys.iter().cloned());
            if let Some(single) = &sources.google_api_key {
                out.push(single.clone());
            }
        }
        OPENAI => out.extend(sources.openai_api_keys.iter().cloned()),
        ELEVENLABS => out.extend(sources.elevenlabs_api_keys.iter().cloned()),
        LABS => out.extend(sources.labs_tokens.iter().cloned()),
        _ => {}
    }

    let aliases = kind_aliases(provider);
    for entry in &sources.tokens {
        if let LegacyToken::Record { kind, token, value } = entry {
            if aliases.contains(&kind.as_str()) {
                if let Some(v) = token.as_ref().filter(|t| !t.is_empty()).or(value.as_ref()) {
                    out.push(v.clone());
                }
            }
        }
    }

    if provider == LABS {
        for entry in &sources.tokens {
            if let LegacyToken::Bare(token) = entry {
                if token.len() > MIN_BARE_TOKEN_LEN {
                    out.push(token.clone());
                }
            }
        }
    }

    CredentialSet::from_values(out)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
