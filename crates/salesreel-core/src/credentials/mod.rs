//! Credential pooling and rotation.
//!
//! - [`merge`] — builds one ordered, de-duplicated [`CredentialSet`] per
//!   provider out of the several config shapes credentials can live in
//! - [`pool::RotationPool`] — round-robin cursor over one provider's set
//! - [`registry::CredentialRegistry`] — the per-process collection of pools,
//!   reseeded from a [`ConfigSource`](crate::config::ConfigSource)

pub mod merge;
pub mod pool;
pub mod registry;

use std::fmt;

pub use merge::{merge_credentials, KNOWN_PROVIDERS};
pub use pool::{rotated, RotationPool};
pub use registry::CredentialRegistry;

/// Provider names used as pool keys.
pub mod providers {
    pub const GOOGLE: &str = "google";
    pub const OPENAI: &str = "openai";
    pub const ELEVENLABS: &str = "elevenlabs";
    pub const LABS: &str = "labs";
}

// ─────────────────────────────────────────────
// Credential
// ─────────────────────────────────────────────

/// An API key or bearer token. Identity is the exact string value.
///
/// `Debug` and `Display` only show a short prefix so credentials can be
/// logged without leaking them.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Credential(value.into())
    }

    /// The raw secret, for attaching to a request.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Redacted form, e.g. `"AIza…(39)"`.
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{}…({})", prefix, self.0.chars().count())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.redacted()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl From<&str> for Credential {
    fn from(s: &str) -> Self {
        Credential::new(s)
    }
}

impl From<String> for Credential {
    fn from(s: String) -> Self {
        Credential(s)
    }
}

// ─────────────────────────────────────────────
// CredentialSet
// ─────────────────────────────────────────────

/// Ordered credentials for one provider: no empties, no duplicates,
/// first occurrence wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialSet(Vec<Credential>);

impl CredentialSet {
    /// Build a set from raw strings, dropping empties and repeats.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<Credential> = Vec::new();
        for value in values {
            let value = value.into();
            if value.is_empty() || out.iter().any(|c| c.0 == value) {
                continue;
            }
            out.push(Credential(value));
        }
        CredentialSet(out)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Credential] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Credential> {
        self.0
    }
}
