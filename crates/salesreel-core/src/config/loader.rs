//! Config loader — reads `~/.salesreel/config.json`, applies legacy
//! migrations, then env var overrides.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.salesreel/config.json`
//! 3. Environment variables `SALESREEL_<SECTION>__<FIELD>` (override JSON)
//!
//! Loading never fails: a missing or unreadable file yields defaults.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, CredentialSources, ImageProviderChoice};

/// Credential list fields that older files stored as a single string.
const LIST_FIELDS: &[&str] = &[
    "google_api_keys",
    "openai_api_keys",
    "elevenlabs_api_keys",
    "labs_tokens",
];

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the given path (or the default one) + env vars.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let mut raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    migrate_config(&mut raw);

    let Some(root) = raw.as_object() else {
        warn!("Config root is not a JSON object, using defaults");
        return apply_env_overrides(Config::default());
    };

    apply_env_overrides(config_from_root(root))
}

/// Deserialize each section on its own so that one malformed section
/// falls back to its defaults without taking the others with it.
fn config_from_root(root: &Map<String, Value>) -> Config {
    let credentials: CredentialSources =
        match serde_json::from_value(Value::Object(root.clone())) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to deserialize credentials, ignoring them: {}", e);
                CredentialSources::default()
            }
        };

    Config {
        credentials,
        dispatch: section(root, "dispatch"),
        image: section(root, "image"),
        text: section(root, "text"),
        speech: section(root, "speech"),
    }
}

fn section<T: DeserializeOwned + Default>(root: &Map<String, Value>, key: &str) -> T {
    let Some(value) = root.get(key) else {
        return T::default();
    };
    match serde_json::from_value(value.clone()) {
        Ok(v) => v,
        Err(e) => {
            warn!(section = key, "Failed to deserialize config section, using defaults: {}", e);
            T::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply legacy config migrations.
///
/// - `"google_api_keys": "k"` → `["k"]` (same for the other list fields);
///   `null` becomes an empty list.
/// - non-string entries inside a list field (`null`, numbers, objects) and
///   empty strings are dropped.
/// - `"google_api_key": ""` (or any non-string) → removed.
/// - a `tokens` value that is not a list → empty list.
fn migrate_config(raw: &mut serde_json::Value) {
    let Some(root) = raw.as_object_mut() else {
        return;
    };

    for field in LIST_FIELDS {
        let replacement = match root.get(*field) {
            Some(serde_json::Value::String(s)) if s.is_empty() => Some(serde_json::json!([])),
            Some(serde_json::Value::String(s)) => Some(serde_json::json!([s])),
            Some(serde_json::Value::Array(items)) => {
                let kept: Vec<Value> = items
                    .iter()
                    .filter(|v| v.as_str().is_some_and(|s| !s.is_empty()))
                    .cloned()
                    .collect();
                (kept.len() != items.len()).then(|| Value::Array(kept))
            }
            Some(_) => Some(serde_json::json!([])),
            None => None,
        };
        if let Some(value) = replacement {
            debug!(field, "Normalized credential list field");
            root.insert(field.to_string(), value);
        }
    }

    let drop_single = match root.get("google_api_key") {
        Some(serde_json::Value::String(s)) => s.is_empty(),
        Some(_) => true,
        None => false,
    };
    if drop_single {
        root.remove("google_api_key");
    }

    if matches!(root.get("tokens"), Some(v) if !v.is_array()) {
        root.insert("tokens".to_string(), serde_json::json!([]));
    }
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `SALESREEL_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `SALESREEL_CREDENTIALS__GOOGLE_API_KEYS` (comma-separated)
/// - `SALESREEL_CREDENTIALS__OPENAI_API_KEYS` (comma-separated)
/// - `SALESREEL_CREDENTIALS__ELEVENLABS_API_KEYS` (comma-separated)
/// - `SALESREEL_CREDENTIALS__LABS_TOKENS` (comma-separated)
/// - `SALESREEL_DISPATCH__TIMEOUT_SECS`
/// - `SALESREEL_DISPATCH__DEFAULT_CONCURRENCY`
/// - `SALESREEL_IMAGE__PROVIDER` (`gemini` | `whisk`)
fn apply_env_overrides(mut config: Config) -> Config {
    let creds = &mut config.credentials;
    apply_list_env(&mut creds.google_api_keys, "GOOGLE_API_KEYS");
    apply_list_env(&mut creds.openai_api_keys, "OPENAI_API_KEYS");
    apply_list_env(&mut creds.elevenlabs_api_keys, "ELEVENLABS_API_KEYS");
    apply_list_env(&mut creds.labs_tokens, "LABS_TOKENS");

    if let Ok(val) = std::env::var("SALESREEL_DISPATCH__TIMEOUT_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.dispatch.timeout_secs = n;
        }
    }
    if let Ok(val) = std::env::var("SALESREEL_DISPATCH__DEFAULT_CONCURRENCY") {
        if let Ok(n) = val.parse::<usize>() {
            config.dispatch.default_concurrency = n;
        }
    }

    if let Ok(val) = std::env::var("SALESREEL_IMAGE__PROVIDER") {
        match val.to_lowercase().as_str() {
            "gemini" => config.image.provider = ImageProviderChoice::Gemini,
            "whisk" => config.image.provider = ImageProviderChoice::Whisk,
            other => warn!("Ignoring unknown SALESREEL_IMAGE__PROVIDER={}", other),
        }
    }

    config
}

/// Replace a credential list from a comma-separated env var.
fn apply_list_env(target: &mut Vec<String>, field: &str) {
    if let Ok(val) = std::env::var(format!("SALESREEL_CREDENTIALS__{field}")) {
        *target = split_list(&val);
    }
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
