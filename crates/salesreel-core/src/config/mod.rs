//! Configuration system — schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use salesreel_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Timeout: {}s", cfg.dispatch.timeout_secs);
//! ```

pub mod loader;
pub mod schema;
pub mod source;

// Re-export key types
pub use loader::{get_config_path, load_config, save_config};
pub use schema::{
    Config, CredentialSources, DispatchConfig, ImageConfig, ImageProviderChoice, LegacyToken,
    SpeechConfig, TextConfig,
};
pub use source::{ConfigSource, FileConfigSource, SharedConfig};
