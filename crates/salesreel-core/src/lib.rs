//! SalesReel core — configuration, credential pools, and progress narration.
//!
//! - [`config`] — schema, loader with legacy migrations, [`config::ConfigSource`]
//! - [`credentials`] — credential merge, rotation pools, and the registry
//! - [`progress`] — injectable progress sink with a no-op default
//! - [`utils`] — paths, timestamps, string helpers

pub mod config;
pub mod credentials;
pub mod progress;
pub mod utils;

pub use config::{Config, ConfigSource};
pub use credentials::{Credential, CredentialRegistry, CredentialSet, RotationPool};
pub use progress::ProgressSink;
