//! Where the dispatch layer reads configuration from.
//!
//! Every dispatch re-reads configuration, so a key added to the config file
//! is picked up by the next call without a restart.

use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use super::loader::load_config;
use super::schema::Config;

/// A synchronous configuration provider.
///
/// `load` must not fail: missing or broken configuration yields defaults.
pub trait ConfigSource: Send + Sync {
    /// Return a fresh snapshot of the configuration.
    fn load(&self) -> Config;
}

/// A fixed snapshot.
impl ConfigSource for Config {
    fn load(&self) -> Config {
        self.clone()
    }
}

/// Reads the JSON config file (plus env overrides) on every `load`.
#[derive(Clone, Debug, Default)]
pub struct FileConfigSource {
    /// `None` means the default `~/.salesreel/config.json`.
    path: Option<PathBuf>,
}

impl FileConfigSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// The file this source reads.
    pub fn path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(super::get_config_path)
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> Config {
        load_config(self.path.as_deref())
    }
}

/// An in-memory config that can be replaced at runtime.
#[derive(Debug, Default)]
pub struct SharedConfig {
    inner: RwLock<Config>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self {
            inner: RwLock::new(config),
        }
    }

    /// Replace the whole configuration.
    pub fn replace(&self, config: Config) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Edit the configuration in place.
    pub fn update(&self, f: impl FnOnce(&mut Config)) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}

impl ConfigSource for SharedConfig {
    fn load(&self) -> Config {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
