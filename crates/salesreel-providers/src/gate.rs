//! Per-provider concurrency gate.
//!
//! Each provider gets its own semaphore, created on first use with the
//! provider's configured limit. Holding a [`GatePermit`] occupies one slot;
//! dropping it (on any exit path) frees the slot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use salesreel_core::config::DispatchConfig;

/// The gate for a provider was closed; no further calls are admitted.
#[derive(Debug, Error)]
#[error("concurrency gate for '{0}' is closed")]
pub struct GateClosed(pub String);

/// An admitted slot. The slot is released when this is dropped.
#[derive(Debug)]
pub struct GatePermit {
    provider: String,
    _permit: OwnedSemaphorePermit,
}

impl GatePermit {
    pub fn provider(&self) -> &str {
        &self.provider
    }
}

/// Bounds simultaneous in-flight calls per provider.
#[derive(Debug)]
pub struct ConcurrencyGate {
    default_limit: usize,
    limits: HashMap<String, usize>,
    semaphores: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl ConcurrencyGate {
    pub fn new(default_limit: usize, limits: HashMap<String, usize>) -> Self {
        Self {
            default_limit,
            limits,
            semaphores: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.default_concurrency, config.concurrency.clone())
    }

    /// Configured limit for `provider`; never below 1.
    pub fn limit(&self, provider: &str) -> usize {
        self.limits
            .get(provider)
            .copied()
            .unwrap_or(self.default_limit)
            .max(1)
    }

    /// Wait for a free slot for `provider`.
    pub async fn acquire(&self, provider: &str) -> Result<GatePermit, GateClosed> {
        let semaphore = self.semaphore(provider);
        if semaphore.available_permits() == 0 {
            debug!(provider, "concurrency gate full, waiting for a slot");
        }
        let permit = semaphore
            .acquire_owned()
            .await
            .map_err(|_| GateClosed(provider.to_string()))?;
        Ok(GatePermit {
            provider: provider.to_string(),
            _permit: permit,
        })
    }

    /// Free slots for `provider` right now.
    pub fn available(&self, provider: &str) -> usize {
        self.semaphore(provider).available_permits()
    }

    /// Stop admitting calls for `provider`. Waiters get [`GateClosed`].
    pub fn close(&self, provider: &str) {
        self.semaphore(provider).close();
    }

    fn semaphore(&self, provider: &str) -> Arc<Semaphore> {
        let mut map = self.semaphores.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(provider.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.limit(provider))))
            .clone()
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
