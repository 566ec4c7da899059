//! The credential registry — one [`RotationPool`] per provider, reseeded from
//! configuration on every refresh.
//!
//! Owned by the composition root and shared as `Arc<CredentialRegistry>`;
//! independent registries (e.g. one per test) never see each other's state.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::config::{Config, ConfigSource};

use super::merge::{merge_credentials, KNOWN_PROVIDERS};
use super::pool::{rotated, RotationPool};
use super::Credential;

pub struct CredentialRegistry {
    source: Arc<dyn ConfigSource>,
    /// Pools are created once and reseeded afterwards, so each provider's
    /// cursor lives as long as the registry.
    pools: RwLock<HashMap<String, Arc<RotationPool>>>,
}

impl std::fmt::Debug for CredentialRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRegistry")
            .field("pools", &self.pool_sizes())
            .finish()
    }
}

impl CredentialRegistry {
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self {
            source,
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// Reload configuration and reseed every known provider's pool whose
    /// credentials changed. Pools with unchanged credentials keep their cursor.
    ///
    /// Returns the snapshot that was used, so a caller reads configuration
    /// exactly once per dispatch.
    pub fn refresh(&self) -> Config {
        let config = self.source.load();
        for provider in KNOWN_PROVIDERS {
            let set = merge_credentials(provider, &config.credentials);
            let count = set.len();
            if self.pool_or_insert(provider).reseed_if_changed(set) {
                debug!(provider, credentials = count, "reseeded rotation pool");
            }
        }
        config
    }

    /// Current configuration, without touching any pool.
    pub fn config(&self) -> Config {
        self.source.load()
    }

    /// Next credential for `provider` in round-robin order.
    ///
    /// Refreshes first if the provider has no pool yet. `None` means the
    /// provider has no credentials.
    pub fn take(&self, provider: &str) -> Option<Credential> {
        if self.pool(provider).is_none() {
            self.refresh();
        }
        self.pool(provider)?.take()
    }

    /// `base` reordered to start at the provider's next rotation credential.
    ///
    /// An empty `base` is returned as is without advancing the cursor.
    pub fn rotated_list(&self, provider: &str, base: &[Credential]) -> Vec<Credential> {
        if base.is_empty() {
            return Vec::new();
        }
        match self.take(provider) {
            Some(head) => rotated(&head, base),
            None => base.to_vec(),
        }
    }

    /// Number of credentials per provider, sorted by provider name.
    pub fn pool_sizes(&self) -> Vec<(String, usize)> {
        let pools = self.pools.read().unwrap_or_else(PoisonError::into_inner);
        let mut sizes: Vec<(String, usize)> =
            pools.iter().map(|(name, pool)| (name.clone(), pool.len())).collect();
        sizes.sort();
        sizes
    }

    fn pool(&self, provider: &str) -> Option<Arc<RotationPool>> {
        self.pools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(provider)
            .cloned()
    }

    fn pool_or_insert(&self, provider: &str) -> Arc<RotationPool> {
        if let Some(pool) = self.pool(provider) {
            return pool;
        }
        let mut pools = self.pools.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(pools.entry(provider.to_string()).or_default())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LegacyToken, SharedConfig};
    use crate::credentials::providers::{ELEVENLABS, GOOGLE, LABS, OPENAI};

    fn registry_with(f: impl FnOnce(&mut Config)) -> (Arc<SharedConfig>, CredentialRegistry) {
        let mut config = Config::default();
        f(&mut config);
        let shared = Arc::new(SharedConfig::new(config));
        let registry = CredentialRegistry::new(shared.clone());
        (shared, registry)
    }

    fn creds(values: &[&str]) -> Vec<Credential> {
        values.iter().map(|v| Credential::new(*v)).collect()
    }

    #[test]
    fn test_take_auto_refreshes_unseen_provider() {
        let (_, registry) = registry_with(|c| c.credentials.google_api_keys = vec!["g1".into()]);
        assert!(registry.pool_sizes().is_empty());
        assert_eq!(registry.take(GOOGLE), Some("g1".into()));
        assert_eq!(registry.pool_sizes().len(), KNOWN_PROVIDERS.len());
    }

    #[test]
    fn test_take_unknown_provider_is_none() {
        let (_, registry) = registry_with(|_| {});
        assert!(registry.take("midjourney").is_none());
    }

    #[test]
    fn test_take_empty_provider_is_none() {
        let (_, registry) = registry_with(|c| c.credentials.labs_tokens = vec!["t".into()]);
        assert!(registry.take(ELEVENLABS).is_none());
        assert_eq!(registry.rotated_list(ELEVENLABS, &[]), Vec::<Credential>::new());
    }

    #[test]
    fn test_round_robin_over_merged_set() {
        let (_, registry) = registry_with(|c| {
            c.credentials.google_api_keys = vec!["a".into(), "b".into()];
            c.credentials.tokens = vec![LegacyToken::record("gemini", "c")];
        });
        let seen: Vec<Credential> = (0..6).filter_map(|_| registry.take(GOOGLE)).collect();
        assert_eq!(seen, creds(&["a", "b", "c", "a", "b", "c"]));
    }

    #[test]
    fn test_rotated_list_empty_base_consumes_nothing() {
        let (_, registry) = registry_with(|c| c.credentials.labs_tokens = vec!["t1".into(), "t2".into()]);
        registry.refresh();
        assert!(registry.rotated_list(LABS, &[]).is_empty());
        // Cursor still at the first token.
        assert_eq!(registry.take(LABS), Some("t1".into()));
    }

    #[test]
    fn test_rotated_list_spreads_heads() {
        let (_, registry) = registry_with(|c| {
            c.credentials.labs_tokens = vec!["t1".into(), "t2".into(), "t3".into()];
        });
        let base = creds(&["t1", "t2", "t3"]);
        registry.refresh();
        assert_eq!(registry.rotated_list(LABS, &base), creds(&["t1", "t2", "t3"]));
        assert_eq!(registry.rotated_list(LABS, &base), creds(&["t2", "t1", "t3"]));
        assert_eq!(registry.rotated_list(LABS, &base), creds(&["t3", "t1", "t2"]));
    }

    #[test]
    fn test_rotated_list_head_not_in_base() {
        let (_, registry) = registry_with(|c| c.credentials.labs_tokens = vec!["t1".into()]);
        let base = creds(&["other-1", "other-2"]);
        assert_eq!(registry.rotated_list(LABS, &base), base);
    }

    #[test]
    fn test_refresh_reseeds_not_recreates() {
        let (shared, registry) = registry_with(|c| c.credentials.google_api_keys = vec!["a".into()]);
        registry.refresh();
        let before = registry.pool(GOOGLE).unwrap();

        shared.update(|c| c.credentials.google_api_keys = vec!["x".into(), "y".into()]);
        registry.refresh();
        let after = registry.pool(GOOGLE).unwrap();

        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(registry.take(GOOGLE), Some("x".into()));
    }

    #[test]
    fn test_refresh_with_same_credentials_keeps_rotating() {
        let (_, registry) = registry_with(|c| c.credentials.openai_api_keys = vec!["a".into(), "b".into()]);
        registry.refresh();
        assert_eq!(registry.take(OPENAI), Some("a".into()));
        registry.refresh();
        assert_eq!(registry.take(OPENAI), Some("b".into()));
        registry.refresh();
        assert_eq!(registry.take(OPENAI), Some("a".into()));
    }

    #[test]
    fn test_independent_registries_do_not_share_cursors() {
        let (_, one) = registry_with(|c| c.credentials.google_api_keys = vec!["a".into(), "b".into()]);
        let (_, two) = registry_with(|c| c.credentials.google_api_keys = vec!["a".into(), "b".into()]);
        assert_eq!(one.take(GOOGLE), Some("a".into()));
        assert_eq!(one.take(GOOGLE), Some("b".into()));
        assert_eq!(two.take(GOOGLE), Some("a".into()));
    }
}
