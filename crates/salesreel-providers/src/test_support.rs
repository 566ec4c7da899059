//! Shared fixtures for unit tests.

use std::sync::Arc;

use salesreel_core::config::{Config, SharedConfig};
use salesreel_core::{CredentialRegistry, ProgressSink};

use crate::dispatcher::{DispatchContext, ProviderDispatcher};
use crate::gate::ConcurrencyGate;
use crate::registry::find_by_name;
use crate::transport::ReqwestTransport;

/// A context whose every provider points at `base_url`.
pub(crate) fn context(base_url: &str, f: impl FnOnce(&mut Config)) -> (Arc<SharedConfig>, DispatchContext) {
    let mut config = Config::default();
    for provider in ["google", "openai", "elevenlabs", "labs"] {
        config
            .dispatch
            .api_bases
            .insert(provider.to_string(), base_url.to_string());
    }
    f(&mut config);
    let gate = Arc::new(ConcurrencyGate::from_config(&config.dispatch));
    let shared = Arc::new(SharedConfig::new(config));
    let ctx = DispatchContext {
        registry: Arc::new(CredentialRegistry::new(shared.clone())),
        gate,
        transport: Arc::new(ReqwestTransport::new()),
        progress: ProgressSink::noop(),
    };
    (shared, ctx)
}

pub(crate) fn dispatcher(ctx: &DispatchContext, provider: &str) -> ProviderDispatcher {
    ProviderDispatcher::new(find_by_name(provider).unwrap(), ctx.clone())
}
