//! Composition root for the dispatch layer.
//!
//! A [`DispatchHub`] owns one credential registry, one concurrency gate and
//! one transport, and hands out dispatchers and capability clients that all
//! share them. Two hubs never share rotation cursors or gate slots.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use salesreel_core::config::{ConfigSource, ImageProviderChoice};
use salesreel_core::{CredentialRegistry, ProgressSink};

use crate::batch::SceneBatch;
use crate::dispatcher::{DispatchContext, ProviderDispatcher};
use crate::gate::ConcurrencyGate;
use crate::image::{FallbackOrchestrator, GeminiImageWorkflow, ImageWorkflow, WhiskWorkflow};
use crate::registry::{find_by_name, ProviderSpec, ELEVENLABS_SPEC, GOOGLE_SPEC, LABS_SPEC};
use crate::speech::ElevenLabsSpeech;
use crate::text::GeminiText;
use crate::transport::{ReqwestTransport, Transport};

#[derive(Clone)]
pub struct DispatchHub {
    source: Arc<dyn ConfigSource>,
    ctx: DispatchContext,
}

impl std::fmt::Debug for DispatchHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchHub").field("ctx", &self.ctx).finish()
    }
}

impl DispatchHub {
    /// Hub with the reqwest transport and no progress narration.
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self::with_transport(source, Arc::new(ReqwestTransport::new()), ProgressSink::noop())
    }

    /// Gate limits are read once here; the registry re-reads credentials on
    /// every dispatch.
    pub fn with_transport(source: Arc<dyn ConfigSource>, transport: Arc<dyn Transport>, progress: ProgressSink) -> Self {
        let config = source.load();
        let gate = ConcurrencyGate::from_config(&config.dispatch);
        let registry = CredentialRegistry::new(source.clone());
        registry.refresh();
        debug!(pools = ?registry.pool_sizes(), "dispatch hub ready");

        Self {
            source,
            ctx: DispatchContext {
                registry: Arc::new(registry),
                gate: Arc::new(gate),
                transport,
                progress,
            },
        }
    }

    pub fn context(&self) -> &DispatchContext {
        &self.ctx
    }

    pub fn registry(&self) -> &Arc<CredentialRegistry> {
        &self.ctx.registry
    }

    pub fn gate(&self) -> &Arc<ConcurrencyGate> {
        &self.ctx.gate
    }

    pub fn progress(&self) -> &ProgressSink {
        &self.ctx.progress
    }

    /// Dispatcher for a known provider name.
    pub fn dispatcher(&self, provider: &str) -> Option<ProviderDispatcher> {
        find_by_name(provider).map(|spec| self.dispatcher_for(spec))
    }

    fn dispatcher_for(&self, spec: &'static ProviderSpec) -> ProviderDispatcher {
        ProviderDispatcher::new(spec, self.ctx.clone())
    }

    pub fn text(&self) -> GeminiText {
        GeminiText::from_config(self.dispatcher_for(&GOOGLE_SPEC), &self.source.load().text)
    }

    pub fn speech(&self) -> ElevenLabsSpeech {
        ElevenLabsSpeech::new(self.dispatcher_for(&ELEVENLABS_SPEC), &self.source.load().speech)
    }

    pub fn gemini_images(&self) -> GeminiImageWorkflow {
        GeminiImageWorkflow::from_config(self.dispatcher_for(&GOOGLE_SPEC), &self.source.load().image)
    }

    pub fn whisk(&self) -> WhiskWorkflow {
        let timeout = Duration::from_secs(self.source.load().image.timeout_secs);
        WhiskWorkflow::new(self.dispatcher_for(&LABS_SPEC), timeout)
    }

    /// Orchestrator ordered by `image.provider`; the other workflow is the
    /// fallback.
    pub fn image_orchestrator(&self) -> FallbackOrchestrator {
        let gemini: Arc<dyn ImageWorkflow> = Arc::new(self.gemini_images());
        let whisk: Arc<dyn ImageWorkflow> = Arc::new(self.whisk());
        let (primary, secondary) = match self.source.load().image.provider {
            ImageProviderChoice::Whisk => (whisk, gemini),
            ImageProviderChoice::Gemini => (gemini, whisk),
        };
        FallbackOrchestrator::new(primary, Some(secondary)).with_progress(self.ctx.progress.clone())
    }

    pub fn scene_batch(&self) -> SceneBatch {
        let delay = Duration::from_millis(self.source.load().image.scene_delay_ms);
        SceneBatch::new(self.image_orchestrator(), delay).with_progress(self.ctx.progress.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesreel_core::config::{Config, SharedConfig};

    fn hub(f: impl FnOnce(&mut Config)) -> DispatchHub {
        let mut config = Config::default();
        f(&mut config);
        DispatchHub::new(Arc::new(SharedConfig::new(config)))
    }

    #[test]
    fn test_dispatcher_lookup() {
        let hub = hub(|_| {});
        assert_eq!(hub.dispatcher("labs").unwrap().name(), "labs");
        assert!(hub.dispatcher("midjourney").is_none());
    }

    #[test]
    fn test_orchestrator_follows_image_provider() {
        let gemini_first = hub(|_| {}).image_orchestrator();
        assert_eq!(gemini_first.primary_name(), "gemini");
        assert_eq!(gemini_first.secondary_name(), Some("whisk"));

        let whisk_first = hub(|c| c.image.provider = ImageProviderChoice::Whisk).image_orchestrator();
        assert_eq!(whisk_first.primary_name(), "whisk");
        assert_eq!(whisk_first.secondary_name(), Some("gemini"));
    }

    #[test]
    fn test_gate_limits_from_config() {
        let hub = hub(|c| {
            c.dispatch.default_concurrency = 5;
            c.dispatch.concurrency.insert("google".into(), 2);
        });
        assert_eq!(hub.gate().limit("google"), 2);
        assert_eq!(hub.gate().limit("labs"), 5);
    }

    #[test]
    fn test_hubs_do_not_share_rotation() {
        let one = hub(|c| c.credentials.openai_api_keys = vec!["a".into(), "b".into()]);
        let two = hub(|c| c.credentials.openai_api_keys = vec!["a".into(), "b".into()]);
        assert_eq!(one.registry().take("openai"), Some("a".into()));
        assert_eq!(two.registry().take("openai"), Some("a".into()));
        assert_eq!(one.registry().take("openai"), Some("b".into()));
    }
}
