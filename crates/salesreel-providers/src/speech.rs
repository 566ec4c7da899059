//! ElevenLabs text-to-speech.

use serde_json::json;
use tracing::debug;

use salesreel_core::config::SpeechConfig;

use crate::dispatcher::{LogicalRequest, ProviderDispatcher};
use crate::error::ClientError;

#[derive(Clone, Debug)]
pub struct ElevenLabsSpeech {
    dispatcher: ProviderDispatcher,
    model_id: String,
    output_format: String,
}

impl ElevenLabsSpeech {
    pub fn new(dispatcher: ProviderDispatcher, config: &SpeechConfig) -> Self {
        Self {
            dispatcher,
            model_id: config.model_id.clone(),
            output_format: config.output_format.clone(),
        }
    }

    /// Synthesize `text` with `voice_id`; returns the encoded audio.
    pub async fn synthesize(&self, voice_id: &str, text: &str) -> Result<Vec<u8>, ClientError> {
        let request = LogicalRequest::post(format!("text-to-speech/{voice_id}"))
            .header("accept", "audio/mpeg")
            .query("output_format", self.output_format.clone())
            .json(json!({
                "text": text,
                "model_id": self.model_id,
            }));
        let audio = self.dispatcher.dispatch(request).await?.payload.into_bytes();
        if audio.is_empty() {
            return Err(ClientError::InvalidResponse {
                provider: self.dispatcher.name().to_string(),
                message: "empty audio body".into(),
            });
        }
        debug!(voice_id, bytes = audio.len(), "speech synthesized");
        Ok(audio)
    }
}
