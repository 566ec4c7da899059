//! Whisk image remix over the labs credentials.
//!
//! Three explicit steps, each a separate dispatch:
//!
//! 1. `upload_reference` — once per reference image, yields a `mediaGenerationId`
//! 2. `run_recipe` — prompt plus the uploaded ids keyed by role
//! 3. `fetch_image` — inline `imageData`, or a download of `image.url`
//!
//! Any failed step fails the whole workflow.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::dispatcher::{LogicalRequest, ProviderDispatcher};

use super::{ImageError, ImageRequest, ImageWorkflow, ReferenceImage};

const NAME: &str = "whisk";

#[derive(Clone, Debug)]
pub struct WhiskWorkflow {
    dispatcher: ProviderDispatcher,
    timeout: Duration,
}

impl WhiskWorkflow {
    pub fn new(dispatcher: ProviderDispatcher, timeout: Duration) -> Self {
        Self { dispatcher, timeout }
    }

    pub async fn upload_reference(&self, reference: &ReferenceImage) -> Result<String, ImageError> {
        const STEP: &str = "upload_reference";
        let request = LogicalRequest::post("media:upload")
            .json(json!({
                "role": reference.role.as_str(),
                "image": {
                    "mimeType": reference.mime_type,
                    "data": BASE64.encode(&reference.data),
                }
            }))
            .timeout(self.timeout);
        let body = self.dispatch_json(STEP, request).await?;
        body.get("mediaGenerationId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .ok_or_else(|| invalid(STEP, format!("no mediaGenerationId in {body}")))
    }

    pub async fn run_recipe(&self, prompt: &str, inputs: Map<String, Value>) -> Result<Value, ImageError> {
        let request = LogicalRequest::post("models/image-remix:runImageRecipe")
            .json(json!({
                "recipeMediaInputs": inputs,
                "prompt": prompt,
            }))
            .timeout(self.timeout);
        self.dispatch_json("run_recipe", request).await
    }

    pub async fn fetch_image(&self, recipe: &Value) -> Result<Vec<u8>, ImageError> {
        const STEP: &str = "fetch_image";
        if let Some(data) = recipe.get("imageData").and_then(Value::as_str) {
            return BASE64
                .decode(data)
                .map_err(|e| invalid(STEP, format!("imageData is not valid base64: {e}")));
        }
        let url = recipe
            .pointer("/image/url")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(STEP, "neither imageData nor image.url in the recipe response".into()))?;

        let success = self
            .dispatcher
            .fetch_unauthenticated(url, self.timeout)
            .await
            .map_err(|source| ImageError::Dispatch {
                provider: NAME.to_string(),
                step: STEP,
                source,
            })?;
        let bytes = success.payload.into_bytes();
        if bytes.is_empty() {
            return Err(invalid(STEP, "downloaded image is empty".into()));
        }
        Ok(bytes)
    }

    async fn dispatch_json(&self, step: &'static str, request: LogicalRequest) -> Result<Value, ImageError> {
        let success = self
            .dispatcher
            .dispatch(request)
            .await
            .map_err(|source| ImageError::Dispatch {
                provider: NAME.to_string(),
                step,
                source,
            })?;
        match success.payload.as_json() {
            Some(body) => Ok(body.clone()),
            None => Err(invalid(step, "response body is not JSON".into())),
        }
    }
}

fn invalid(step: &'static str, message: String) -> ImageError {
    ImageError::InvalidResponse {
        provider: NAME.to_string(),
        step,
        message,
    }
}

#[async_trait]
impl ImageWorkflow for WhiskWorkflow {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, request: &ImageRequest) -> bool {
        request.has_references()
    }

    async fn generate(&self, request: &ImageRequest) -> Result<Vec<u8>, ImageError> {
        if !request.has_references() {
            return Err(ImageError::MissingReferences {
                provider: NAME.to_string(),
            });
        }

        let mut inputs = Map::new();
        for reference in &request.references {
            let id = self.upload_reference(reference).await?;
            debug!(role = reference.role.as_str(), "uploaded whisk reference");
            inputs.insert(
                reference.role.as_str().to_string(),
                json!({ "mediaGenerationId": id }),
            );
        }

        let recipe = self.run_recipe(&request.prompt, inputs).await?;
        self.fetch_image(&recipe).await
    }
}
