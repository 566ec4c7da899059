//! Primary → secondary image fallback.

use std::sync::Arc;

use tracing::{info, warn};

use salesreel_core::ProgressSink;

use super::{ImageError, ImageRequest, ImageWorkflow};

/// Bytes plus the name of the workflow that produced them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallbackOutput {
    pub bytes: Vec<u8>,
    pub provider: String,
}

/// Where a fallback run currently is.
#[derive(Debug)]
pub enum FallbackState {
    TryPrimary,
    /// `primary_error` is `None` when the primary was skipped.
    TrySecondary { primary_error: Option<ImageError> },
    Done(FallbackOutput),
    Failed(ImageError),
}

/// Runs the primary workflow and, if it fails entirely, the secondary.
///
/// At most two workflows are ever tried per request. A workflow that does
/// not [`support`](ImageWorkflow::supports) the request is skipped.
#[derive(Clone)]
pub struct FallbackOrchestrator {
    primary: Arc<dyn ImageWorkflow>,
    secondary: Option<Arc<dyn ImageWorkflow>>,
    progress: ProgressSink,
}

impl std::fmt::Debug for FallbackOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackOrchestrator")
            .field("primary", &self.primary.name())
            .field("secondary", &self.secondary.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}

impl FallbackOrchestrator {
    pub fn new(primary: Arc<dyn ImageWorkflow>, secondary: Option<Arc<dyn ImageWorkflow>>) -> Self {
        Self {
            primary,
            secondary,
            progress: ProgressSink::noop(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn primary_name(&self) -> &str {
        self.primary.name()
    }

    pub fn secondary_name(&self) -> Option<&str> {
        self.secondary.as_deref().map(|s| s.name())
    }

    pub async fn generate(&self, request: &ImageRequest) -> Result<FallbackOutput, ImageError> {
        let mut state = FallbackState::TryPrimary;
        loop {
            state = match state {
                FallbackState::TryPrimary => self.try_primary(request).await,
                FallbackState::TrySecondary { primary_error } => {
                    self.try_secondary(request, primary_error).await
                }
                FallbackState::Done(output) => return Ok(output),
                FallbackState::Failed(err) => return Err(err),
            };
        }
    }

    async fn try_primary(&self, request: &ImageRequest) -> FallbackState {
        let primary = &self.primary;
        if !primary.supports(request) {
            if self.secondary.is_none() {
                return FallbackState::Failed(self.unsupported());
            }
            self.progress
                .emit(&format!("{} skipped for this request", primary.name()));
            return FallbackState::TrySecondary {
                primary_error: None,
            };
        }

        match run(primary.as_ref(), request).await {
            Ok(output) => FallbackState::Done(output),
            Err(err) => {
                warn!(provider = primary.name(), error = %err, "primary image workflow failed");
                match &self.secondary {
                    Some(secondary) => {
                        self.progress.emit(&format!(
                            "{} failed: {}, falling back to {}",
                            primary.name(),
                            err,
                            secondary.name()
                        ));
                        FallbackState::TrySecondary {
                            primary_error: Some(err),
                        }
                    }
                    None => FallbackState::Failed(err),
                }
            }
        }
    }

    async fn try_secondary(&self, request: &ImageRequest, primary_error: Option<ImageError>) -> FallbackState {
        let Some(secondary) = &self.secondary else {
            return FallbackState::Failed(primary_error.unwrap_or_else(|| self.unsupported()));
        };

        if !secondary.supports(request) {
            return FallbackState::Failed(primary_error.unwrap_or_else(|| self.unsupported()));
        }

        match run(secondary.as_ref(), request).await {
            Ok(output) => {
                info!(provider = secondary.name(), "image produced by fallback workflow");
                FallbackState::Done(output)
            }
            Err(err) => {
                warn!(provider = secondary.name(), error = %err, "secondary image workflow failed");
                match primary_error {
                    Some(primary_err) => FallbackState::Failed(ImageError::BothFailed {
                        primary: self.primary.name().to_string(),
                        primary_error: Box::new(primary_err),
                        secondary: secondary.name().to_string(),
                        secondary_error: Box::new(err),
                    }),
                    None => FallbackState::Failed(err),
                }
            }
        }
    }

    fn unsupported(&self) -> ImageError {
        let mut tried = vec![self.primary.name().to_string()];
        tried.extend(self.secondary.iter().map(|s| s.name().to_string()));
        ImageError::Unsupported {
            tried: tried.join(", "),
        }
    }
}

async fn run(workflow: &dyn ImageWorkflow, request: &ImageRequest) -> Result<FallbackOutput, ImageError> {
    let bytes = workflow.generate(request).await?;
    Ok(FallbackOutput {
        bytes,
        provider: workflow.name().to_string(),
    })
}
