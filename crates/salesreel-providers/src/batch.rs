//! Sequential scene batches with a fixed pause between scenes.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use salesreel_core::ProgressSink;

use crate::image::{FallbackOrchestrator, FallbackOutput, ImageError, ImageRequest};

/// One scene to render.
#[derive(Clone, Debug)]
pub struct Scene {
    pub index: usize,
    pub request: ImageRequest,
}

#[derive(Debug)]
pub struct SceneOutcome {
    pub index: usize,
    pub result: Result<FallbackOutput, ImageError>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// Outcomes of the scenes that ran, in order.
    pub outcomes: Vec<SceneOutcome>,
    /// `true` if the batch stopped early because it was cancelled.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Renders scenes one after another through a [`FallbackOrchestrator`].
///
/// Cancellation is checked before every scene and interrupts the pause
/// between scenes; a scene already in flight runs to completion.
#[derive(Clone, Debug)]
pub struct SceneBatch {
    orchestrator: FallbackOrchestrator,
    scene_delay: Duration,
    progress: ProgressSink,
}

impl SceneBatch {
    pub fn new(orchestrator: FallbackOrchestrator, scene_delay: Duration) -> Self {
        Self {
            orchestrator,
            scene_delay,
            progress: ProgressSink::noop(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub async fn run(&self, scenes: Vec<Scene>, cancel: CancellationToken) -> BatchReport {
        let total = scenes.len();
        let mut report = BatchReport::default();

        for (pos, scene) in scenes.into_iter().enumerate() {
            if pos > 0 && !self.scene_delay.is_zero() {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    break;
                }
                tokio::select! {
                    _ = cancel.cancelled() => {
                        report.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.scene_delay) => {}
                }
            }
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            self.progress
                .emit(&format!("Scene {} ({}/{}): generating image", scene.index, pos + 1, total));
            let result = self.orchestrator.generate(&scene.request).await;
            match &result {
                Ok(output) => {
                    self.progress.emit(&format!(
                        "Scene {}: done via {}",
                        scene.index, output.provider
                    ));
                }
                Err(e) => {
                    warn!(scene = scene.index, error = %e, "scene failed");
                    self.progress
                        .emit(&format!("Scene {}: failed: {}", scene.index, e));
                }
            }
            report.outcomes.push(SceneOutcome {
                index: scene.index,
                result,
            });
        }

        if report.cancelled {
            self.progress.emit(&format!(
                "Batch cancelled after {} of {} scenes",
                report.outcomes.len(),
                total
            ));
        }
        info!(
            scenes = total,
            ran = report.outcomes.len(),
            succeeded = report.succeeded(),
            cancelled = report.cancelled,
            "scene batch finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageWorkflow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Echoes the prompt; fails for prompts starting with "bad"; cancels the
    /// token once `cancel_after` calls have been made.
    struct Echo {
        calls: AtomicUsize,
        cancel_after: Option<(usize, CancellationToken)>,
    }

    #[async_trait]
    impl ImageWorkflow for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, request: &ImageRequest) -> Result<Vec<u8>, ImageError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((after, token)) = &self.cancel_after {
                if n >= *after {
                    token.cancel();
                }
            }
            if request.prompt.starts_with("bad") {
                return Err(ImageError::InvalidResponse {
                    provider: "echo".into(),
                    step: "generate",
                    message: "refused".into(),
                });
            }
            Ok(request.prompt.clone().into_bytes())
        }
    }

    fn scenes(prompts: &[&str]) -> Vec<Scene> {
        prompts
            .iter()
            .enumerate()
            .map(|(i, p)| Scene {
                index: i + 1,
                request: ImageRequest::new(*p),
            })
            .collect()
    }

    fn batch(echo: Echo, delay: Duration) -> SceneBatch {
        SceneBatch::new(FallbackOrchestrator::new(Arc::new(echo), None), delay)
    }

    #[tokio::test]
    async fn test_runs_all_scenes_in_order() {
        let echo = Echo {
            calls: AtomicUsize::new(0),
            cancel_after: None,
        };
        let report = batch(echo, Duration::from_millis(1))
            .run(scenes(&["one", "bad two", "three"]), CancellationToken::new())
            .await;

        assert!(!report.cancelled);
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        let indexes: Vec<usize> = report.outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
        assert_eq!(report.outcomes[2].result.as_ref().unwrap().bytes, b"three");
    }

    #[tokio::test]
    async fn test_cancel_keeps_completed_scenes() {
        let token = CancellationToken::new();
        let echo = Echo {
            calls: AtomicUsize::new(0),
            cancel_after: Some((2, token.clone())),
        };
        let report = batch(echo, Duration::from_millis(1))
            .run(scenes(&["a", "b", "c", "d"]), token)
            .await;

        assert!(report.cancelled);
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.succeeded(), 2);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_delay() {
        let token = CancellationToken::new();
        let echo = Echo {
            calls: AtomicUsize::new(0),
            cancel_after: None,
        };
        let runner = batch(echo, Duration::from_secs(60));

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            runner.run(scenes(&["a", "b"]), token),
        )
        .await
        .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.outcomes.len(), 1);
    }

    #[tokio::test]
    async fn test_already_cancelled_runs_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let echo = Echo {
            calls: AtomicUsize::new(0),
            cancel_after: None,
        };
        let report = batch(echo, Duration::ZERO).run(scenes(&["a"]), token).await;
        assert!(report.cancelled);
        assert!(report.outcomes.is_empty());
    }
}
