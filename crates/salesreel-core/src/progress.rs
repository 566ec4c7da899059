//! Progress narration sink.
//!
//! Callers (a UI, the CLI) may subscribe to human-readable progress lines.
//! The sink is write-only: nothing it does can change a dispatch outcome.

use std::fmt;
use std::sync::Arc;

/// Callback receiving one progress line at a time.
pub type ProgressFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Cheap-to-clone handle to an optional progress callback.
#[derive(Clone, Default)]
pub struct ProgressSink {
    callback: Option<ProgressFn>,
}

impl ProgressSink {
    /// A sink that drops every message.
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn new(callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            callback: Some(Arc::new(callback)),
        }
    }

    pub fn emit(&self, message: &str) {
        if let Some(cb) = &self.callback {
            cb(message);
        }
    }

    pub fn is_noop(&self) -> bool {
        self.callback.is_none()
    }
}

impl fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressSink")
            .field("noop", &self.is_noop())
            .finish()
    }
}
