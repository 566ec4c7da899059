//! Image generation: provider workflows and the fallback orchestrator.
//!
//! - [`gemini::GeminiImageWorkflow`] — one `generateContent` call over the
//!   google credentials, with the image retry policy
//! - [`whisk::WhiskWorkflow`] — multi-step upload / recipe / fetch flow over
//!   the labs credentials
//! - [`fallback::FallbackOrchestrator`] — primary then secondary, never more

pub mod fallback;
pub mod gemini;
pub mod whisk;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::error::DispatchFailure;

pub use fallback::{FallbackOrchestrator, FallbackOutput, FallbackState};
pub use gemini::GeminiImageWorkflow;
pub use whisk::WhiskWorkflow;

// ─────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────

/// What a reference image is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceRole {
    /// The person or model to feature.
    Subject,
    Style,
    /// The product or setting.
    Scene,
}

impl ReferenceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceRole::Subject => "subject",
            ReferenceRole::Style => "style",
            ReferenceRole::Scene => "scene",
        }
    }
}

/// An in-memory reference image.
#[derive(Clone, Debug)]
pub struct ReferenceImage {
    pub role: ReferenceRole,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ReferenceImage {
    pub fn new(role: ReferenceRole, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            role,
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Read an image file; the MIME type comes from the extension.
    pub async fn from_path(role: ReferenceRole, path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| ImageError::ReadReference {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(role, mime_type_for(path), data))
    }
}

/// MIME type by file extension; unknown extensions are treated as JPEG.
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

/// One image to generate.
#[derive(Clone, Debug, Default)]
pub struct ImageRequest {
    pub prompt: String,
    pub references: Vec<ReferenceImage>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            references: Vec::new(),
        }
    }

    pub fn with_reference(mut self, reference: ReferenceImage) -> Self {
        self.references.push(reference);
        self
    }

    pub fn has_references(&self) -> bool {
        !self.references.is_empty()
    }
}

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ImageError {
    /// A dispatch inside the workflow failed.
    #[error("{provider} {step} failed: {}", source.error_text)]
    Dispatch {
        provider: String,
        step: &'static str,
        #[source]
        source: DispatchFailure,
    },

    /// Every credential was rate limited.
    #[error("{provider} rate limited after {attempts} attempt(s): {message}")]
    RateLimited {
        provider: String,
        attempts: usize,
        message: String,
    },

    /// The provider answered 2xx without a usable image.
    #[error("{provider} {step} returned no usable data: {message}")]
    InvalidResponse {
        provider: String,
        step: &'static str,
        message: String,
    },

    /// No configured workflow accepts the request.
    #[error("no image workflow supports this request (tried: {tried})")]
    Unsupported { tried: String },

    #[error("{provider} needs at least one reference image")]
    MissingReferences { provider: String },

    #[error("failed to read reference image {}: {source}", path.display())]
    ReadReference {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Primary and secondary both failed.
    #[error("{primary} failed ({primary_error}); {secondary} failed ({secondary_error})")]
    BothFailed {
        primary: String,
        primary_error: Box<ImageError>,
        secondary: String,
        secondary_error: Box<ImageError>,
    },
}

// ─────────────────────────────────────────────
// Workflow trait
// ─────────────────────────────────────────────

/// One provider's way of turning an [`ImageRequest`] into image bytes.
#[async_trait]
pub trait ImageWorkflow: Send + Sync {
    /// Provider name, used in errors and progress lines.
    fn name(&self) -> &str;

    /// Whether this workflow can serve `request` at all.
    fn supports(&self, _request: &ImageRequest) -> bool {
        true
    }

    async fn generate(&self, request: &ImageRequest) -> Result<Vec<u8>, ImageError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use std::io::Write;

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for(Path::new("model.PNG")), "image/png");
        assert_eq!(mime_type_for(Path::new("a/b/product.webp")), "image/webp");
        assert_eq!(mime_type_for(Path::new("x.jpeg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("noext")), "image/jpeg");
    }

    #[tokio::test]
    async fn test_reference_from_path() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(&[0x89, b'P', b'N', b'G']).unwrap();

        let reference = ReferenceImage::from_path(ReferenceRole::Subject, file.path())
            .await
            .unwrap();
        assert_eq!(reference.mime_type, "image/png");
        assert_eq!(reference.data, vec![0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_reference_from_missing_path() {
        let err = ReferenceImage::from_path(ReferenceRole::Scene, "/definitely/not/here.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, ImageError::ReadReference { .. }));
        assert!(err.to_string().contains("/definitely/not/here.jpg"));
    }

    #[test]
    fn test_both_failed_names_both_reasons() {
        let primary = ImageError::MissingReferences {
            provider: "whisk".into(),
        };
        let secondary = ImageError::Dispatch {
            provider: "gemini".into(),
            step: "generate",
            source: DispatchFailure::without_response("google", FailureKind::Http, "HTTP 500: boom"),
        };
        let err = ImageError::BothFailed {
            primary: "whisk".into(),
            primary_error: Box::new(primary),
            secondary: "gemini".into(),
            secondary_error: Box::new(secondary),
        };
        let text = err.to_string();
        assert!(text.contains("needs at least one reference image"));
        assert!(text.contains("HTTP 500: boom"));
    }
}
