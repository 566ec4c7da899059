//! Provider dispatch layer for SalesReel.
//!
//! # Architecture
//!
//! - [`transport::Transport`] — one HTTP attempt, reported as a [`transport::CallOutcome`]
//! - [`gate::ConcurrencyGate`] — per-provider bound on in-flight calls
//! - [`policy`] — attempt classification and the generic / image retry policies
//! - [`dispatcher::ProviderDispatcher`] — credential rotation around the transport
//! - [`image`] — Gemini and Whisk workflows plus the fallback orchestrator
//! - [`text`], [`speech`] — thin capability clients
//! - [`batch::SceneBatch`] — cancellable sequential scene rendering
//! - [`hub::DispatchHub`] — wires everything to one registry, gate and transport

pub mod batch;
pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod hub;
pub mod image;
pub mod policy;
pub mod registry;
pub mod speech;
pub mod text;
pub mod transport;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use batch::{BatchReport, Scene, SceneBatch, SceneOutcome};
pub use dispatcher::{DispatchContext, DispatchResult, DispatchSuccess, LogicalRequest, ProviderDispatcher};
pub use error::{ClientError, DispatchFailure, FailureKind};
pub use gate::{ConcurrencyGate, GateClosed, GatePermit};
pub use hub::DispatchHub;
pub use image::{FallbackOrchestrator, FallbackOutput, ImageError, ImageRequest, ImageWorkflow, ReferenceImage, ReferenceRole};
pub use policy::{AttemptClass, GenericPolicy, ImagePolicy, RetryPolicy, Step};
pub use registry::{find_by_name, AuthScheme, ProviderSpec, PROVIDERS};
pub use transport::{CallOutcome, HttpRequest, Payload, ReqwestTransport, Transport};
