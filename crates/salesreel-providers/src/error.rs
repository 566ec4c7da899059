//! Error values returned by dispatchers and capability clients.
//!
//! Every failure of the dispatch layer is a value of one of these types;
//! nothing here is raised as a panic.

use std::collections::HashMap;

use thiserror::Error;

use crate::policy::AttemptClass;

/// Why a dispatch gave up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Every credential was rejected with 401/403.
    CredentialsExhausted,
    /// 429 from the provider.
    RateLimited,
    /// Any other non-2xx response.
    Http,
    /// No response (connect error, timeout, …).
    Transport,
    /// The concurrency gate refused admission.
    Gate,
}

impl FailureKind {
    /// Failure kind for the class of the last attempt made.
    pub fn from_last_attempt(class: AttemptClass, status: u16) -> Self {
        match class {
            AttemptClass::AuthFailure => FailureKind::CredentialsExhausted,
            AttemptClass::RateLimited => FailureKind::RateLimited,
            _ if status == 0 => FailureKind::Transport,
            _ => FailureKind::Http,
        }
    }
}

/// Structured failure of a whole dispatch (all attempts for one provider).
#[derive(Clone, Debug, Error)]
#[error("{provider}: {error_text}")]
pub struct DispatchFailure {
    pub provider: String,
    pub kind: FailureKind,
    /// Error text of the last attempt.
    pub error_text: String,
    /// Trace id from the last response's trace header, or empty.
    pub trace_id: String,
    /// HTTP status of the last attempt (0 if there was no response).
    pub status: u16,
    pub headers: HashMap<String, String>,
    /// Number of transport attempts made.
    pub attempts: usize,
}

impl DispatchFailure {
    /// A failure that happened before any response was received.
    pub fn without_response(provider: &str, kind: FailureKind, error_text: impl Into<String>) -> Self {
        Self {
            provider: provider.to_string(),
            kind,
            error_text: error_text.into(),
            trace_id: String::new(),
            status: 0,
            headers: HashMap::new(),
            attempts: 0,
        }
    }
}

/// Errors from thin capability clients (text, speech).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Dispatch(#[from] DispatchFailure),

    /// The provider answered 2xx but without the expected field.
    #[error("{provider}: invalid response: {message}")]
    InvalidResponse { provider: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_from_last_attempt() {
        assert_eq!(
            FailureKind::from_last_attempt(AttemptClass::AuthFailure, 401),
            FailureKind::CredentialsExhausted
        );
        assert_eq!(
            FailureKind::from_last_attempt(AttemptClass::RateLimited, 429),
            FailureKind::RateLimited
        );
        assert_eq!(
            FailureKind::from_last_attempt(AttemptClass::OtherFailure, 0),
            FailureKind::Transport
        );
        assert_eq!(
            FailureKind::from_last_attempt(AttemptClass::OtherFailure, 500),
            FailureKind::Http
        );
    }

    #[test]
    fn test_display_names_provider() {
        let failure = DispatchFailure::without_response("labs", FailureKind::Gate, "gate closed");
        assert_eq!(failure.to_string(), "labs: gate closed");
        let err: ClientError = failure.into();
        assert_eq!(err.to_string(), "labs: gate closed");
    }
}
