//! Attempt classification and retry policies.
//!
//! A transport outcome is classified into an [`AttemptClass`]; a policy maps
//! the class to the next [`Step`]. Two policies exist and differ only in how
//! they treat HTTP 429:
//!
//! - [`GenericPolicy`] — used by every plain dispatch. 429 is terminal.
//! - [`ImagePolicy`] — used by the Gemini image workflow. 429 waits a fixed
//!   delay and moves on to the next credential.

use std::time::Duration;

use crate::transport::CallOutcome;

/// What one attempt amounted to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptClass {
    Success,
    /// 401 / 403: this credential is invalid or exhausted.
    AuthFailure,
    /// 429.
    RateLimited,
    /// Any other HTTP failure, or no response at all.
    OtherFailure,
}

/// Classify a transport outcome.
pub fn classify(outcome: &CallOutcome) -> AttemptClass {
    if outcome.ok {
        return AttemptClass::Success;
    }
    match outcome.status {
        401 | 403 => AttemptClass::AuthFailure,
        429 => AttemptClass::RateLimited,
        _ => AttemptClass::OtherFailure,
    }
}

/// What the dispatch loop does after an attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Hand the successful outcome back to the caller.
    Return,
    /// Try the next credential right away.
    Rotate,
    /// Wait, then try the next credential.
    Backoff(Duration),
    /// Give up; the failure will not be fixed by another credential.
    Stop,
}

/// Maps an attempt class to the next step.
pub trait RetryPolicy: Send + Sync {
    fn next_step(&self, class: AttemptClass) -> Step;
}

/// Rotate on auth failures only; everything else is terminal.
#[derive(Clone, Copy, Debug, Default)]
pub struct GenericPolicy;

impl RetryPolicy for GenericPolicy {
    fn next_step(&self, class: AttemptClass) -> Step {
        match class {
            AttemptClass::Success => Step::Return,
            AttemptClass::AuthFailure => Step::Rotate,
            AttemptClass::RateLimited | AttemptClass::OtherFailure => Step::Stop,
        }
    }
}

/// Rotate on auth failures, back off then rotate on 429.
#[derive(Clone, Copy, Debug)]
pub struct ImagePolicy {
    pub rate_limit_delay: Duration,
}

impl ImagePolicy {
    pub fn new(rate_limit_delay: Duration) -> Self {
        Self { rate_limit_delay }
    }
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(2500))
    }
}

impl RetryPolicy for ImagePolicy {
    fn next_step(&self, class: AttemptClass) -> Step {
        match class {
            AttemptClass::Success => Step::Return,
            AttemptClass::AuthFailure => Step::Rotate,
            AttemptClass::RateLimited => Step::Backoff(self.rate_limit_delay),
            AttemptClass::OtherFailure => Step::Stop,
        }
    }
}
