//! Run failures and the halt signal.

use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

/// Configuration or programming errors that abort a run.
///
/// These are server-side failures, never client-facing negotiation outcomes.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Neither the resource nor the defaults implement a requested handler.
    #[error("No implementation for handler `{handler}` on resource `{resource}`")]
    MissingHandler { handler: String, resource: String },

    /// A handler replied with a shape the calling decision cannot interpret.
    #[error("Handler `{handler}` replied {reply}, expected {expected}")]
    UnexpectedReply {
        handler: String,
        expected: &'static str,
        reply: String,
    },

    /// The decision graph returned without finalizing the response.
    #[error("Run {run_id} ended without a final status")]
    Unfinished { run_id: Uuid },
}

/// Result type for run-level operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// Non-local exit from a decision step.
///
/// Steps only propagate this with `?`; the run driver is the single place
/// that resolves it. Its contents are private so no step can tell a halt
/// apart from a failure or swallow one selectively.
#[derive(Debug)]
pub struct Interrupt(pub(crate) Signal);

#[derive(Debug)]
pub(crate) enum Signal {
    Halt(StatusCode),
    Failed(FlowError),
}

impl Interrupt {
    pub(crate) fn halt(status: StatusCode) -> Self {
        Self(Signal::Halt(status))
    }
}

impl From<FlowError> for Interrupt {
    fn from(err: FlowError) -> Self {
        Self(Signal::Failed(err))
    }
}

/// What every decision step returns.
pub type Outcome = Result<(), Interrupt>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FlowError::MissingHandler {
            handler: "audit_log".into(),
            resource: "users".into(),
        };
        assert_eq!(
            err.to_string(),
            "No implementation for handler `audit_log` on resource `users`"
        );

        let err = FlowError::UnexpectedReply {
            handler: "resource_exists".into(),
            expected: "bool",
            reply: "Text(\"yes\")".into(),
        };
        assert!(err.to_string().contains("expected bool"));
    }
}
