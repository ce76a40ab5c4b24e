//! Decision step execution and the run driver.
//!
//! # Execution Model
//! ```text
//! run(resource, context, state, entry)
//!     → entry(&mut Run)
//!         → run.decide("b13", |run| ...)     records trace entry, runs body
//!             → run.call(Handler::X)?        may halt: Err(Interrupt) unwinds
//!             → next_step(run)               tail call to successor
//!             → run.finalize(status)         terminal
//!     → Interrupt(Halt)   → finalized context returned
//!     → Interrupt(Failed) → FlowError returned to caller
//! ```
//!
//! Steps are plain functions that call their successor directly; the graph
//! is code, not a table.

use axum::http::StatusCode;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::machine::context::Context;
use crate::machine::error::{FlowError, FlowResult, Outcome, Signal};
use crate::machine::resource::Resource;
use crate::observability::metrics;

/// A decision step function.
pub type Step<S> = fn(&mut Run<S>) -> Outcome;

/// State owned by one traversal: the context, the user state, and the
/// resource answering handler calls.
pub struct Run<S> {
    pub(crate) ctx: Context,
    pub(crate) state: S,
    pub(crate) resource: Arc<Resource<S>>,
}

impl<S: fmt::Debug> Run<S> {
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn resource(&self) -> &Resource<S> {
        &self.resource
    }

    /// Enter the decision step `name` and run its body.
    ///
    /// A finalized context never runs another step: the call is a no-op.
    pub fn decide<F>(&mut self, name: &'static str, body: F) -> Outcome
    where
        F: FnOnce(&mut Self) -> Outcome,
    {
        if self.ctx.is_finalized() {
            tracing::debug!(run_id = %self.ctx.id(), decision = name, "Skipping decision on finalized context");
            return Ok(());
        }

        self.ctx.trace_mut().enter(name);
        tracing::trace!(run_id = %self.ctx.id(), decision = name, "Entering decision");
        body(self)
    }

    /// Terminate the traversal with `status`.
    pub fn finalize(&mut self, status: StatusCode) -> Outcome {
        self.ctx.finalize(status);
        Ok(())
    }
}

/// A run that reached a final status.
#[derive(Debug)]
pub struct Finished<S> {
    pub context: Context,
    pub state: S,
}

impl<S> Finished<S> {
    pub fn status(&self) -> StatusCode {
        // Finished is only built from a finalized context.
        self.context.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Drive `entry` over `ctx` until the response is finalized.
///
/// Halts issued by handlers end here and yield the finalized context;
/// configuration failures are returned as errors.
pub fn run<S: fmt::Debug>(
    resource: Arc<Resource<S>>,
    ctx: Context,
    state: S,
    entry: Step<S>,
) -> FlowResult<Finished<S>> {
    let run_id = ctx.id();
    let span = tracing::debug_span!("decision_run", run_id = %run_id, resource = resource.name());
    let _guard = span.enter();
    let start = Instant::now();

    let mut run = Run {
        ctx,
        state,
        resource,
    };

    match entry(&mut run) {
        Ok(()) => {}
        Err(interrupt) => match interrupt.0 {
            Signal::Halt(status) => {
                tracing::debug!(status = status.as_u16(), "Run halted by handler");
                metrics::record_halt(status.as_u16());
            }
            Signal::Failed(err) => {
                tracing::error!(error = %err, "Decision run failed");
                metrics::record_run_error();
                return Err(err);
            }
        },
    }

    let Some(status) = run.ctx.status() else {
        tracing::error!("Decision graph returned without finalizing");
        metrics::record_run_error();
        return Err(FlowError::Unfinished { run_id });
    };

    metrics::record_run(status.as_u16(), start);
    tracing::debug!(status = status.as_u16(), steps = run.ctx.trace().len(), "Decision run complete");

    Ok(Finished {
        context: run.ctx,
        state: run.state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::context::Request;
    use crate::machine::resource::{Handler, Reply};
    use axum::http::Method;

    fn context() -> Context {
        Context::new(Request::new(Method::GET, "/"))
    }

    fn first(run: &mut Run<u32>) -> Outcome {
        run.decide("first", |run| {
            run.state += 1;
            second(run)
        })
    }

    fn second(run: &mut Run<u32>) -> Outcome {
        run.decide("second", |run| {
            if run.call(Handler::ResourceExists)?.into_bool(Handler::ResourceExists)? {
                third(run)
            } else {
                run.finalize(StatusCode::NOT_FOUND)
            }
        })
    }

    fn third(run: &mut Run<u32>) -> Outcome {
        run.decide("third", |run| {
            run.call(Handler::Forbidden)?;
            run.finalize(StatusCode::OK)?;
            after_final(run)
        })
    }

    fn after_final(run: &mut Run<u32>) -> Outcome {
        run.decide("after_final", |run| run.finalize(StatusCode::ACCEPTED))
    }

    fn never_finalizes(run: &mut Run<u32>) -> Outcome {
        run.decide("open_end", |_| Ok(()))
    }

    #[test]
    fn test_run_reaches_final_status() {
        let resource = Arc::new(Resource::new("plain"));
        let done = run(resource, context(), 0u32, first).unwrap();
        assert_eq!(done.status(), StatusCode::OK);
        assert_eq!(done.state, 1);
        assert_eq!(done.context.trace().decisions(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_finalized_context_runs_no_more_steps() {
        let resource = Arc::new(Resource::new("plain"));
        let done = run(resource, context(), 0u32, first).unwrap();
        assert!(!done.context.trace().decisions().contains(&"after_final"));
        assert_eq!(done.status(), StatusCode::OK);
    }

    #[test]
    fn test_branching_on_reply() {
        let resource = Arc::new(
            Resource::new("missing").handle(Handler::ResourceExists, |_, _| Reply::Bool(false)),
        );
        let done = run(resource, context(), 0u32, first).unwrap();
        assert_eq!(done.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_halt_three_steps_deep() {
        let resource = Arc::new(Resource::new("halting").handle(
            Handler::Forbidden,
            |_, state: &mut u32| {
                *state = 99;
                Reply::Halt(StatusCode::SEE_OTHER)
            },
        ));
        let done = run(resource, context(), 0u32, first).unwrap();

        assert_eq!(done.status(), StatusCode::SEE_OTHER);
        assert_eq!(done.state, 99);
        let decisions = done.context.trace().decisions();
        assert_eq!(decisions.last(), Some(&"third"));
        assert_eq!(decisions.len(), 3);
    }

    #[test]
    fn test_unfinished_run_is_an_error() {
        let resource = Arc::new(Resource::new("plain"));
        let err = run(resource, context(), 0u32, never_finalizes).unwrap_err();
        assert!(matches!(err, FlowError::Unfinished { .. }));
    }

    #[test]
    fn test_reply_mismatch_fails_run() {
        let resource = Arc::new(
            Resource::new("confused")
                .handle(Handler::ResourceExists, |_, _| Reply::Text("yes".into())),
        );
        let err = run(resource, context(), 0u32, first).unwrap_err();
        assert!(matches!(err, FlowError::UnexpectedReply { .. }));
    }
}
