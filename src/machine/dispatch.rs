//! Resource dispatch.
//!
//! # Responsibilities
//! - Resolve a handler on the resource, falling back to the defaults
//! - Record every call (inputs and outputs) on the current trace entry
//! - Turn a `Halt` reply into a finalized context and a non-local exit
//!
//! # Design Decisions
//! - The call is recorded before the halt is acted on, so halting calls
//!   appear in the trace like any other
//! - A handler with neither an override nor a default fails the run

use std::fmt;

use crate::machine::decision::Run;
use crate::machine::defaults::{default_reply, DEFAULTS};
use crate::machine::error::{FlowError, Interrupt};
use crate::machine::resource::{Handler, Reply};
use crate::machine::trace::{Call, Snapshot};

impl<S: fmt::Debug> Run<S> {
    /// Ask the resource about `handler`.
    ///
    /// Returns the reply for the calling step to interpret, or an
    /// [`Interrupt`] that the step must propagate with `?`.
    pub fn call(&mut self, handler: Handler) -> Result<Reply, Interrupt> {
        let input = Snapshot::capture(&self.ctx, &self.state);

        let (implementation, reply) = match self.resource.lookup(handler) {
            Some(f) => (
                self.resource.name().to_string(),
                f(&mut self.ctx, &mut self.state),
            ),
            None => match default_reply(handler, &self.ctx) {
                Some(reply) => (DEFAULTS.to_string(), reply),
                None => {
                    return Err(FlowError::MissingHandler {
                        handler: handler.to_string(),
                        resource: self.resource.name().to_string(),
                    }
                    .into())
                }
            },
        };

        tracing::trace!(
            run_id = %self.ctx.id(),
            handler = %handler,
            implementation = %implementation,
            reply = ?reply,
            "Handler called"
        );

        let call = Call {
            implementation,
            handler: handler.to_string(),
            input,
            reply: format!("{:?}", reply),
            output: Snapshot::capture(&self.ctx, &self.state),
        };
        self.ctx.trace_mut().record(call);

        match reply {
            Reply::Halt(status) => {
                tracing::debug!(run_id = %self.ctx.id(), handler = %handler, status = status.as_u16(), "Handler halted run");
                self.ctx.finalize(status);
                Err(Interrupt::halt(status))
            }
            reply => Ok(reply),
        }
    }
}
