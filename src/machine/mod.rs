//! Decision machine subsystem.
//!
//! # Data Flow
//! ```text
//! Request + Resource<S> + initial state S
//!     → context.rs (Context: request, response, metadata, trace)
//!     → decision.rs (run driver, decide, finalize)
//!         → dispatch.rs (Run::call: resource override or defaults.rs)
//!             → trace.rs (record call snapshots)
//!             → Halt reply: finalize + Interrupt up to the driver
//!     → Finished { context, state }  or  FlowError
//! ```
//!
//! # Design Decisions
//! - One run owns its context, state and resource handle; nothing is shared
//!   across runs except the immutable defaults
//! - Halts are values (`Interrupt`) propagated with `?`, resolved only by `run`
//! - Metadata keys are typed so producers and consumers agree on value types

pub mod context;
pub mod decision;
pub mod defaults;
pub mod dispatch;
pub mod error;
pub mod metadata;
pub mod resource;
pub mod trace;

pub use context::{Body, Context, Request, Response};
pub use decision::{run, Finished, Run, Step};
pub use error::{FlowError, FlowResult, Interrupt, Outcome};
pub use metadata::{Key, Metadata};
pub use resource::{Conversion, Handler, HandlerFn, Reply, Resource};
pub use trace::{Call, Entry, RunReport, Snapshot, Trace};
