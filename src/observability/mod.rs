//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Decision runs produce:
//!     → tracing events/spans (run_id, decision, handler, status)
//!     → metrics.rs (run, halt and error counters, run latency)
//!     → trace_store.rs (captured decision traces keyed by run id)
//!
//! Consumers:
//!     → logging.rs subscriber (pretty or JSON to stdout)
//!     → Prometheus scrape endpoint
//!     → GET /_trace/{run_id} diagnostics route
//! ```
//!
//! # Design Decisions
//! - Structured fields, never formatted strings, for anything queryable
//! - The trace store is bounded; the oldest runs are evicted first
//! - Metric updates are cheap enough to stay on in production

pub mod logging;
pub mod metrics;
pub mod trace_store;

pub use trace_store::TraceStore;
