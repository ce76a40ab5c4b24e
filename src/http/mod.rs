//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout layers)
//!     → adapter.rs (axum request → Context, bounded body read)
//!     → machine::run on a blocking worker
//!     → adapter.rs (finalized Context → axum response, error pages)
//!     → trace store (GET /_trace/{run_id})
//! ```

pub mod adapter;
pub mod server;

pub use adapter::AdapterSettings;
pub use server::HttpServer;
