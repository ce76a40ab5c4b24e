//! Webmachine-style HTTP decision machine library

pub mod config;
pub mod flow;
pub mod http;
pub mod machine;
pub mod negotiate;
pub mod observability;
pub mod status;

pub use config::schema::MachineConfig;
pub use http::HttpServer;
pub use machine::{Context, FlowError, Handler, Reply, Request, Resource};
