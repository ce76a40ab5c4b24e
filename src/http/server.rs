//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Mount resources on paths, each driven through a decision graph
//! - Wire up middleware (request ID, tracing, timeout)
//! - Expose captured decision traces at `/_trace/{run_id}`, where the run id
//!   is the server-generated `x-run-id` response header
//! - Bind server to listener with graceful shutdown

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Path, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::config::MachineConfig;
use crate::flow;
use crate::http::adapter::{self, AdapterSettings};
use crate::machine::{Resource, Step};
use crate::observability::TraceStore;

/// HTTP front end for a set of resources.
pub struct HttpServer {
    routes: Router,
    config: MachineConfig,
    settings: AdapterSettings,
}

impl HttpServer {
    /// Create a server with no resources mounted.
    pub fn new(config: MachineConfig) -> Self {
        let store = config
            .trace
            .enabled
            .then(|| TraceStore::new(config.trace.max_runs));

        let mut routes = Router::new();
        if let Some(store) = &store {
            routes = routes.merge(diagnostics(store.clone()));
        }

        let settings = AdapterSettings {
            max_body_bytes: config.limits.max_body_bytes,
            max_uri_length: config.limits.max_uri_length,
            store,
        };

        Self {
            routes,
            config,
            settings,
        }
    }

    /// Serve `resource` at `path` through the reference decision graph.
    pub fn mount<S>(self, path: &str, resource: Resource<S>) -> Self
    where
        S: Default + Debug + Send + 'static,
    {
        self.mount_with(path, resource, flow::start::<S>)
    }

    /// Serve `resource` at `path` starting from a custom entry step.
    pub fn mount_with<S>(mut self, path: &str, resource: Resource<S>, entry: Step<S>) -> Self
    where
        S: Default + Debug + Send + 'static,
    {
        tracing::info!(path = %path, resource = resource.name(), "Mounting resource");
        let resource = Arc::new(resource);
        let settings = self.settings.clone();
        let body_limit = DefaultBodyLimit::max(self.settings.max_body_bytes);
        self.routes = self.routes.route(
            path,
            any(move |request: Request<Body>| {
                adapter::handle(resource.clone(), entry, settings.clone(), request)
            })
            .layer(body_limit),
        );
        self
    }

    /// Trace store backing the diagnostics route, if capture is enabled.
    pub fn trace_store(&self) -> Option<&TraceStore> {
        self.settings.store.as_ref()
    }

    /// Finish the router with all middleware layers.
    #[allow(deprecated)]
    pub fn into_router(self) -> Router {
        self.routes
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.limits.request_timeout_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }
}

fn diagnostics(store: TraceStore) -> Router {
    Router::new()
        .route("/_trace/{run_id}", get(trace_report))
        .with_state(store)
}

async fn trace_report(State(store): State<TraceStore>, Path(run_id): Path<Uuid>) -> Response {
    match store.get(&run_id) {
        Some(report) => Json(report.as_ref()).into_response(),
        None => (StatusCode::NOT_FOUND, "No trace recorded for run").into_response(),
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
