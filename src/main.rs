//! Decision machine demo server.
//!
//! ```text
//!     Client Request
//!     ─────────────▶ axum router ─▶ http adapter ─▶ decision graph (flow)
//!                                                       │
//!                                          handler calls│ resource overrides
//!                                                       ▼ or defaults
//!     ◀───────────── axum response ◀─ finalized context + trace
//! ```
//!
//! Mounts two resources:
//! - `/` negotiates between HTML, plain text and JSON, with charsets and an etag
//! - `/stream` answers with a chunked body
//!
//! Traces of recent runs are served at `/_trace/{run_id}`, where the run id
//! is the `x-run-id` response header.

use axum::body::Bytes;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use decision_machine::config::{load_config, MachineConfig};
use decision_machine::machine::metadata::{CHARSET, MEDIA_TYPE};
use decision_machine::machine::{Body, Context, Conversion, Handler, Reply, Resource};
use decision_machine::negotiate::{normalize, MediaType};
use decision_machine::observability::{logging, metrics};
use decision_machine::HttpServer;

#[derive(Parser)]
#[command(name = "decision-machine")]
#[command(about = "HTTP decision machine demo server", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,
}

/// Per-run state for the greeting resource.
#[derive(Debug, Default)]
struct Greeting {
    rendered_as: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => MachineConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("decision-machine v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.limits.request_timeout_secs,
        trace_enabled = config.trace.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    HttpServer::new(config)
        .mount("/", greeting_resource())
        .mount("/stream", stream_resource())
        .run(listener)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn greeting_resource() -> Resource<Greeting> {
    Resource::new("greeting")
        .handle(Handler::ContentTypesProvided, |_, _| {
            Reply::MediaTypes(vec![
                normalize("text/html"),
                normalize("text/plain"),
                normalize("application/json"),
            ])
        })
        .handle(Handler::CharsetsProvided, |_, _| {
            Reply::Conversions(vec![
                Conversion::identity("utf-8"),
                Conversion::new("iso-8859-1", to_latin1),
            ])
        })
        .handle(Handler::GenerateEtag, |_, _| Reply::Text("greeting-v1".into()))
        .handle(Handler::LastModified, |_, _| Reply::Date(published()))
        .handle(Handler::ProvideContent, render_greeting)
}

fn render_greeting(ctx: &mut Context, state: &mut Greeting) -> Reply {
    let media_type = ctx
        .metadata
        .get(&MEDIA_TYPE)
        .cloned()
        .unwrap_or_else(|| MediaType::new("text", "html"));
    let charset = ctx.metadata.get(&CHARSET).cloned().unwrap_or_default();
    state.rendered_as = Some(media_type.to_string());

    let body = match (media_type.main_type.as_str(), media_type.sub_type.as_str()) {
        ("application", "json") => {
            serde_json::json!({ "greeting": "héllo", "charset": charset }).to_string()
        }
        ("text", "plain") => "héllo\n".to_string(),
        _ => "<html><body><h1>héllo</h1></body></html>".to_string(),
    };
    Reply::Body(Body::from(body))
}

// Characters outside Latin-1 become '?'.
fn to_latin1(utf8: Bytes) -> Bytes {
    String::from_utf8_lossy(&utf8)
        .chars()
        .map(|c| u8::try_from(c).unwrap_or(b'?'))
        .collect::<Vec<u8>>()
        .into()
}

fn stream_resource() -> Resource<()> {
    Resource::new("stream")
        .handle(Handler::ContentTypesProvided, |_, _| {
            Reply::MediaTypes(vec![normalize("text/plain")])
        })
        .handle(Handler::ProvideContent, |_, _| {
            let chunks = (1..=5).map(|n| Bytes::from(format!("chunk {n}\n")));
            Reply::Body(Body::stream(chunks))
        })
}

fn published() -> DateTime<FixedOffset> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
        .fixed_offset()
}
