//! Translation between axum and the decision machine.
//!
//! # Responsibilities
//! - Read the inbound request (body bounded by the route's body limit)
//! - Run the decision graph on a blocking worker; handlers may block
//! - Render the finalized context as an axum response
//! - Store the run's trace when capture is enabled
//!
//! # Design Decisions
//! - Configuration failures surface as 500 and are logged, never leaked
//! - Error statuses without a body get a small HTML page from the reason phrase
//! - HEAD responses never carry a body
//! - A body over the limit answers 413; any other read failure answers 400

use axum::body::{Body as AxumBody, Bytes};
use axum::extract::FromRequest;
use axum::http::{header, HeaderValue, Method, Request as HttpRequest, StatusCode};
use axum::response::{IntoResponse, Response as HttpResponse};
use futures_util::stream;
use std::convert::Infallible;
use std::fmt::Debug;
use std::sync::Arc;
use uuid::Uuid;

use crate::machine::metadata::MAX_URI_LENGTH;
use crate::machine::{self, Body, Context, Request, Resource, RunReport, Step};
use crate::observability::TraceStore;
use crate::status::reason_phrase;

/// Per-mount settings shared by every request to a resource.
#[derive(Clone)]
pub struct AdapterSettings {
    pub max_body_bytes: usize,
    pub max_uri_length: usize,
    pub store: Option<TraceStore>,
}

/// Response header carrying the id a run's trace is stored under.
pub const X_RUN_ID: &str = "x-run-id";

/// Serve one request against `resource`, starting at `entry`.
///
/// The body limit comes from a `DefaultBodyLimit` layer on the route.
/// Run ids are always generated here; a client's `x-request-id` is only
/// recorded alongside the trace.
pub async fn handle<S>(
    resource: Arc<Resource<S>>,
    entry: Step<S>,
    settings: AdapterSettings,
    request: HttpRequest<AxumBody>,
) -> HttpResponse
where
    S: Default + Debug + Send + 'static,
{
    let run_id = Uuid::new_v4();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = request.headers().clone();

    let body = match Bytes::from_request(request, &()).await {
        Ok(bytes) => bytes,
        Err(rejection) => {
            tracing::warn!(run_id = %run_id, error = %rejection, "Request body rejected");
            return with_run_id(error_response(rejection.status()), run_id);
        }
    };

    let mut ctx = Context::with_id(
        run_id,
        Request {
            method: method.clone(),
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            headers,
            body,
        },
    );
    ctx.metadata.insert(&MAX_URI_LENGTH, settings.max_uri_length);

    let outcome = tokio::task::spawn_blocking(move || {
        machine::run(resource, ctx, S::default(), entry)
    })
    .await;

    let response = match outcome {
        Ok(Ok(finished)) => {
            let (status, response, trace) = finished.context.into_parts();
            let status = status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if let Some(store) = &settings.store {
                let report = RunReport::new(run_id, Some(status.as_u16()), trace)
                    .with_request_id(request_id);
                store.insert(report);
            }
            into_response(status, response, &method)
        }
        Ok(Err(e)) => {
            tracing::error!(run_id = %run_id, error = %e, "Decision run failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(e) => {
            tracing::error!(run_id = %run_id, error = %e, "Decision run panicked");
            error_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };
    with_run_id(response, run_id)
}

fn with_run_id(mut response: HttpResponse, run_id: Uuid) -> HttpResponse {
    if let Ok(value) = HeaderValue::from_str(&run_id.to_string()) {
        response.headers_mut().insert(X_RUN_ID, value);
    }
    response
}

/// Render a finalized response.
pub fn into_response(
    status: StatusCode,
    response: machine::Response,
    method: &Method,
) -> HttpResponse {
    let machine::Response { mut headers, body } = response;
    let body = body.unwrap_or_else(Body::empty);

    let body = if *method == Method::HEAD {
        AxumBody::empty()
    } else if status.as_u16() >= 400 && body.is_empty() {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html"),
        );
        AxumBody::from(error_page(status))
    } else {
        match body {
            Body::Full(bytes) => AxumBody::from(bytes),
            Body::Stream(chunks) => {
                AxumBody::from_stream(stream::iter(chunks.map(Ok::<_, Infallible>)))
            }
        }
    };

    let mut out = HttpResponse::new(body);
    *out.status_mut() = status;
    *out.headers_mut() = headers;
    out
}

fn error_response(status: StatusCode) -> HttpResponse {
    (
        status,
        [(header::CONTENT_TYPE, "text/html")],
        error_page(status),
    )
        .into_response()
}

fn error_page(status: StatusCode) -> String {
    let phrase = reason_phrase(status.as_u16()).unwrap_or("Error");
    format!(
        "<html><head><title>{code} {phrase}</title></head><body><h1>{phrase}</h1></body></html>",
        code = status.as_u16(),
        phrase = phrase
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Bytes};

    async fn body_text(response: HttpResponse) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_error_page_for_empty_error_body() {
        let response = machine::Response {
            body: Some(Body::empty()),
            ..Default::default()
        };
        let out = into_response(StatusCode::NOT_ACCEPTABLE, response, &Method::GET);
        assert_eq!(out.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(out.headers()["content-type"], "text/html");
        assert!(body_text(out).await.contains("406 Not Acceptable"));
    }

    #[tokio::test]
    async fn test_streamed_body_is_concatenated() {
        let response = machine::Response {
            body: Some(Body::stream(vec![Bytes::from("a"), Bytes::from("b")])),
            ..Default::default()
        };
        let out = into_response(StatusCode::OK, response, &Method::GET);
        assert_eq!(body_text(out).await, "ab");
    }

    fn settings(store: Option<TraceStore>) -> AdapterSettings {
        AdapterSettings {
            max_body_bytes: 1024,
            max_uri_length: 1024,
            store,
        }
    }

    async fn serve(store: Option<TraceStore>, request: HttpRequest<AxumBody>) -> HttpResponse {
        let resource = Arc::new(Resource::<()>::new("plain"));
        handle(resource, crate::flow::start::<()>, settings(store), request).await
    }

    #[tokio::test]
    async fn test_broken_body_is_bad_request() {
        let broken = stream::iter(vec![Err::<Bytes, _>(std::io::Error::other("connection reset"))]);
        let request = HttpRequest::builder()
            .method(Method::POST)
            .uri("/")
            .body(AxumBody::from_stream(broken))
            .unwrap();

        let out = serve(None, request).await;
        assert_eq!(out.status(), StatusCode::BAD_REQUEST);
        assert!(out.headers().contains_key(X_RUN_ID));
    }

    #[tokio::test]
    async fn test_client_request_id_is_not_the_run_id() {
        let store = TraceStore::new(8);
        let shared = Uuid::new_v4().to_string();

        let mut run_ids = Vec::new();
        for _ in 0..2 {
            let request = HttpRequest::builder()
                .uri("/")
                .header("x-request-id", shared.as_str())
                .body(AxumBody::empty())
                .unwrap();
            let out = serve(Some(store.clone()), request).await;
            let run_id = out.headers()[X_RUN_ID].to_str().unwrap().to_string();
            run_ids.push(Uuid::parse_str(&run_id).unwrap());
        }

        assert_ne!(run_ids[0], run_ids[1]);
        assert_ne!(run_ids[0].to_string(), shared);
        assert_eq!(store.len(), 2);
        for run_id in &run_ids {
            let report = store.get(run_id).unwrap();
            assert_eq!(report.request_id.as_deref(), Some(shared.as_str()));
        }
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let response = machine::Response {
            body: Some(Body::from("hidden")),
            ..Default::default()
        };
        let out = into_response(StatusCode::OK, response, &Method::HEAD);
        assert_eq!(body_text(out).await, "");
    }
}
