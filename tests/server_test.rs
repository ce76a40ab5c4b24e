//! HTTP surface: routing, adapter rendering and the trace endpoint.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use decision_machine::config::MachineConfig;
use decision_machine::machine::{Handler, Reply, Resource};
use decision_machine::negotiate::normalize;
use decision_machine::HttpServer;

fn router(config: MachineConfig) -> Router {
    let greeting: Resource<()> = Resource::new("greeting")
        .handle(Handler::ContentTypesProvided, |_, _| {
            Reply::MediaTypes(vec![normalize("text/plain"), normalize("text/html")])
        })
        .handle(Handler::AllowedMethods, |_, _| Reply::list(["GET", "HEAD", "POST"]))
        .handle(Handler::ProvideContent, |_, _| Reply::Text("hello".into()));

    HttpServer::new(config).mount("/", greeting).into_router()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_get_negotiated_resource() {
    let response = router(MachineConfig::default())
        .oneshot(
            Request::builder()
                .uri("/")
                .header("accept", "text/html")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/html");
    assert_eq!(response.headers()["vary"], "accept");
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_string(response).await, "hello");
}

#[tokio::test]
async fn test_not_acceptable_renders_error_page() {
    let response = router(MachineConfig::default())
        .oneshot(
            Request::builder()
                .uri("/")
                .header("accept", "image/png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(response.headers()["content-type"], "text/html");
    assert!(body_string(response).await.contains("Not Acceptable"));
}

#[tokio::test]
async fn test_head_has_headers_but_no_body() {
    let response = router(MachineConfig::default())
        .oneshot(
            Request::builder()
                .method("HEAD")
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/plain");
    assert_eq!(body_string(response).await, "");
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let mut config = MachineConfig::default();
    config.limits.max_body_bytes = 4;

    let response = router(config)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .body(Body::from("far more than four bytes"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_uri_too_long() {
    let mut config = MachineConfig::default();
    config.limits.max_uri_length = 8;

    let response = router(config)
        .oneshot(
            Request::builder()
                .uri("/?query=well-past-the-limit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::URI_TOO_LONG);
}

#[tokio::test]
async fn test_trace_served_by_run_id() {
    let app = router(MachineConfig::default());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/")
                .header("x-request-id", "client-chosen")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "client-chosen");
    let run_id = response.headers()["x-run-id"].to_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/_trace/{run_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(report["run_id"], run_id.as_str());
    assert_eq!(report["request_id"], "client-chosen");
    assert_eq!(report["status"], 200);
    assert_eq!(report["status_text"], "OK");
    assert_eq!(report["trace"]["entries"][0]["decision"], "b13");
}

#[tokio::test]
async fn test_unknown_trace_is_not_found() {
    let response = router(MachineConfig::default())
        .oneshot(
            Request::builder()
                .uri(format!("/_trace/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_trace_route_absent_when_disabled() {
    let mut config = MachineConfig::default();
    config.trace.enabled = false;
    let server = HttpServer::new(config);
    assert!(server.trace_store().is_none());
}
