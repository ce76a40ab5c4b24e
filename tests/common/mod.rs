//! Shared helpers for decision machine integration tests.

#![allow(dead_code)]

use axum::http::{Method, StatusCode};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use std::fmt::Debug;
use std::sync::Arc;

use decision_machine::flow;
use decision_machine::machine::{self, Body, Context, Finished, Request, Resource};

/// Drive `request` through the reference graph against `resource`.
pub fn run_flow<S: Default + Debug>(resource: Resource<S>, request: Request) -> Finished<S> {
    machine::run(
        Arc::new(resource),
        Context::new(request),
        S::default(),
        flow::start::<S>,
    )
    .expect("run should finish")
}

pub fn get(path: &str) -> Request {
    Request::new(Method::GET, path)
}

pub fn status_of<S>(finished: &Finished<S>) -> StatusCode {
    finished.status()
}

pub fn response_header<'a, S>(finished: &'a Finished<S>, name: &str) -> Option<&'a str> {
    finished.context.response.header(name)
}

/// Collect a response body, draining streams.
pub fn body_text<S>(finished: Finished<S>) -> String {
    let (_, response, _) = finished.context.into_parts();
    let bytes: Vec<u8> = match response.body {
        Some(Body::Full(bytes)) => bytes.to_vec(),
        Some(Body::Stream(chunks)) => chunks.flat_map(|c| c.to_vec()).collect(),
        None => Vec::new(),
    };
    String::from_utf8(bytes).expect("utf8 body")
}

/// Fixed modification date used by test resources.
pub fn jan_first() -> DateTime<FixedOffset> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("valid date")
        .fixed_offset()
}
