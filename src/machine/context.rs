//! The request context threaded through one run.
//!
//! # Invariants
//! - `status` is set if and only if the context is finalized
//! - A context is finalized at most once; later attempts are ignored
//! - Finalizing always leaves a body in place (empty if none was set)

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use std::fmt;
use uuid::Uuid;

use crate::machine::metadata::Metadata;
use crate::machine::trace::Trace;

/// The inbound request as seen by decision steps.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Builder-style header insertion; invalid names or values are skipped.
    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Header value as text, if present and visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Length of the request target as it appeared on the wire.
    pub fn uri_len(&self) -> usize {
        self.path.len() + self.query.as_ref().map_or(0, |q| q.len() + 1)
    }
}

/// A lazily produced sequence of body chunks.
pub type ChunkIter = Box<dyn Iterator<Item = Bytes> + Send>;

/// Response payload: either complete bytes or a chunk stream.
pub enum Body {
    Full(Bytes),
    Stream(ChunkIter),
}

impl Body {
    pub fn empty() -> Self {
        Body::Full(Bytes::new())
    }

    pub fn stream<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        Body::Stream(Box::new(chunks.into_iter()))
    }

    /// True for a complete, zero-length body. Streams are never empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Full(bytes) if bytes.is_empty())
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
            Body::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<&'static str> for Body {
    fn from(value: &'static str) -> Self {
        Body::Full(Bytes::from_static(value.as_bytes()))
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Full(Bytes::from(value))
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Full(Bytes::from(value))
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Body::Full(value)
    }
}

/// Outgoing response under construction.
#[derive(Debug, Default)]
pub struct Response {
    pub headers: HeaderMap,
    pub body: Option<Body>,
}

impl Response {
    /// Set a header, ignoring values that are not valid header text.
    pub fn set_header(&mut self, name: &'static str, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(_) => tracing::warn!(header = name, "Dropping invalid response header value"),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Mutable record for one request's traversal.
#[derive(Debug)]
pub struct Context {
    id: Uuid,
    pub request: Request,
    pub response: Response,
    pub metadata: Metadata,
    status: Option<StatusCode>,
    trace: Trace,
}

impl Context {
    pub fn new(request: Request) -> Self {
        Self::with_id(Uuid::new_v4(), request)
    }

    pub fn with_id(id: Uuid, request: Request) -> Self {
        Self {
            id,
            request,
            response: Response::default(),
            metadata: Metadata::new(),
            status: None,
            trace: Trace::default(),
        }
    }

    /// Run identifier, used to key stored traces.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn is_finalized(&self) -> bool {
        self.status.is_some()
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub(crate) fn trace_mut(&mut self) -> &mut Trace {
        &mut self.trace
    }

    /// Fix the final status. Returns `false`, leaving the first result in
    /// place, if the context was already finalized.
    pub fn finalize(&mut self, status: StatusCode) -> bool {
        if let Some(existing) = self.status {
            tracing::warn!(
                run_id = %self.id,
                existing = existing.as_u16(),
                rejected = status.as_u16(),
                "Ignoring second finalize"
            );
            return false;
        }

        if self.response.body.is_none() {
            self.response.body = Some(Body::empty());
        }
        self.status = Some(status);
        tracing::debug!(run_id = %self.id, status = status.as_u16(), "Response finalized");
        true
    }

    /// Start over for the same inbound request with a rewritten target,
    /// as error forwarding does before a second run.
    ///
    /// Headers, body and metadata carry over; response state and trace do not.
    pub fn forward(self, method: Method, path: impl Into<String>) -> Self {
        let mut request = self.request;
        request.method = method;
        request.path = path.into();
        Self {
            id: self.id,
            request,
            response: Response::default(),
            metadata: self.metadata,
            status: None,
            trace: Trace::default(),
        }
    }

    /// Split a finalized context into status, response and trace.
    pub fn into_parts(self) -> (Option<StatusCode>, Response, Trace) {
        (self.status, self.response, self.trace)
    }
}
