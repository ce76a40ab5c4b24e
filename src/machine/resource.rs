//! Pluggable resource behavior.
//!
//! # Responsibilities
//! - Name every behavior a decision step can ask a resource about
//! - Hold a per-resource table from handler name to function value
//! - Define the reply shapes handlers answer with
//!
//! # Design Decisions
//! - A lookup table of closures, not a trait with one method per handler:
//!   resources override only what they need, the rest falls to the defaults
//! - `Custom` names let graphs introduce behaviors the defaults do not know;
//!   calling one that the resource does not implement fails the run

use axum::body::Bytes;
use axum::http::StatusCode;
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::machine::context::{Body, Context};
use crate::machine::error::{FlowError, FlowResult};
use crate::negotiate::MediaType;

/// Named resource behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    ServiceAvailable,
    KnownMethods,
    UriTooLong,
    AllowedMethods,
    MalformedRequest,
    IsAuthorized,
    Forbidden,
    ValidContentHeaders,
    KnownContentType,
    ValidEntityLength,
    ContentTypesProvided,
    CharsetsProvided,
    EncodingsProvided,
    ResourceExists,
    GenerateEtag,
    LastModified,
    Expires,
    DeleteResource,
    DeleteCompleted,
    ProcessPost,
    ProvideContent,
    Custom(&'static str),
}

impl Handler {
    pub fn as_str(&self) -> &'static str {
        match self {
            Handler::ServiceAvailable => "service_available",
            Handler::KnownMethods => "known_methods",
            Handler::UriTooLong => "uri_too_long",
            Handler::AllowedMethods => "allowed_methods",
            Handler::MalformedRequest => "malformed_request",
            Handler::IsAuthorized => "is_authorized",
            Handler::Forbidden => "forbidden",
            Handler::ValidContentHeaders => "valid_content_headers",
            Handler::KnownContentType => "known_content_type",
            Handler::ValidEntityLength => "valid_entity_length",
            Handler::ContentTypesProvided => "content_types_provided",
            Handler::CharsetsProvided => "charsets_provided",
            Handler::EncodingsProvided => "encodings_provided",
            Handler::ResourceExists => "resource_exists",
            Handler::GenerateEtag => "generate_etag",
            Handler::LastModified => "last_modified",
            Handler::Expires => "expires",
            Handler::DeleteResource => "delete_resource",
            Handler::DeleteCompleted => "delete_completed",
            Handler::ProcessPost => "process_post",
            Handler::ProvideContent => "provide_content",
            Handler::Custom(name) => *name,
        }
    }
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named body transformation: a content coding or a charset converter.
///
/// Streams are converted chunk by chunk.
#[derive(Clone)]
pub struct Conversion {
    name: String,
    apply: Arc<dyn Fn(Bytes) -> Bytes + Send + Sync>,
}

impl Conversion {
    pub fn new<F>(name: impl Into<String>, apply: F) -> Self
    where
        F: Fn(Bytes) -> Bytes + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            apply: Arc::new(apply),
        }
    }

    /// A conversion that leaves the body unchanged.
    pub fn identity(name: impl Into<String>) -> Self {
        Self::new(name, |bytes| bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, bytes: Bytes) -> Bytes {
        (self.apply)(bytes)
    }

    pub fn apply_body(&self, body: Body) -> Body {
        match body {
            Body::Full(bytes) => Body::Full(self.apply(bytes)),
            Body::Stream(chunks) => {
                let apply = Arc::clone(&self.apply);
                Body::Stream(Box::new(chunks.map(move |chunk| apply(chunk))))
            }
        }
    }
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Conversion").field(&self.name).finish()
    }
}

/// What a handler answers.
#[derive(Debug)]
pub enum Reply {
    /// Finalize with this status and end the whole run.
    Halt(StatusCode),
    Bool(bool),
    Text(String),
    List(Vec<String>),
    MediaTypes(Vec<MediaType>),
    Date(DateTime<FixedOffset>),
    /// Available charsets or content codings with their converters.
    Conversions(Vec<Conversion>),
    Body(Body),
    /// Nothing to report (no etag, no charset negotiation, ...).
    None,
}

impl Reply {
    /// Build a `List` from anything string-like.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Reply::List(items.into_iter().map(Into::into).collect())
    }

    pub fn into_bool(self, handler: Handler) -> FlowResult<bool> {
        match self {
            Reply::Bool(value) => Ok(value),
            other => Err(other.unexpected(handler, "bool")),
        }
    }

    pub fn into_list(self, handler: Handler) -> FlowResult<Vec<String>> {
        match self {
            Reply::List(items) => Ok(items),
            other => Err(other.unexpected(handler, "list")),
        }
    }

    /// `None` stays `None`; a list becomes `Some(list)`.
    pub fn into_optional_list(self, handler: Handler) -> FlowResult<Option<Vec<String>>> {
        match self {
            Reply::List(items) => Ok(Some(items)),
            Reply::None => Ok(None),
            other => Err(other.unexpected(handler, "list or none")),
        }
    }

    pub fn into_media_types(self, handler: Handler) -> FlowResult<Vec<MediaType>> {
        match self {
            Reply::MediaTypes(types) => Ok(types),
            other => Err(other.unexpected(handler, "media types")),
        }
    }

    pub fn into_conversions(self, handler: Handler) -> FlowResult<Vec<Conversion>> {
        match self {
            Reply::Conversions(conversions) => Ok(conversions),
            other => Err(other.unexpected(handler, "conversions")),
        }
    }

    /// `None` stays `None`; conversions become `Some(conversions)`.
    pub fn into_optional_conversions(
        self,
        handler: Handler,
    ) -> FlowResult<Option<Vec<Conversion>>> {
        match self {
            Reply::Conversions(conversions) => Ok(Some(conversions)),
            Reply::None => Ok(None),
            other => Err(other.unexpected(handler, "conversions or none")),
        }
    }

    pub fn into_optional_text(self, handler: Handler) -> FlowResult<Option<String>> {
        match self {
            Reply::Text(text) => Ok(Some(text)),
            Reply::None => Ok(None),
            other => Err(other.unexpected(handler, "text or none")),
        }
    }

    pub fn into_optional_date(
        self,
        handler: Handler,
    ) -> FlowResult<Option<DateTime<FixedOffset>>> {
        match self {
            Reply::Date(date) => Ok(Some(date)),
            Reply::None => Ok(None),
            other => Err(other.unexpected(handler, "date or none")),
        }
    }

    pub fn into_body(self, handler: Handler) -> FlowResult<Body> {
        match self {
            Reply::Body(body) => Ok(body),
            Reply::Text(text) => Ok(Body::from(text)),
            Reply::None => Ok(Body::empty()),
            other => Err(other.unexpected(handler, "body")),
        }
    }

    pub(crate) fn unexpected(&self, handler: Handler, expected: &'static str) -> FlowError {
        FlowError::UnexpectedReply {
            handler: handler.to_string(),
            expected,
            reply: format!("{:?}", self),
        }
    }
}

/// A handler implementation: reads and may update the context and state.
pub type HandlerFn<S> = Arc<dyn Fn(&mut Context, &mut S) -> Reply + Send + Sync>;

/// A named set of handler overrides for one kind of resource.
pub struct Resource<S> {
    name: String,
    handlers: HashMap<Handler, HandlerFn<S>>,
}

impl<S> Resource<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: HashMap::new(),
        }
    }

    /// Register (or replace) the implementation of `handler`.
    pub fn handle<F>(mut self, handler: Handler, f: F) -> Self
    where
        F: Fn(&mut Context, &mut S) -> Reply + Send + Sync + 'static,
    {
        self.handlers.insert(handler, Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn implements(&self, handler: Handler) -> bool {
        self.handlers.contains_key(&handler)
    }

    pub(crate) fn lookup(&self, handler: Handler) -> Option<&HandlerFn<S>> {
        self.handlers.get(&handler)
    }
}

impl<S> fmt::Debug for Resource<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<_> = self.handlers.keys().map(Handler::as_str).collect();
        handlers.sort_unstable();
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("handlers", &handlers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_names() {
        assert_eq!(Handler::ResourceExists.as_str(), "resource_exists");
        assert_eq!(Handler::Custom("audit").to_string(), "audit");
    }

    #[test]
    fn test_reply_shapes() {
        assert!(Reply::Bool(true).into_bool(Handler::ResourceExists).unwrap());
        assert_eq!(
            Reply::list(["GET", "HEAD"]).into_list(Handler::AllowedMethods).unwrap(),
            vec!["GET", "HEAD"]
        );
        assert_eq!(Reply::None.into_optional_text(Handler::GenerateEtag).unwrap(), None);
        assert!(Reply::Text("hi".into()).into_body(Handler::ProvideContent).is_ok());
    }

    #[test]
    fn test_reply_shape_mismatch() {
        let err = Reply::Text("yes".into())
            .into_bool(Handler::ResourceExists)
            .unwrap_err();
        match err {
            FlowError::UnexpectedReply { handler, expected, reply } => {
                assert_eq!(handler, "resource_exists");
                assert_eq!(expected, "bool");
                assert!(reply.contains("yes"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_conversion_applies_to_streams_chunkwise() {
        let upper = Conversion::new("upper", |bytes: Bytes| {
            Bytes::from(bytes.to_ascii_uppercase())
        });
        assert_eq!(format!("{:?}", upper), "Conversion(\"upper\")");

        let body = upper.apply_body(Body::stream(vec![Bytes::from("ab"), Bytes::from("c")]));
        let Body::Stream(chunks) = body else {
            panic!("stream expected");
        };
        assert_eq!(chunks.collect::<Vec<_>>(), vec![Bytes::from("AB"), Bytes::from("C")]);

        let Body::Full(bytes) = Conversion::identity("identity").apply_body(Body::from("x")) else {
            panic!("full body expected");
        };
        assert_eq!(bytes, Bytes::from("x"));
    }

    #[test]
    fn test_resource_registry() {
        let resource: Resource<()> = Resource::new("items")
            .handle(Handler::ResourceExists, |_, _| Reply::Bool(false));
        assert_eq!(resource.name(), "items");
        assert!(resource.implements(Handler::ResourceExists));
        assert!(!resource.implements(Handler::Forbidden));
        assert!(format!("{:?}", resource).contains("resource_exists"));
    }
}
