//! Baseline answers for every built-in handler.
//!
//! Used whenever a resource does not override a handler. Shared by all runs
//! and never mutated.

use crate::machine::context::{Body, Context};
use crate::machine::metadata::MAX_URI_LENGTH;
use crate::machine::resource::{Conversion, Handler, Reply};
use crate::negotiate::{MediaType, DEFAULT_ENCODING};

/// Implementation identity recorded in traces for default answers.
pub const DEFAULTS: &str = "defaults";

const KNOWN_METHODS: [&str; 9] = [
    "GET", "HEAD", "POST", "PUT", "DELETE", "TRACE", "CONNECT", "OPTIONS", "PATCH",
];

const DEFAULT_BODY: &str = "<html><body>Hello, new world</body></html>";

/// The default reply for `handler`, or `None` if there is no default.
pub fn default_reply(handler: Handler, ctx: &Context) -> Option<Reply> {
    let reply = match handler {
        Handler::ServiceAvailable => Reply::Bool(true),
        Handler::KnownMethods => Reply::list(KNOWN_METHODS),
        Handler::UriTooLong => Reply::Bool(
            ctx.metadata
                .get(&MAX_URI_LENGTH)
                .is_some_and(|max| ctx.request.uri_len() > *max),
        ),
        Handler::AllowedMethods => Reply::list(["GET", "HEAD"]),
        Handler::MalformedRequest => Reply::Bool(false),
        Handler::IsAuthorized => Reply::Bool(true),
        Handler::Forbidden => Reply::Bool(false),
        Handler::ValidContentHeaders => Reply::Bool(true),
        Handler::KnownContentType => Reply::Bool(true),
        Handler::ValidEntityLength => Reply::Bool(true),
        Handler::ContentTypesProvided => Reply::MediaTypes(vec![MediaType::new("text", "html")]),
        Handler::CharsetsProvided => Reply::None,
        Handler::EncodingsProvided => {
            Reply::Conversions(vec![Conversion::identity(DEFAULT_ENCODING)])
        }
        Handler::ResourceExists => Reply::Bool(true),
        Handler::GenerateEtag => Reply::None,
        Handler::LastModified => Reply::None,
        Handler::Expires => Reply::None,
        Handler::DeleteResource => Reply::Bool(false),
        Handler::DeleteCompleted => Reply::Bool(true),
        Handler::ProcessPost => Reply::Bool(false),
        Handler::ProvideContent => Reply::Body(Body::from(DEFAULT_BODY)),
        Handler::Custom(_) => return None,
    };
    Some(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::context::Request;
    use axum::http::Method;

    const BUILT_IN: [Handler; 21] = [
        Handler::ServiceAvailable,
        Handler::KnownMethods,
        Handler::UriTooLong,
        Handler::AllowedMethods,
        Handler::MalformedRequest,
        Handler::IsAuthorized,
        Handler::Forbidden,
        Handler::ValidContentHeaders,
        Handler::KnownContentType,
        Handler::ValidEntityLength,
        Handler::ContentTypesProvided,
        Handler::CharsetsProvided,
        Handler::EncodingsProvided,
        Handler::ResourceExists,
        Handler::GenerateEtag,
        Handler::LastModified,
        Handler::Expires,
        Handler::DeleteResource,
        Handler::DeleteCompleted,
        Handler::ProcessPost,
        Handler::ProvideContent,
    ];

    #[test]
    fn test_every_built_in_handler_has_a_default() {
        let ctx = Context::new(Request::new(Method::GET, "/"));
        for handler in BUILT_IN {
            assert!(default_reply(handler, &ctx).is_some(), "no default for {}", handler);
        }
    }

    #[test]
    fn test_custom_has_no_default() {
        let ctx = Context::new(Request::new(Method::GET, "/"));
        assert!(default_reply(Handler::Custom("audit"), &ctx).is_none());
    }

    #[test]
    fn test_uri_too_long_uses_transport_limit() {
        let mut ctx = Context::new(Request::new(Method::GET, "/a/rather/long/path"));
        let too_long = |ctx: &Context| {
            default_reply(Handler::UriTooLong, ctx)
                .unwrap()
                .into_bool(Handler::UriTooLong)
                .unwrap()
        };
        assert!(!too_long(&ctx));

        ctx.metadata.insert(&MAX_URI_LENGTH, 5);
        assert!(too_long(&ctx));
    }

    #[test]
    fn test_resource_exists_by_default() {
        let ctx = Context::new(Request::new(Method::GET, "/"));
        let reply = default_reply(Handler::ResourceExists, &ctx).unwrap();
        assert!(reply.into_bool(Handler::ResourceExists).unwrap());
    }
}
