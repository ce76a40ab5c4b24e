//! Method handling and response body column (m16 .. o20).

use axum::http::{Method, StatusCode};
use std::fmt::Debug;

use super::conditional::{current_etag, current_last_modified};
use super::{ask_bool, CHARSET_CONVERSION, ENCODING_CONVERSION};
use crate::machine::{Body, Context, Handler, Outcome, Run};
use crate::negotiate::format_http_date;

pub(super) fn m16<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("m16", |run| {
        if run.context().request.method == Method::DELETE {
            m20(run)
        } else {
            n16(run)
        }
    })
}

fn m20<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("m20", |run| {
        if ask_bool(run, Handler::DeleteResource)? {
            m20b(run)
        } else {
            run.finalize(StatusCode::INTERNAL_SERVER_ERROR)
        }
    })
}

fn m20b<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("m20b", |run| {
        if ask_bool(run, Handler::DeleteCompleted)? {
            o20(run)
        } else {
            run.finalize(StatusCode::ACCEPTED)
        }
    })
}

fn n16<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("n16", |run| {
        if run.context().request.method == Method::POST {
            n11(run)
        } else {
            o18(run)
        }
    })
}

fn n11<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("n11", |run| {
        if ask_bool(run, Handler::ProcessPost)? {
            o20(run)
        } else {
            run.finalize(StatusCode::INTERNAL_SERVER_ERROR)
        }
    })
}

fn o20<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("o20", |run| {
        let has_entity = run
            .context()
            .response
            .body
            .as_ref()
            .is_some_and(|body| !body.is_empty());
        if has_entity {
            run.finalize(StatusCode::OK)
        } else {
            run.finalize(StatusCode::NO_CONTENT)
        }
    })
}

fn o18<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("o18", |run| {
        let method = run.context().request.method.clone();
        if method != Method::GET && method != Method::HEAD {
            return o20(run);
        }

        if let Some(etag) = current_etag(run)? {
            run.context_mut().response.set_header("etag", &etag);
        }
        if let Some(modified) = current_last_modified(run)? {
            run.context_mut()
                .response
                .set_header("last-modified", &format_http_date(&modified));
        }
        let expires = run
            .call(Handler::Expires)?
            .into_optional_date(Handler::Expires)?;
        if let Some(expires) = expires {
            run.context_mut()
                .response
                .set_header("expires", &format_http_date(&expires));
        }

        let body = run
            .call(Handler::ProvideContent)?
            .into_body(Handler::ProvideContent)?;
        if method == Method::GET {
            let body = encode_body(run.context(), body);
            run.context_mut().response.body = Some(body);
        }
        run.finalize(StatusCode::OK)
    })
}

// Charset first, then content coding.
fn encode_body(ctx: &Context, body: Body) -> Body {
    let body = match ctx.metadata.get(&CHARSET_CONVERSION) {
        Some(charset) => charset.apply_body(body),
        None => body,
    };
    match ctx.metadata.get(&ENCODING_CONVERSION) {
        Some(encoding) => encoding.apply_body(body),
        None => body,
    }
}
