//! Content negotiation column (c3 .. f7).

use axum::http::StatusCode;
use std::fmt::Debug;

use super::{conditional, request_header, CHARSET_CONVERSION, ENCODING_CONVERSION, VARY};
use crate::machine::metadata::{CHARSET, ENCODING, MEDIA_TYPE};
use crate::machine::{Conversion, Handler, Outcome, Run};
use crate::negotiate::{choose_charset, choose_encoding, choose_media_type, MediaType, DEFAULT_ENCODING};

// Header assumed when the client sends no Accept-Encoding.
const IMPLIED_ACCEPT_ENCODING: &str = "identity;q=1.0,*;q=0.5";

pub(super) fn c3<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("c3", |run| {
        let provided = run
            .call(Handler::ContentTypesProvided)?
            .into_media_types(Handler::ContentTypesProvided)?;
        if provided.len() > 1 {
            add_vary(run, "accept");
        }

        if request_header(run, "accept").is_some() {
            return c4(run, provided);
        }

        match provided.into_iter().next() {
            Some(media_type) => {
                run.context_mut().metadata.insert(&MEDIA_TYPE, media_type);
                e5(run)
            }
            None => run.finalize(StatusCode::NOT_ACCEPTABLE),
        }
    })
}

fn c4<S: Debug>(run: &mut Run<S>, provided: Vec<MediaType>) -> Outcome {
    run.decide("c4", |run| {
        let accept = request_header(run, "accept").unwrap_or_default();
        match choose_media_type(&provided, &accept) {
            Some(media_type) => {
                run.context_mut().metadata.insert(&MEDIA_TYPE, media_type);
                e5(run)
            }
            None => run.finalize(StatusCode::NOT_ACCEPTABLE),
        }
    })
}

fn e5<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("e5", |run| {
        let Some(charsets) = run
            .call(Handler::CharsetsProvided)?
            .into_optional_conversions(Handler::CharsetsProvided)?
        else {
            // Resource does not negotiate charsets.
            return f6(run);
        };
        if charsets.len() > 1 {
            add_vary(run, "accept-charset");
        }

        match request_header(run, "accept-charset") {
            Some(header) => e6(run, charsets, header),
            None => settle_charset(run, charsets, "*"),
        }
    })
}

fn e6<S: Debug>(run: &mut Run<S>, charsets: Vec<Conversion>, header: String) -> Outcome {
    run.decide("e6", |run| settle_charset(run, charsets, &header))
}

fn settle_charset<S: Debug>(
    run: &mut Run<S>,
    charsets: Vec<Conversion>,
    header: &str,
) -> Outcome {
    let names: Vec<&str> = charsets.iter().map(Conversion::name).collect();
    let chosen = choose_charset(&names, header).and_then(|name| pick(charsets, &name));
    match chosen {
        Some(conversion) => {
            let metadata = &mut run.context_mut().metadata;
            metadata.insert(&CHARSET, conversion.name().to_string());
            metadata.insert(&CHARSET_CONVERSION, conversion);
            f6(run)
        }
        None => run.finalize(StatusCode::NOT_ACCEPTABLE),
    }
}

fn f6<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("f6", |run| {
        set_content_type(run);

        let encodings = run
            .call(Handler::EncodingsProvided)?
            .into_conversions(Handler::EncodingsProvided)?;
        if encodings.len() > 1 {
            add_vary(run, "accept-encoding");
        }

        let header = request_header(run, "accept-encoding")
            .unwrap_or_else(|| IMPLIED_ACCEPT_ENCODING.to_string());
        f7(run, encodings, header)
    })
}

fn f7<S: Debug>(run: &mut Run<S>, encodings: Vec<Conversion>, header: String) -> Outcome {
    run.decide("f7", |run| {
        let names: Vec<&str> = encodings.iter().map(Conversion::name).collect();
        let chosen = choose_encoding(&names, &header).and_then(|name| pick(encodings, &name));
        match chosen {
            Some(conversion) => {
                let encoding = conversion.name().to_string();
                if !encoding.eq_ignore_ascii_case(DEFAULT_ENCODING) {
                    run.context_mut()
                        .response
                        .set_header("content-encoding", &encoding);
                }
                let metadata = &mut run.context_mut().metadata;
                metadata.insert(&ENCODING, encoding);
                metadata.insert(&ENCODING_CONVERSION, conversion);
                conditional::g7(run)
            }
            None => run.finalize(StatusCode::NOT_ACCEPTABLE),
        }
    })
}

fn pick(conversions: Vec<Conversion>, name: &str) -> Option<Conversion> {
    conversions
        .into_iter()
        .find(|conversion| conversion.name().eq_ignore_ascii_case(name))
}

fn set_content_type<S: Debug>(run: &mut Run<S>) {
    let ctx = run.context_mut();
    let Some(media_type) = ctx.metadata.get(&MEDIA_TYPE) else {
        return;
    };
    let mut value = media_type.to_string();
    if let Some(charset) = ctx.metadata.get(&CHARSET) {
        value.push_str("; charset=");
        value.push_str(charset);
    }
    ctx.response.set_header("content-type", &value);
}

fn add_vary<S: Debug>(run: &mut Run<S>, header: &'static str) {
    let metadata = &mut run.context_mut().metadata;
    let mut vary = metadata.remove(&VARY).unwrap_or_default();
    vary.push(header);
    metadata.insert(&VARY, vary);
}
