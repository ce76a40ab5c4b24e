//! Request validation column (b13 .. b3).

use axum::http::{Method, StatusCode};
use std::fmt::Debug;

use super::{ask_bool, ask_list, negotiation};
use crate::machine::{FlowError, Handler, Outcome, Reply, Run};

pub(super) fn b13<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("b13", |run| {
        if ask_bool(run, Handler::ServiceAvailable)? {
            b12(run)
        } else {
            run.finalize(StatusCode::SERVICE_UNAVAILABLE)
        }
    })
}

fn b12<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("b12", |run| {
        let known = ask_list(run, Handler::KnownMethods)?;
        if contains_method(&known, &run.context().request.method) {
            b11(run)
        } else {
            run.finalize(StatusCode::NOT_IMPLEMENTED)
        }
    })
}

fn b11<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("b11", |run| {
        if ask_bool(run, Handler::UriTooLong)? {
            run.finalize(StatusCode::URI_TOO_LONG)
        } else {
            b10(run)
        }
    })
}

fn b10<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("b10", |run| {
        let allowed = ask_list(run, Handler::AllowedMethods)?;
        if contains_method(&allowed, &run.context().request.method) {
            b9(run)
        } else {
            run.context_mut()
                .response
                .set_header("allow", &allowed.join(", "));
            run.finalize(StatusCode::METHOD_NOT_ALLOWED)
        }
    })
}

fn b9<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("b9", |run| {
        if ask_bool(run, Handler::MalformedRequest)? {
            run.finalize(StatusCode::BAD_REQUEST)
        } else {
            b8(run)
        }
    })
}

fn b8<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("b8", |run| match run.call(Handler::IsAuthorized)? {
        Reply::Bool(true) => b7(run),
        Reply::Bool(false) => run.finalize(StatusCode::UNAUTHORIZED),
        // A challenge string means "not authorized, here is how".
        Reply::Text(challenge) => {
            run.context_mut()
                .response
                .set_header("www-authenticate", &challenge);
            run.finalize(StatusCode::UNAUTHORIZED)
        }
        other => {
            let err: FlowError = other.unexpected(Handler::IsAuthorized, "bool or challenge");
            Err(err.into())
        }
    })
}

fn b7<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("b7", |run| {
        if ask_bool(run, Handler::Forbidden)? {
            run.finalize(StatusCode::FORBIDDEN)
        } else {
            b6(run)
        }
    })
}

fn b6<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("b6", |run| {
        if ask_bool(run, Handler::ValidContentHeaders)? {
            b5(run)
        } else {
            run.finalize(StatusCode::NOT_IMPLEMENTED)
        }
    })
}

fn b5<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("b5", |run| {
        if ask_bool(run, Handler::KnownContentType)? {
            b4(run)
        } else {
            run.finalize(StatusCode::UNSUPPORTED_MEDIA_TYPE)
        }
    })
}

fn b4<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("b4", |run| {
        if ask_bool(run, Handler::ValidEntityLength)? {
            b3(run)
        } else {
            run.finalize(StatusCode::PAYLOAD_TOO_LARGE)
        }
    })
}

fn b3<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("b3", |run| {
        if run.context().request.method == Method::OPTIONS {
            let allowed = ask_list(run, Handler::AllowedMethods)?;
            run.context_mut()
                .response
                .set_header("allow", &allowed.join(", "));
            run.finalize(StatusCode::OK)
        } else {
            negotiation::c3(run)
        }
    })
}

fn contains_method(methods: &[String], method: &Method) -> bool {
    methods.iter().any(|m| m == method.as_str())
}
