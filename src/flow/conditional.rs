//! Existence and conditional request column (g7 .. l17).

use axum::http::{Method, StatusCode};
use chrono::{DateTime, FixedOffset, Utc};
use std::fmt::Debug;

use super::{ask_bool, outcome, request_header, VARY};
use crate::machine::metadata::{ETAG, LAST_MODIFIED};
use crate::machine::{Handler, Interrupt, Outcome, Run};
use crate::negotiate::parse_http_date;

pub(super) fn g7<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("g7", |run| {
        let vary = run.context().metadata.get(&VARY).map(|v| v.join(", "));
        if let Some(vary) = vary {
            run.context_mut().response.set_header("vary", &vary);
        }

        if ask_bool(run, Handler::ResourceExists)? {
            g8(run)
        } else {
            h7(run)
        }
    })
}

fn h7<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("h7", |run| {
        if request_header(run, "if-match").is_some_and(|v| v.trim() == "*") {
            run.finalize(StatusCode::PRECONDITION_FAILED)
        } else {
            run.finalize(StatusCode::NOT_FOUND)
        }
    })
}

fn g8<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("g8", |run| match request_header(run, "if-match") {
        Some(header) => g9(run, header),
        None => h10(run),
    })
}

fn g9<S: Debug>(run: &mut Run<S>, if_match: String) -> Outcome {
    run.decide("g9", |run| {
        if if_match.trim() == "*" {
            h10(run)
        } else {
            g11(run, if_match)
        }
    })
}

fn g11<S: Debug>(run: &mut Run<S>, if_match: String) -> Outcome {
    run.decide("g11", |run| {
        let etag = current_etag(run)?;
        if etag.is_some_and(|etag| etag_listed(&if_match, &etag)) {
            h10(run)
        } else {
            run.finalize(StatusCode::PRECONDITION_FAILED)
        }
    })
}

fn h10<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("h10", |run| match request_header(run, "if-unmodified-since") {
        Some(header) => h11(run, header),
        None => i12(run),
    })
}

fn h11<S: Debug>(run: &mut Run<S>, header: String) -> Outcome {
    run.decide("h11", |run| match parse_http_date(&header).valid() {
        Some(date) => h12(run, date),
        None => i12(run),
    })
}

fn h12<S: Debug>(run: &mut Run<S>, since: DateTime<FixedOffset>) -> Outcome {
    run.decide("h12", |run| {
        let modified = current_last_modified(run)?;
        if modified.is_some_and(|modified| modified > since) {
            run.finalize(StatusCode::PRECONDITION_FAILED)
        } else {
            i12(run)
        }
    })
}

fn i12<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("i12", |run| match request_header(run, "if-none-match") {
        Some(header) => i13(run, header),
        None => l13(run),
    })
}

fn i13<S: Debug>(run: &mut Run<S>, if_none_match: String) -> Outcome {
    run.decide("i13", |run| {
        if if_none_match.trim() == "*" {
            j18(run)
        } else {
            k13(run, if_none_match)
        }
    })
}

fn k13<S: Debug>(run: &mut Run<S>, if_none_match: String) -> Outcome {
    run.decide("k13", |run| {
        let etag = current_etag(run)?;
        if etag.is_some_and(|etag| etag_listed(&if_none_match, &etag)) {
            j18(run)
        } else {
            l13(run)
        }
    })
}

fn j18<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("j18", |run| {
        let method = &run.context().request.method;
        if *method == Method::GET || *method == Method::HEAD {
            run.finalize(StatusCode::NOT_MODIFIED)
        } else {
            run.finalize(StatusCode::PRECONDITION_FAILED)
        }
    })
}

fn l13<S: Debug>(run: &mut Run<S>) -> Outcome {
    run.decide("l13", |run| match request_header(run, "if-modified-since") {
        Some(header) => l14(run, header),
        None => outcome::m16(run),
    })
}

fn l14<S: Debug>(run: &mut Run<S>, header: String) -> Outcome {
    run.decide("l14", |run| match parse_http_date(&header).valid() {
        Some(date) => l15(run, date),
        None => outcome::m16(run),
    })
}

fn l15<S: Debug>(run: &mut Run<S>, since: DateTime<FixedOffset>) -> Outcome {
    run.decide("l15", |run| {
        if since > Utc::now() {
            outcome::m16(run)
        } else {
            l17(run, since)
        }
    })
}

fn l17<S: Debug>(run: &mut Run<S>, since: DateTime<FixedOffset>) -> Outcome {
    run.decide("l17", |run| {
        match current_last_modified(run)? {
            Some(modified) if modified <= since => run.finalize(StatusCode::NOT_MODIFIED),
            _ => outcome::m16(run),
        }
    })
}

/// Quoted entity tag for the resource, asked once per run.
pub(super) fn current_etag<S: Debug>(run: &mut Run<S>) -> Result<Option<String>, Interrupt> {
    if let Some(etag) = run.context().metadata.get(&ETAG) {
        return Ok(Some(etag.clone()));
    }
    let etag = run
        .call(Handler::GenerateEtag)?
        .into_optional_text(Handler::GenerateEtag)?
        .map(|etag| quote_etag(&etag));
    if let Some(etag) = &etag {
        run.context_mut().metadata.insert(&ETAG, etag.clone());
    }
    Ok(etag)
}

/// Last modification date for the resource, asked once per run.
pub(super) fn current_last_modified<S: Debug>(
    run: &mut Run<S>,
) -> Result<Option<DateTime<FixedOffset>>, Interrupt> {
    if let Some(date) = run.context().metadata.get(&LAST_MODIFIED) {
        return Ok(Some(*date));
    }
    let date = run
        .call(Handler::LastModified)?
        .into_optional_date(Handler::LastModified)?;
    if let Some(date) = date {
        run.context_mut().metadata.insert(&LAST_MODIFIED, date);
    }
    Ok(date)
}

fn quote_etag(etag: &str) -> String {
    if etag.starts_with('"') || etag.starts_with("W/\"") {
        etag.to_string()
    } else {
        format!("\"{}\"", etag)
    }
}

// Weak comparison: a `W/` prefix on either side is ignored.
fn etag_listed(header: &str, etag: &str) -> bool {
    let strip = |tag: &str| tag.trim().trim_start_matches("W/").to_string();
    let etag = strip(etag);
    header.split(',').any(|candidate| strip(candidate) == etag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_etag() {
        assert_eq!(quote_etag("v1"), "\"v1\"");
        assert_eq!(quote_etag("\"v1\""), "\"v1\"");
        assert_eq!(quote_etag("W/\"v1\""), "W/\"v1\"");
    }

    #[test]
    fn test_etag_listed() {
        assert!(etag_listed("\"a\", \"v1\"", "\"v1\""));
        assert!(etag_listed("W/\"v1\"", "\"v1\""));
        assert!(!etag_listed("\"v2\"", "\"v1\""));
    }
}
