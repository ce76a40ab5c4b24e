//! Representation selection.
//!
//! # Weighted choice (charset, encoding)
//! ```text
//! forbidden  = values listed with q=0
//! default_ok = default not forbidden, and not (`*;q=0` without the default
//!              listed at q>0)
//! any_ok     = `*` listed with q>0
//!
//! supported - forbidden
//!     → empty: None
//!     → first supported matching a preference (preference order)
//!     → else first supported if any_ok
//!     → else default if still supported and default_ok
//!     → else None
//! ```

use crate::negotiate::accept::{parse_accept, parse_weighted, Weighted};
use crate::negotiate::media_type::MediaType;
use crate::negotiate::{DEFAULT_CHARSET, DEFAULT_ENCODING};

/// Pick the provided media type the client prefers most.
///
/// Entries with `q=0` are never chosen. Returns `None` when nothing
/// provided is acceptable.
pub fn choose_media_type(provided: &[MediaType], accept_header: &str) -> Option<MediaType> {
    parse_accept(accept_header)
        .into_iter()
        .filter(|entry| entry.quality > 0.0)
        .find_map(|entry| {
            provided
                .iter()
                .find(|candidate| entry.media_type.accepts_exactly(candidate))
                .cloned()
        })
}

/// Pick a content coding, defaulting to `identity`.
pub fn choose_encoding<S: AsRef<str>>(supported: &[S], accept_encoding: &str) -> Option<String> {
    choose_weighted(supported, accept_encoding, DEFAULT_ENCODING)
}

/// Pick a charset, defaulting to `utf8`.
pub fn choose_charset<S: AsRef<str>>(supported: &[S], accept_charset: &str) -> Option<String> {
    choose_weighted(supported, accept_charset, DEFAULT_CHARSET)
}

/// Generalized weighted choice shared by charset and encoding negotiation.
pub fn choose_weighted<S: AsRef<str>>(
    supported: &[S],
    header: &str,
    default: &str,
) -> Option<String> {
    let preferences = parse_weighted(header);

    let listed = |value: &str, pred: fn(&Weighted) -> bool| {
        preferences
            .iter()
            .any(|p| p.value.eq_ignore_ascii_case(value) && pred(p))
    };
    let is_forbidden = |value: &str| listed(value, |p| p.quality == 0.0);

    let star_forbidden = listed("*", |p| p.quality == 0.0);
    let default_allowed = listed(default, |p| p.quality > 0.0);
    let default_ok = !is_forbidden(default) && !(star_forbidden && !default_allowed);
    let any_ok = listed("*", |p| p.quality > 0.0);

    let remaining: Vec<&str> = supported
        .iter()
        .map(AsRef::as_ref)
        .filter(|value| !is_forbidden(value))
        .collect();

    if remaining.is_empty() {
        return None;
    }

    let preferred = preferences.iter().find_map(|p| {
        remaining
            .iter()
            .find(|value| value.eq_ignore_ascii_case(&p.value))
    });
    if let Some(value) = preferred {
        return Some(value.to_string());
    }

    if any_ok {
        return remaining.first().map(|value| value.to_string());
    }

    if default_ok {
        return remaining
            .iter()
            .find(|value| value.eq_ignore_ascii_case(default))
            .map(|value| value.to_string());
    }

    None
}
