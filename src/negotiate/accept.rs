//! Quality-value header parsing.
//!
//! Handles the `value; q=N, value; q=N` grammar shared by `Accept`,
//! `Accept-Charset` and `Accept-Encoding`.

use crate::negotiate::media_type::{normalize, parse_param, MediaType, Representation};
use std::cmp::Ordering;

/// One element of an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptEntry {
    pub quality: f64,
    pub media_type: MediaType,
}

/// One element of an `Accept-Charset` / `Accept-Encoding` header.
#[derive(Debug, Clone, PartialEq)]
pub struct Weighted {
    pub quality: f64,
    /// Lowercased value.
    pub value: String,
}

/// Parse a quality value; anything malformed or outside `[0, 1]` is `1.0`.
pub fn parse_quality(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(q) if (0.0..=1.0).contains(&q) => q,
        _ => 1.0,
    }
}

/// Parse an `Accept` header, sorted by descending quality.
///
/// A bare `*` is read as `*/*`. The `q` parameter is removed from the
/// parameters used for matching.
pub fn parse_accept(header: &str) -> Vec<AcceptEntry> {
    let mut entries: Vec<AcceptEntry> = elements(header)
        .map(|element| {
            let mut pieces = element.split(';');
            let essence = pieces.next().unwrap_or_default().trim();
            let essence = if essence == "*" { "*/*" } else { essence };

            let mut quality = 1.0;
            let mut params = Vec::new();
            for (key, value) in pieces.filter_map(parse_param) {
                if key.eq_ignore_ascii_case("q") {
                    quality = parse_quality(&value);
                } else {
                    params.push((key, value));
                }
            }

            AcceptEntry {
                quality,
                media_type: normalize(Representation::WithParams(essence, params)),
            }
        })
        .collect();

    entries.sort_by(|a, b| by_quality_desc(a.quality, b.quality));
    entries
}

/// Parse a charset/encoding style header, sorted by descending quality.
pub fn parse_weighted(header: &str) -> Vec<Weighted> {
    let mut entries: Vec<Weighted> = elements(header)
        .map(|element| {
            let mut pieces = element.split(';');
            let value = pieces.next().unwrap_or_default().trim().to_ascii_lowercase();
            let quality = pieces
                .filter_map(parse_param)
                .find(|(key, _)| key.eq_ignore_ascii_case("q"))
                .map(|(_, q)| parse_quality(&q))
                .unwrap_or(1.0);
            Weighted { quality, value }
        })
        .filter(|entry| !entry.value.is_empty())
        .collect();

    entries.sort_by(|a, b| by_quality_desc(a.quality, b.quality));
    entries
}

fn elements(header: &str) -> impl Iterator<Item = &str> {
    header
        .split(',')
        .map(str::trim)
        .filter(|element| !element.is_empty())
}

// `sort_by` is stable, so equal qualities keep header order.
fn by_quality_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
