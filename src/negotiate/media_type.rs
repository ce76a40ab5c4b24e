//! Normalized media types.
//!
//! # Responsibilities
//! - Turn any accepted representation of a media type into a `MediaType`
//! - Render a `MediaType` back to its header form
//! - Wildcard-aware matching between what a resource has and what a client wants
//!
//! # Design Decisions
//! - Type and subtype compare case-insensitively (RFC 7231 §3.1.1.1)
//! - Parameter keys are case-sensitive as given, order is kept for rendering
//! - Parameter equality is set equality; rendering order does not matter

use serde::Serialize;
use std::fmt;

/// Media type parameters in the order they were supplied.
pub type Params = Vec<(String, String)>;

/// A `(type, subtype, params)` triple.
#[derive(Debug, Clone, Serialize)]
pub struct MediaType {
    pub main_type: String,
    pub sub_type: String,
    pub params: Params,
}

/// The forms accepted by [`normalize`].
#[derive(Debug, Clone)]
pub enum Representation<'a> {
    /// `"text/html"` or `"text/html; level=1"`.
    Bare(&'a str),
    /// A type string with an explicit parameter list.
    WithParams(&'a str, Params),
    /// Already normalized.
    Normalized(MediaType),
}

impl<'a> From<&'a str> for Representation<'a> {
    fn from(value: &'a str) -> Self {
        Representation::Bare(value)
    }
}

impl<'a> From<&'a String> for Representation<'a> {
    fn from(value: &'a String) -> Self {
        Representation::Bare(value.as_str())
    }
}

impl<'a> From<(&'a str, Params)> for Representation<'a> {
    fn from((value, params): (&'a str, Params)) -> Self {
        Representation::WithParams(value, params)
    }
}

impl From<MediaType> for Representation<'_> {
    fn from(value: MediaType) -> Self {
        Representation::Normalized(value)
    }
}

impl MediaType {
    /// Build a media type without parameters.
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            params: Vec::new(),
        }
    }

    /// Add a parameter, keeping insertion order.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// `application/octet-stream`, the fallback for anything unparseable.
    pub fn octet_stream() -> Self {
        Self::new("application", "octet-stream")
    }

    /// Look up a parameter value by exact key.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// True when type and subtype are both `*`.
    pub fn is_any(&self) -> bool {
        self.main_type == "*" && self.sub_type == "*"
    }

    /// Whether `self`, acting as an accept pattern, matches `candidate`.
    ///
    /// Wildcards match anything; parameter sets must be equal.
    pub fn accepts_exactly(&self, candidate: &MediaType) -> bool {
        segment_matches(&self.main_type, &candidate.main_type)
            && segment_matches(&self.sub_type, &candidate.sub_type)
            && params_equal(&self.params, &candidate.params)
    }
}

impl PartialEq for MediaType {
    fn eq(&self, other: &Self) -> bool {
        self.main_type.eq_ignore_ascii_case(&other.main_type)
            && self.sub_type.eq_ignore_ascii_case(&other.sub_type)
            && params_equal(&self.params, &other.params)
    }
}

impl Eq for MediaType {}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;
        for (key, value) in &self.params {
            write!(f, "; {}={}", key, value)?;
        }
        Ok(())
    }
}

/// Normalize any supported representation into a [`MediaType`].
///
/// Input with no `/`, an empty segment, or a wildcard type paired with a
/// concrete subtype (`*/html`) becomes `application/octet-stream`.
pub fn normalize<'a>(representation: impl Into<Representation<'a>>) -> MediaType {
    match representation.into() {
        Representation::Normalized(media_type) => media_type,
        Representation::Bare(raw) => {
            let mut pieces = raw.split(';');
            let essence = pieces.next().unwrap_or_default();
            let params = pieces.filter_map(parse_param).collect();
            parse_essence(essence, params)
        }
        Representation::WithParams(raw, params) => {
            let essence = raw.split(';').next().unwrap_or_default();
            parse_essence(essence, params)
        }
    }
}

/// `have` matches `want` when every segment of `want` is `*` or equal, and
/// every parameter in `want` appears with the same value in `have`.
pub fn fuzzy_match(have: &MediaType, want: &MediaType) -> bool {
    segment_matches(&want.main_type, &have.main_type)
        && segment_matches(&want.sub_type, &have.sub_type)
        && want
            .params
            .iter()
            .all(|(key, value)| have.param(key) == Some(value.as_str()))
}

fn parse_essence(essence: &str, params: Params) -> MediaType {
    let Some((main_type, sub_type)) = essence.trim().split_once('/') else {
        return MediaType::octet_stream();
    };
    let main_type = main_type.trim();
    let sub_type = sub_type.trim();

    if main_type.is_empty() || sub_type.is_empty() || sub_type.contains('/') {
        return MediaType::octet_stream();
    }
    if main_type == "*" && sub_type != "*" {
        return MediaType::octet_stream();
    }

    MediaType {
        main_type: main_type.to_string(),
        sub_type: sub_type.to_string(),
        params,
    }
}

pub(crate) fn parse_param(raw: &str) -> Option<(String, String)> {
    let (key, value) = raw.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = value.trim().trim_matches('"');
    Some((key.to_string(), value.to_string()))
}

fn segment_matches(pattern: &str, value: &str) -> bool {
    pattern == "*" || pattern.eq_ignore_ascii_case(value)
}

fn params_equal(left: &Params, right: &Params) -> bool {
    let within = |a: &Params, b: &Params| {
        a.iter()
            .all(|(key, value)| b.iter().any(|(k, v)| k == key && v == value))
    };
    within(left, right) && within(right, left)
}
