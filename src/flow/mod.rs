//! Reference decision graph.
//!
//! A compact subset of the webmachine flow chart, expressed as functions that
//! call their successor directly. Step names are the chart coordinates.
//!
//! # Data Flow
//! ```text
//! b13 service available → b12 known method → b11 uri too long
//!     → b10 method allowed → b9 malformed → b8 authorized → b7 forbidden
//!     → b6 content headers → b5 content type → b4 entity length → b3 OPTIONS
//!     → c3/c4 Accept → e5/e6 Accept-Charset → f6/f7 Accept-Encoding
//!     → g7 exists?
//!         no  → h7 If-Match: * → 412 | 404
//!         yes → g8..g11 If-Match → h10..h12 If-Unmodified-Since
//!             → i12..k13 If-None-Match → l13..l17 If-Modified-Since
//!             → m16 DELETE → m20 → o20
//!             → n16 POST → n11 → o20
//!             → o18 GET/HEAD body → 200
//! ```

mod conditional;
mod negotiation;
mod outcome;
mod validate;

use std::fmt::Debug;

use crate::machine::{Conversion, Handler, Interrupt, Key, Outcome, Run};

/// Request headers that influenced negotiation, for `Vary`.
pub(crate) const VARY: Key<Vec<&'static str>> = Key::new("vary");
/// Converter for the negotiated charset, applied to the body in o18.
pub(crate) const CHARSET_CONVERSION: Key<Conversion> = Key::new("charset_conversion");
/// Encoder for the negotiated content coding, applied after the charset.
pub(crate) const ENCODING_CONVERSION: Key<Conversion> = Key::new("encoding_conversion");

/// Entry step of the reference graph.
pub fn start<S: Debug>(run: &mut Run<S>) -> Outcome {
    validate::b13(run)
}

pub(crate) fn ask_bool<S: Debug>(run: &mut Run<S>, handler: Handler) -> Result<bool, Interrupt> {
    Ok(run.call(handler)?.into_bool(handler)?)
}

pub(crate) fn ask_list<S: Debug>(
    run: &mut Run<S>,
    handler: Handler,
) -> Result<Vec<String>, Interrupt> {
    Ok(run.call(handler)?.into_list(handler)?)
}

pub(crate) fn request_header<S: Debug>(run: &Run<S>, name: &str) -> Option<String> {
    run.context().request.header(name).map(str::to_string)
}
