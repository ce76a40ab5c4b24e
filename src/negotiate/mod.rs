//! Content negotiation subsystem.
//!
//! # Data Flow
//! ```text
//! Accept / Accept-Charset / Accept-Encoding header
//!     → accept.rs (split elements, parse q-values, stable sort by quality)
//!     → choose.rs (match against what the resource provides)
//!     → Return: chosen value or None (caller answers 406)
//!
//! Provided media types (bare string, (string, params), or triple)
//!     → media_type.rs (normalize to MediaType)
//! ```
//!
//! # Design Decisions
//! - Pure functions, no I/O, no shared state
//! - Malformed input never fails: media types fall back to
//!   `application/octet-stream`, qualities to `1.0`, dates to `HttpDate::Bad`
//! - Ties in quality keep header order (client preference)

pub mod accept;
pub mod choose;
pub mod date;
pub mod media_type;

pub use accept::{parse_accept, parse_weighted, parse_quality, AcceptEntry, Weighted};
pub use choose::{choose_charset, choose_encoding, choose_media_type, choose_weighted};
pub use date::{format_http_date, parse_http_date, HttpDate};
pub use media_type::{fuzzy_match, normalize, MediaType, Params, Representation};

/// Fallback charset when a client expresses no preference.
pub const DEFAULT_CHARSET: &str = "utf8";

/// Fallback content coding when a client expresses no preference.
pub const DEFAULT_ENCODING: &str = "identity";
