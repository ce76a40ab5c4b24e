//! HTTP-date parsing for conditional request headers.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// A parsed `If-Modified-Since` / `If-Unmodified-Since` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpDate {
    Valid(DateTime<FixedOffset>),
    /// Unparseable; conditional checks treat this as "header absent".
    Bad,
}

impl HttpDate {
    pub fn valid(self) -> Option<DateTime<FixedOffset>> {
        match self {
            HttpDate::Valid(date) => Some(date),
            HttpDate::Bad => None,
        }
    }
}

/// Parse an IMF-fixdate, RFC 850 or asctime date. Never fails.
pub fn parse_http_date(raw: &str) -> HttpDate {
    let raw = raw.trim();

    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return HttpDate::Valid(date);
    }

    // Obsolete forms from RFC 7231 §7.1.1.1, always GMT.
    const OBSOLETE: [&str; 2] = ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"];
    OBSOLETE
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| HttpDate::Valid(Utc.from_utc_datetime(&naive).fixed_offset()))
        .unwrap_or(HttpDate::Bad)
}

/// Render a date in IMF-fixdate form for `Last-Modified` / `Expires`.
pub fn format_http_date(date: &DateTime<FixedOffset>) -> String {
    date.with_timezone(&Utc)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_imf_fixdate() {
        let date = parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT");
        let expected = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(date.valid().map(|d| d.with_timezone(&Utc)), Some(expected));
    }

    #[test]
    fn test_parse_obsolete_forms() {
        assert!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT").valid().is_some());
        assert!(parse_http_date("Sun Nov  6 08:49:37 1994").valid().is_some());
    }

    #[test]
    fn test_bad_date() {
        assert_eq!(parse_http_date("yesterday"), HttpDate::Bad);
        assert_eq!(parse_http_date(""), HttpDate::Bad);
    }

    #[test]
    fn test_format_round_trip() {
        let raw = "Sun, 06 Nov 1994 08:49:37 GMT";
        let date = parse_http_date(raw).valid().unwrap();
        assert_eq!(format_http_date(&date), raw);
    }
}
