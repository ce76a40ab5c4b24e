//! Fixed English reason phrases for standard status codes.

/// Reason phrase for `code`, or `None` outside the standard set.
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    let phrase = match code {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        306 => "Switch Proxy",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Request Entity Too Large",
        414 => "Request-URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Requested Range Not Satisfiable",
        417 => "Expectation Failed",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        _ => return None,
    };
    Some(phrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(reason_phrase(200), Some("OK"));
        assert_eq!(reason_phrase(406), Some("Not Acceptable"));
        assert_eq!(reason_phrase(308), Some("Permanent Redirect"));
        assert_eq!(reason_phrase(505), Some("HTTP Version Not Supported"));
    }

    #[test]
    fn test_covers_standard_ranges() {
        let ranges = [100..=101, 200..=206, 300..=308, 400..=417, 500..=505];
        for code in ranges.into_iter().flatten() {
            assert!(reason_phrase(code).is_some(), "missing phrase for {}", code);
        }
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(reason_phrase(418), None);
        assert_eq!(reason_phrase(299), None);
        assert_eq!(reason_phrase(0), None);
    }
}
