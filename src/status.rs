//! Validated HTTP status codes.
//!
//! Every status that leaves this crate passes through [`HttpStatus`], which
//! can only hold values in `[100, 599]`. Downstream code therefore never has
//! to re-check the range before writing a status line.
//!
//! # Example
//!
//! ```rust
//! use palisade_http_errors::HttpStatus;
//!
//! // Compile-time validation
//! const TEAPOT: HttpStatus = HttpStatus::new(418);
//!
//! // Runtime validation (e.g. a status copied from an upstream response)
//! assert!(HttpStatus::checked_new(999).is_err());
//! assert_eq!(TEAPOT.reason_phrase(), "I'm a teapot");
//! ```

use std::fmt;

/// HTTP status code restricted to the standard range `100..=599`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HttpStatus(u16);

impl HttpStatus {
    /// 200 OK
    pub const OK: HttpStatus = HttpStatus(200);
    /// 400 Bad Request
    pub const BAD_REQUEST: HttpStatus = HttpStatus(400);
    /// 401 Unauthorized
    pub const UNAUTHORIZED: HttpStatus = HttpStatus(401);
    /// 403 Forbidden
    pub const FORBIDDEN: HttpStatus = HttpStatus(403);
    /// 404 Not Found
    pub const NOT_FOUND: HttpStatus = HttpStatus(404);
    /// 409 Conflict
    pub const CONFLICT: HttpStatus = HttpStatus(409);
    /// 422 Unprocessable Entity
    pub const UNPROCESSABLE_ENTITY: HttpStatus = HttpStatus(422);
    /// 429 Too Many Requests
    pub const TOO_MANY_REQUESTS: HttpStatus = HttpStatus(429);
    /// 500 Internal Server Error
    pub const INTERNAL_SERVER_ERROR: HttpStatus = HttpStatus(500);
    /// 502 Bad Gateway
    pub const BAD_GATEWAY: HttpStatus = HttpStatus(502);
    /// 503 Service Unavailable
    pub const SERVICE_UNAVAILABLE: HttpStatus = HttpStatus(503);
    /// 504 Gateway Timeout
    pub const GATEWAY_TIMEOUT: HttpStatus = HttpStatus(504);

    /// Create a status with compile-time validation.
    ///
    /// # Panics
    ///
    /// Panics at compile time (in const contexts) or at runtime if `code`
    /// is outside `100..=599`.
    #[inline]
    pub const fn new(code: u16) -> Self {
        assert!(code >= 100 && code <= 599, "HTTP status must be 100-599");
        Self(code)
    }

    /// Create a status with runtime validation.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `code` is outside `100..=599`.
    #[inline]
    pub fn checked_new(code: u16) -> Result<Self, StatusError> {
        if (100..=599).contains(&code) {
            Ok(Self(code))
        } else {
            Err(StatusError::OutOfRange { value: code })
        }
    }

    /// Get the raw numeric value.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// 4xx
    #[inline]
    pub const fn is_client_error(self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// 5xx
    #[inline]
    pub const fn is_server_error(self) -> bool {
        self.0 >= 500
    }

    /// Standard reason phrase for this status.
    ///
    /// Codes without an assigned phrase get the phrase of their class, so
    /// the result is never empty.
    pub const fn reason_phrase(self) -> &'static str {
        match self.0 {
            100 => "Continue",
            101 => "Switching Protocols",
            102 => "Processing",
            103 => "Early Hints",
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
            413 => "Payload Too Large",
            414 => "URI Too Long",
            415 => "Unsupported Media Type",
            416 => "Range Not Satisfiable",
            417 => "Expectation Failed",
            418 => "I'm a teapot",
            421 => "Misdirected Request",
            422 => "Unprocessable Entity",
            423 => "Locked",
            424 => "Failed Dependency",
            425 => "Too Early",
            426 => "Upgrade Required",
            428 => "Precondition Required",
            429 => "Too Many Requests",
            431 => "Request Header Fields Too Large",
            451 => "Unavailable For Legal Reasons",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            505 => "HTTP Version Not Supported",
            506 => "Variant Also Negotiates",
            507 => "Insufficient Storage",
            508 => "Loop Detected",
            510 => "Not Extended",
            511 => "Network Authentication Required",
            100..=199 => "Informational",
            200..=299 => "Success",
            300..=399 => "Redirection",
            400..=499 => "Client Error",
            _ => "Server Error",
        }
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

impl TryFrom<u16> for HttpStatus {
    type Error = StatusError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Self::checked_new(code)
    }
}

/// Error type for status validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    /// Code lies outside `100..=599`.
    OutOfRange {
        /// Rejected code.
        value: u16,
    },
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { value } => {
                write!(f, "HTTP status {} outside the range 100-599", value)
            }
        }
    }
}

impl std::error::Error for StatusError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const_construction() {
        const CODE: HttpStatus = HttpStatus::new(409);
        assert_eq!(CODE, HttpStatus::CONFLICT);
        assert_eq!(CODE.as_u16(), 409);
    }

    #[test]
    #[should_panic(expected = "HTTP status must be 100-599")]
    fn new_rejects_out_of_range() {
        let _ = HttpStatus::new(600);
    }

    #[test]
    fn checked_new_bounds() {
        assert!(HttpStatus::checked_new(99).is_err());
        assert!(HttpStatus::checked_new(100).is_ok());
        assert!(HttpStatus::checked_new(599).is_ok());
        assert_eq!(
            HttpStatus::checked_new(600),
            Err(StatusError::OutOfRange { value: 600 })
        );
    }

    #[test]
    fn classes() {
        assert!(HttpStatus::NOT_FOUND.is_client_error());
        assert!(!HttpStatus::NOT_FOUND.is_server_error());
        assert!(HttpStatus::BAD_GATEWAY.is_server_error());
        assert!(!HttpStatus::OK.is_client_error());
    }

    #[test]
    fn reason_phrases_never_empty() {
        for code in 100..=599u16 {
            let status = HttpStatus::new(code);
            assert!(!status.reason_phrase().is_empty(), "empty phrase for {}", code);
        }
        assert_eq!(HttpStatus::new(499).reason_phrase(), "Client Error");
        assert_eq!(HttpStatus::FORBIDDEN.reason_phrase(), "Forbidden");
    }

    #[test]
    fn display_includes_phrase() {
        assert_eq!(HttpStatus::CONFLICT.to_string(), "409 Conflict");
    }
}
