//! Failed calls to other services and the context pulled out of them.
//!
//! A failed upstream call either produced a response (the remote side
//! answered with an error status) or it did not (connection refused, DNS
//! failure, timeout). Only the first case yields extra context.
//!
//! # Extraction Rules
//!
//! - `url` is always present when a response exists
//! - `body` is present only for a JSON content type (header name and value
//!   matched case-insensitively)
//! - a body that cannot be read drops `body` and keeps `url`
//!
//! # Example
//!
//! ```rust
//! use palisade_http_errors::{Header, UpstreamFailure, UpstreamResponse, extract_context};
//!
//! let response = UpstreamResponse::new("http://front50/pipelines", 502)
//!     .with_header(Header::new("Content-Type", "application/json"))
//!     .with_body(br#"{"error":"timeout"}"#.to_vec());
//! let failure = UpstreamFailure::with_response(response);
//!
//! let context = extract_context(&failure).unwrap();
//! assert_eq!(context.get("body"), Some(r#"{"error":"timeout"}"#));
//! ```

use crate::models::{AdditionalContext, ATTR_BODY, ATTR_URL};
use std::fmt;
use std::io::{self, Read};

const CONTENT_TYPE: &str = "content-type";
const JSON_MEDIA_TYPE: &str = "application/json";

/// Buffered body of an upstream response.
///
/// Bodies are already received when the failure is raised; `open` only
/// hands out a reader over those bytes.
pub trait ResponseBody: Send + Sync {
    /// Reader over the buffered bytes.
    fn open(&self) -> io::Result<Box<dyn Read + '_>>;
}

impl ResponseBody for Vec<u8> {
    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(self.as_slice()))
    }
}

impl ResponseBody for String {
    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(self.as_bytes()))
    }
}

impl ResponseBody for &'static [u8] {
    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(*self))
    }
}

/// Single response header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    value: String,
}

impl Header {
    /// Header `name: value`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Header name as received.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Header value as received.
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Response captured from a failed upstream call.
pub struct UpstreamResponse {
    url: String,
    status: u16,
    headers: Vec<Header>,
    body: Option<Box<dyn ResponseBody>>,
}

impl UpstreamResponse {
    /// `status` is the raw value sent by the remote side and is not
    /// validated here.
    pub fn new(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            status,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Append a header.
    pub fn with_header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    /// Attach the buffered body.
    pub fn with_body(mut self, body: impl ResponseBody + 'static) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    /// URL of the failed call.
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Raw status sent by the remote side.
    #[inline]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Headers in received order.
    #[inline]
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// First header whose name matches `name` ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&Header> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
    }

    /// True if the content type mentions `application/json`.
    pub fn is_json(&self) -> bool {
        self.header(CONTENT_TYPE)
            .is_some_and(|h| h.value.to_ascii_lowercase().contains(JSON_MEDIA_TYPE))
    }

    /// Read the whole body as UTF-8, replacing malformed sequences.
    ///
    /// A response without a body reads as the empty string.
    pub fn read_body(&self) -> io::Result<String> {
        let Some(body) = self.body.as_ref() else {
            return Ok(String::new());
        };
        let mut bytes = Vec::new();
        body.open()?.read_to_end(&mut bytes)?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }
}

impl fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("url", &self.url)
            .field("status", &self.status)
            .field("headers", &self.headers.len())
            .field("body", &self.body.as_ref().map(|_| "<PRESENT>"))
            .finish()
    }
}

/// A failed call to another service.
#[derive(Debug)]
pub struct UpstreamFailure {
    url: Option<String>,
    response: Option<UpstreamResponse>,
}

impl UpstreamFailure {
    /// The remote side answered.
    pub fn with_response(response: UpstreamResponse) -> Self {
        Self {
            url: Some(response.url.clone()),
            response: Some(response),
        }
    }

    /// No response was received (network-level failure).
    pub fn network(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            response: None,
        }
    }

    /// URL of the failed call, when known.
    #[inline]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Response, absent for network failures.
    #[inline]
    pub fn response(&self) -> Option<&UpstreamResponse> {
        self.response.as_ref()
    }
}

/// Pull diagnostic context out of an upstream failure.
///
/// Returns `None` for network failures: without a response there is
/// nothing to extract. Body read failures are logged and leave `body` out.
pub fn extract_context(failure: &UpstreamFailure) -> Option<AdditionalContext> {
    let response = failure.response()?;

    let mut context = AdditionalContext::new();
    context.insert(ATTR_URL, response.url());

    if response.is_json() {
        match response.read_body() {
            Ok(body) => context.insert(ATTR_BODY, body),
            Err(e) => {
                tracing::warn!(
                    url = response.url(),
                    error = %e,
                    "unable to read upstream response body"
                );
            }
        }
    }

    Some(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenBody;

    impl ResponseBody for BrokenBody {
        fn open(&self) -> io::Result<Box<dyn Read + '_>> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "stream reset"))
        }
    }

    struct TruncatedBody;

    impl Read for TruncatedBody {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::UnexpectedEof))
        }
    }

    impl ResponseBody for TruncatedBody {
        fn open(&self) -> io::Result<Box<dyn Read + '_>> {
            Ok(Box::new(TruncatedBody))
        }
    }

    fn json_response(content_type: &str) -> UpstreamResponse {
        UpstreamResponse::new("http://clouddriver/applications", 502)
            .with_header(Header::new("Content-Type", content_type))
            .with_body(br#"{"error":"timeout"}"#.to_vec())
    }

    fn keys(context: &AdditionalContext) -> Vec<&'static str> {
        context.keys().collect()
    }

    #[test]
    fn json_with_charset_extracts_url_and_body() {
        let failure = UpstreamFailure::with_response(json_response("application/json; charset=utf-8"));
        let context = extract_context(&failure).unwrap();
        assert_eq!(keys(&context), ["url", "body"]);
        assert_eq!(context.get("url"), Some("http://clouddriver/applications"));
        assert_eq!(context.get("body"), Some(r#"{"error":"timeout"}"#));
    }

    #[test]
    fn content_type_match_ignores_case() {
        let response = UpstreamResponse::new("http://x", 500)
            .with_header(Header::new("CONTENT-TYPE", "Application/JSON"))
            .with_body(String::from("{}"));
        let context = extract_context(&UpstreamFailure::with_response(response)).unwrap();
        assert_eq!(context.get("body"), Some("{}"));
    }

    #[test]
    fn plain_text_extracts_url_only() {
        let failure = UpstreamFailure::with_response(json_response("text/plain"));
        let context = extract_context(&failure).unwrap();
        assert_eq!(keys(&context), ["url"]);
    }

    #[test]
    fn missing_content_type_extracts_url_only() {
        let response = UpstreamResponse::new("http://x", 503).with_body(b"oops".to_vec());
        let context = extract_context(&UpstreamFailure::with_response(response)).unwrap();
        assert_eq!(keys(&context), ["url"]);
    }

    #[test]
    fn unreadable_body_keeps_url() {
        let response = UpstreamResponse::new("http://x", 500)
            .with_header(Header::new("content-type", "application/json"))
            .with_body(BrokenBody);
        let context = extract_context(&UpstreamFailure::with_response(response)).unwrap();
        assert_eq!(keys(&context), ["url"]);

        let response = UpstreamResponse::new("http://x", 500)
            .with_header(Header::new("content-type", "application/json"))
            .with_body(TruncatedBody);
        let context = extract_context(&UpstreamFailure::with_response(response)).unwrap();
        assert_eq!(keys(&context), ["url"]);
    }

    #[test]
    fn json_without_body_reads_empty() {
        let response = UpstreamResponse::new("http://x", 500)
            .with_header(Header::new("content-type", "application/json"));
        let context = extract_context(&UpstreamFailure::with_response(response)).unwrap();
        assert_eq!(context.get("body"), Some(""));
    }

    #[test]
    fn malformed_utf8_is_replaced() {
        let response = UpstreamResponse::new("http://x", 500)
            .with_header(Header::new("content-type", "application/json"))
            .with_body(vec![b'{', 0xff, b'}']);
        assert_eq!(response.read_body().unwrap(), "{\u{fffd}}");
    }

    #[test]
    fn network_failure_has_no_context() {
        let failure = UpstreamFailure::network("http://igor/builds");
        assert!(extract_context(&failure).is_none());
        assert_eq!(failure.url(), Some("http://igor/builds"));
    }

    #[test]
    fn first_matching_header_wins() {
        let response = UpstreamResponse::new("http://x", 500)
            .with_header(Header::new("content-type", "text/html"))
            .with_header(Header::new("Content-Type", "application/json"));
        assert!(!response.is_json());
    }
}
