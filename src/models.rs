//! The caught exception as seen by the handlers.
//!
//! # Architecture
//!
//! An [`ExceptionRecord`] pairs two independent facts about a failure:
//!
//! - `ExceptionKind`: the closed set of handling categories. Classification
//!   matches on it exhaustively.
//! - `ExceptionType`: the concrete type identity. Declared statuses are looked
//!   up by walking its parent chain.
//!
//! # Memory Safety Strategy
//!
//! Messages routinely carry user names, role names and upstream payloads.
//! The message and every textual attribute value are zeroized when the record
//! drops. Records are not `Clone` so there is exactly one copy to clear.

use crate::types::{self, ExceptionType};
use crate::upstream::UpstreamFailure;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use zeroize::Zeroize;

/// Attribute key carrying the remote URL of a failed upstream call.
pub const ATTR_URL: &str = "url";

/// Attribute key carrying a JSON response body from a failed upstream call.
pub const ATTR_BODY: &str = "body";

/// Handling category of an exception.
///
/// Variants are listed in classification precedence order.
#[derive(Debug)]
pub enum ExceptionKind {
    /// Authorization failure. Its message is never shown to callers.
    AccessDenied,
    /// Explicit "resource not found".
    NotFound,
    /// Request rejected as malformed.
    InvalidRequest,
    /// Failure attributed to user input.
    UserInput,
    /// Bad argument supplied by the caller.
    IllegalArgument,
    /// Operation not valid in the current state.
    IllegalState,
    /// A call to another service failed.
    Upstream(UpstreamFailure),
    /// Anything else.
    Other,
}

impl ExceptionKind {
    /// Type identity used when a record is built from this kind alone.
    pub const fn default_type(&self) -> &'static ExceptionType {
        match self {
            Self::AccessDenied => &types::ACCESS_DENIED,
            Self::NotFound => &types::NOT_FOUND,
            Self::InvalidRequest => &types::INVALID_REQUEST,
            Self::UserInput => &types::USER_INPUT,
            Self::IllegalArgument => &types::ILLEGAL_ARGUMENT,
            Self::IllegalState => &types::ILLEGAL_STATE,
            Self::Upstream(_) => &types::UPSTREAM_FAILURE,
            Self::Other => &types::RUNTIME,
        }
    }
}

/// Diagnostic attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Free text; zeroized on drop.
    Text(String),
    /// Whole number.
    Integer(i64),
    /// Flag.
    Boolean(bool),
}

impl AttributeValue {
    /// The text, for `Text` values only.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl Zeroize for AttributeValue {
    fn zeroize(&mut self) {
        match self {
            Self::Text(s) => s.zeroize(),
            Self::Integer(i) => i.zeroize(),
            Self::Boolean(b) => *b = false,
        }
    }
}

/// Ordered attribute list. Most records carry at most two entries.
pub type Attributes = SmallVec<[(Cow<'static, str>, AttributeValue); 2]>;

/// Context pulled out of an upstream failure: `url`, and `body` for JSON
/// responses.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AdditionalContext {
    entries: SmallVec<[(&'static str, String); 2]>,
}

impl AdditionalContext {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any earlier value.
    pub fn insert(&mut self, key: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// True if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Convert into record attributes, consuming the context.
    pub fn into_attributes(mut self) -> Attributes {
        self.entries
            .drain(..)
            .map(|(k, v)| (Cow::Borrowed(k), AttributeValue::Text(v)))
            .collect()
    }
}

impl Drop for AdditionalContext {
    fn drop(&mut self) {
        for (_, value) in &mut self.entries {
            value.zeroize();
        }
    }
}

/// A caught exception, consumed once by the handlers.
///
/// # Example
///
/// ```rust
/// use palisade_http_errors::{ExceptionRecord, types};
///
/// let record = ExceptionRecord::not_found("pipeline 42 does not exist")
///     .with_attribute("application", "orca");
/// assert_eq!(record.exception_type().name(), types::NOT_FOUND.name());
/// ```
#[must_use = "exception records should be handed to the handlers"]
pub struct ExceptionRecord {
    kind: ExceptionKind,
    ty: &'static ExceptionType,
    message: Option<String>,
    attributes: Attributes,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl ExceptionRecord {
    /// Build a record whose type is the kind's default type.
    pub fn new(kind: ExceptionKind, message: Option<String>) -> Self {
        let ty = kind.default_type();
        Self {
            kind,
            ty,
            message,
            attributes: SmallVec::new(),
            source: None,
        }
    }

    /// Authorization failure.
    #[inline]
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::AccessDenied, Some(message.into()))
    }

    /// Missing resource.
    #[inline]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::NotFound, Some(message.into()))
    }

    /// Malformed request.
    #[inline]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::InvalidRequest, Some(message.into()))
    }

    /// Bad user input.
    #[inline]
    pub fn user_input(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::UserInput, Some(message.into()))
    }

    /// Bad argument.
    #[inline]
    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::IllegalArgument, Some(message.into()))
    }

    /// Operation invalid in the current state.
    #[inline]
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::IllegalState, Some(message.into()))
    }

    /// Failed call to another service.
    #[inline]
    pub fn upstream(failure: UpstreamFailure, message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::Upstream(failure), Some(message.into()))
    }

    /// Anything else.
    #[inline]
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::Other, Some(message.into()))
    }

    /// Narrow the type identity, e.g. to a concrete type carrying its own
    /// declared status.
    #[inline]
    pub fn with_type(mut self, ty: &'static ExceptionType) -> Self {
        self.ty = ty;
        self
    }

    /// Replace the message (`None` means the exception had no message).
    #[inline]
    pub fn with_message(mut self, message: Option<String>) -> Self {
        if let Some(old) = self.message.as_mut() {
            old.zeroize();
        }
        self.message = message;
        self
    }

    /// Append a diagnostic attribute.
    #[inline]
    pub fn with_attribute(
        mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Append several attributes, keeping their order.
    #[inline]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Attach the underlying cause.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Handling category.
    #[inline]
    pub fn kind(&self) -> &ExceptionKind {
        &self.kind
    }

    /// Concrete type identity.
    #[inline]
    pub fn exception_type(&self) -> &'static ExceptionType {
        self.ty
    }

    /// Original message, if any.
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// True when the message is missing, empty, or whitespace only.
    #[inline]
    pub fn is_blank_message(&self) -> bool {
        self.message.as_deref().is_none_or(|m| m.trim().is_empty())
    }

    /// Attributes in insertion order.
    #[inline]
    pub fn attributes(&self) -> &[(Cow<'static, str>, AttributeValue)] {
        &self.attributes
    }

    /// First attribute stored under `key`.
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }

    /// Direct cause.
    #[inline]
    pub fn source(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Move attributes and cause out, leaving the record without either.
    pub(crate) fn take_diagnostics(&mut self) -> (Attributes, Option<Box<dyn Error + Send + Sync>>) {
        (std::mem::take(&mut self.attributes), self.source.take())
    }

    /// Walk the cause chain, nearest cause first.
    pub fn causes(&self) -> impl Iterator<Item = &(dyn Error + 'static)> {
        let first: Option<&(dyn Error + 'static)> =
            self.source.as_deref().map(|e| e as &(dyn Error + 'static));
        std::iter::successors(first, |&e| e.source())
    }
}

impl Zeroize for ExceptionRecord {
    fn zeroize(&mut self) {
        if let Some(message) = self.message.as_mut() {
            message.zeroize();
        }
        for (key, value) in &mut self.attributes {
            if let Cow::Owned(k) = key {
                k.zeroize();
            }
            value.zeroize();
        }
        self.attributes.clear();
    }
}

impl Drop for ExceptionRecord {
    fn drop(&mut self) {
        // Drop the cause first; it may hold its own copy of sensitive data.
        self.source = None;
        self.zeroize();
    }
}

impl fmt::Debug for ExceptionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionRecord")
            .field("kind", &self.kind)
            .field("type", &self.ty.name())
            .field("message", &self.message.as_ref().map(|_| "<REDACTED>"))
            .field("attributes", &self.attributes.len())
            .field("source", &self.source.as_ref().map(|_| "<PRESENT>"))
            .finish()
    }
}

impl fmt::Display for ExceptionRecord {
    /// `TypeName: message`, or just `TypeName` without a message.
    ///
    /// Internal rendering only; never written to a response.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message.as_deref() {
            Some(message) => write!(f, "{}: {}", self.ty.name(), message),
            None => f.write_str(self.ty.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn blank_message_detection() {
        assert!(ExceptionRecord::new(ExceptionKind::Other, None).is_blank_message());
        assert!(ExceptionRecord::other("").is_blank_message());
        assert!(ExceptionRecord::other(" \t\n").is_blank_message());
        assert!(!ExceptionRecord::other(" x ").is_blank_message());
    }

    #[test]
    fn kind_picks_default_type() {
        assert_eq!(ExceptionRecord::access_denied("x").exception_type(), &types::ACCESS_DENIED);
        assert_eq!(ExceptionRecord::other("x").exception_type(), &types::RUNTIME);
        assert_eq!(
            ExceptionRecord::illegal_state("x")
                .with_type(&types::ILLEGAL_ARGUMENT)
                .exception_type(),
            &types::ILLEGAL_ARGUMENT
        );
    }

    #[test]
    fn attributes_are_ordered_and_searchable() {
        let record = ExceptionRecord::other("x")
            .with_attribute("correlation_id", "abc")
            .with_attribute("attempt", 3i64);
        assert_eq!(record.attributes().len(), 2);
        assert_eq!(record.attribute("correlation_id").and_then(|v| v.as_text()), Some("abc"));
        assert_eq!(record.attribute("attempt"), Some(&AttributeValue::Integer(3)));
        assert!(record.attribute("missing").is_none());
    }

    #[test]
    fn debug_redacts_message() {
        let record = ExceptionRecord::access_denied("user jdoe lacks role ADMIN");
        let debug = format!("{:?}", record);
        assert!(!debug.contains("jdoe"));
        assert!(debug.contains("<REDACTED>"));
    }

    #[test]
    fn display_is_type_and_message() {
        assert_eq!(ExceptionRecord::not_found("gone").to_string(), "NotFound: gone");
        assert_eq!(ExceptionRecord::new(ExceptionKind::NotFound, None).to_string(), "NotFound");
    }

    #[test]
    fn cause_chain_is_walked() {
        let record = ExceptionRecord::other("outer")
            .with_source(io::Error::new(io::ErrorKind::TimedOut, "read timed out"));
        let causes: Vec<String> = record.causes().map(|c| c.to_string()).collect();
        assert_eq!(causes, ["read timed out"]);
    }

    #[derive(Debug)]
    struct StageFailed(io::Error);

    impl fmt::Display for StageFailed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("stage failed")
        }
    }

    impl Error for StageFailed {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn nested_causes_are_followed() {
        let record = ExceptionRecord::other("outer")
            .with_source(StageFailed(io::Error::other("disk full")));
        let causes: Vec<String> = record.causes().map(|c| c.to_string()).collect();
        assert_eq!(causes, ["stage failed", "disk full"]);
    }

    #[test]
    fn take_diagnostics_empties_record() {
        let mut record = ExceptionRecord::other("x")
            .with_attribute("correlation_id", "c-1")
            .with_source(io::Error::other("cause"));
        let (attributes, source) = record.take_diagnostics();
        assert_eq!(attributes.len(), 1);
        assert!(source.is_some());
        assert!(record.attributes().is_empty());
        assert!(record.source().is_none());
        assert_eq!(record.message(), Some("x"));
    }

    #[test]
    fn zeroize_clears_message_and_attributes() {
        let mut record = ExceptionRecord::other("secret").with_attribute("token", "hunter2");
        record.zeroize();
        assert_eq!(record.message(), Some(""));
        assert!(record.attributes().is_empty());
    }

    #[test]
    fn context_insert_replaces_existing_key() {
        let mut context = AdditionalContext::new();
        context.insert(ATTR_URL, "http://a");
        context.insert(ATTR_URL, "http://b");
        assert_eq!(context.len(), 1);
        assert_eq!(context.get(ATTR_URL), Some("http://b"));

        let attrs = context.into_attributes();
        assert_eq!(attrs[0].0, "url");
        assert_eq!(attrs[0].1, AttributeValue::Text("http://b".into()));
    }
}
