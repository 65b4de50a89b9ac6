//! Final rewrite of the caller-visible message.
//!
//! Classification picks a candidate message; a decorator may append to it
//! before it is written (typically a correlation id the caller can quote
//! when reporting the failure). Decorators are shared by every in-flight
//! request and must not fail.

use crate::models::ExceptionRecord;
use std::borrow::Cow;

/// Attribute key read by [`CorrelationIdDecorator`] unless configured otherwise.
pub const DEFAULT_CORRELATION_KEY: &str = "correlation_id";

/// Rewrites the message sent to the caller.
pub trait MessageDecorator: Send + Sync {
    /// Final message for `record`, given the classified `message`.
    fn decorate(&self, record: &ExceptionRecord, message: &str) -> String;
}

/// Leaves the message untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughDecorator;

impl MessageDecorator for PassthroughDecorator {
    fn decorate(&self, _record: &ExceptionRecord, message: &str) -> String {
        message.to_owned()
    }
}

/// Appends ` (correlation id: <id>)` when the record carries one.
///
/// ```rust
/// use palisade_http_errors::{CorrelationIdDecorator, ExceptionRecord, MessageDecorator};
///
/// let record = ExceptionRecord::not_found("no such pipeline")
///     .with_attribute("correlation_id", "req-7f3a");
/// let message = CorrelationIdDecorator::default().decorate(&record, "no such pipeline");
/// assert_eq!(message, "no such pipeline (correlation id: req-7f3a)");
/// ```
#[derive(Debug, Clone)]
pub struct CorrelationIdDecorator {
    key: Cow<'static, str>,
}

impl CorrelationIdDecorator {
    /// Read the id from attribute `key` instead of `correlation_id`.
    pub fn with_key(key: impl Into<Cow<'static, str>>) -> Self {
        Self { key: key.into() }
    }
}

impl Default for CorrelationIdDecorator {
    fn default() -> Self {
        Self::with_key(DEFAULT_CORRELATION_KEY)
    }
}

impl MessageDecorator for CorrelationIdDecorator {
    fn decorate(&self, record: &ExceptionRecord, message: &str) -> String {
        match record.attribute(&self.key) {
            Some(id) => format!("{} (correlation id: {})", message, id),
            None => message.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_is_identity() {
        let record = ExceptionRecord::other("x");
        assert_eq!(PassthroughDecorator.decorate(&record, "Access is denied"), "Access is denied");
    }

    #[test]
    fn correlation_id_absent_leaves_message() {
        let record = ExceptionRecord::other("x");
        assert_eq!(CorrelationIdDecorator::default().decorate(&record, "m"), "m");
    }

    #[test]
    fn custom_key() {
        let record = ExceptionRecord::other("x").with_attribute("x-request-id", 42i64);
        let decorator = CorrelationIdDecorator::with_key("x-request-id");
        assert_eq!(decorator.decorate(&record, "m"), "m (correlation id: 42)");
    }
}
