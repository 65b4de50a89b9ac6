//! Structured server-side log entries for handled exceptions.
//!
//! # Critical Security Properties
//!
//! - `HandlerLog` borrows from the `ExceptionRecord` with an explicit lifetime
//! - It CANNOT outlive the record, so sinks must consume it immediately
//! - Field accessors never allocate
//!
//! The full message and cause chain go to the log; the response only ever
//! carries what classification decided.
//!
//! # Sinks
//!
//! - [`TracingSink`] forwards entries to `tracing` (default)
//! - [`RingBufferLogger`](crate::ring_buffer::RingBufferLogger) keeps a
//!   bounded in-memory window for forensics
//! - [`NullSink`] drops everything

use crate::models::{AttributeValue, ExceptionRecord};
use crate::status::HttpStatus;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;

/// Maximum length for any individual field in formatted output (DoS prevention)
const MAX_FIELD_OUTPUT_LEN: usize = 1024;

/// Truncation indicator appended to truncated strings
const TRUNCATION_INDICATOR: &str = "...[TRUNCATED]";

/// Server-side severity chosen by classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogLevel {
    /// Not logged here (e.g. audited elsewhere, or an expected 404).
    None,
    /// Expected failure worth a look.
    Warn,
    /// Unexpected failure.
    Error,
}

impl LogLevel {
    /// Upper-case level name.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured log entry borrowing from an `ExceptionRecord`.
///
/// # Example
///
/// ```rust
/// # use palisade_http_errors::{ExceptionRecord, HandlerLog, HttpStatus, LogLevel};
/// let record = ExceptionRecord::other("disk full");
/// let log = HandlerLog::new(LogLevel::Error, HttpStatus::INTERNAL_SERVER_ERROR, "Internal Server Error", &record);
/// let mut line = String::new();
/// log.write_to(&mut line).unwrap();
/// assert!(line.contains("disk full"));
/// ```
#[derive(Debug)]
pub struct HandlerLog<'a> {
    level: LogLevel,
    status: HttpStatus,
    summary: &'a str,
    record: &'a ExceptionRecord,
}

impl<'a> HandlerLog<'a> {
    /// Entry for `record`, answered with `status`.
    pub fn new(
        level: LogLevel,
        status: HttpStatus,
        summary: &'a str,
        record: &'a ExceptionRecord,
    ) -> Self {
        Self {
            level,
            status,
            summary,
            record,
        }
    }

    /// Severity of this entry.
    #[inline]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Status sent to the client.
    #[inline]
    pub const fn status(&self) -> HttpStatus {
        self.status
    }

    /// Short human summary, e.g. the status reason phrase.
    #[inline]
    pub const fn summary(&self) -> &str {
        self.summary
    }

    /// Name of the exception type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.record.exception_type().name()
    }

    /// Original exception message, never the decorated response text.
    #[inline]
    pub fn message(&self) -> Option<&'a str> {
        self.record.message()
    }

    /// Diagnostic attributes of the record.
    #[inline]
    pub fn attributes(&self) -> &'a [(Cow<'static, str>, AttributeValue)] {
        self.record.attributes()
    }

    /// Cause chain, nearest first.
    pub fn causes(&self) -> impl Iterator<Item = &'a (dyn Error + 'static)> + use<'a> {
        self.record.causes()
    }

    /// The logged record.
    #[inline]
    pub fn record(&self) -> &'a ExceptionRecord {
        self.record
    }

    /// Write the entry without intermediate allocations (apart from
    /// truncation of oversized fields).
    pub fn write_to(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(
            f,
            "[{}] status={} type={} summary='{}'",
            self.level,
            self.status.as_u16(),
            self.type_name(),
            truncate_with_indicator(self.summary)
        )?;

        if let Some(message) = self.message() {
            write!(f, " message='{}'", truncate_with_indicator(message))?;
        }

        for (key, value) in self.attributes() {
            let value = value.to_string();
            write!(f, " {}='{}'", key, truncate_with_indicator(&value))?;
        }

        for cause in self.causes() {
            let cause = cause.to_string();
            write!(f, " caused_by='{}'", truncate_with_indicator(&cause))?;
        }

        Ok(())
    }

    /// Format for human-readable logs in trusted debug contexts.
    ///
    /// WARNING: This materializes the full message into a String.
    /// Only available with BOTH the `trusted_debug` feature flag AND debug
    /// assertions enabled.
    #[cfg(all(feature = "trusted_debug", debug_assertions))]
    pub fn format_for_trusted_debug(&self) -> String {
        let mut output = String::new();
        let _ = self.write_to(&mut output);
        output
    }
}

/// Destination for handler log entries.
///
/// Shared by every in-flight request; implementations must be thread safe.
pub trait LogSink: Send + Sync {
    /// Consume an entry. Called only for levels other than `None`.
    fn log(&self, entry: &HandlerLog<'_>);
}

/// Forwards entries to the `tracing` ecosystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, entry: &HandlerLog<'_>) {
        let message = entry.message().map(truncate_with_indicator);
        let causes = {
            let mut joined = String::new();
            for (i, cause) in entry.causes().enumerate() {
                if i > 0 {
                    joined.push_str(": ");
                }
                joined.push_str(&cause.to_string());
            }
            joined
        };

        match entry.level() {
            LogLevel::Error => tracing::error!(
                status = entry.status().as_u16(),
                exception_type = entry.type_name(),
                exception_message = message.as_deref(),
                exception_causes = %causes,
                "{}",
                entry.summary()
            ),
            LogLevel::Warn => tracing::warn!(
                status = entry.status().as_u16(),
                exception_type = entry.type_name(),
                exception_message = message.as_deref(),
                exception_causes = %causes,
                "{}",
                entry.summary()
            ),
            LogLevel::None => {}
        }
    }
}

/// Discards every entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _entry: &HandlerLog<'_>) {}
}

/// Hand an entry to `sink` unless its level is `None`.
#[inline]
pub(crate) fn dispatch(sink: &dyn LogSink, entry: &HandlerLog<'_>) {
    if entry.level() != LogLevel::None {
        sink.log(entry);
    }
}

/// Truncate a string for display to prevent DoS via extremely long error messages.
///
/// Returns a Cow<str> to avoid allocation when no truncation is needed.
pub(crate) fn truncate_with_indicator(s: &str) -> Cow<'_, str> {
    truncate_to(s, MAX_FIELD_OUTPUT_LEN, TRUNCATION_INDICATOR)
}

/// Cut `s` to at most `max_bytes`, ending in `indicator` when cut.
///
/// The cut lands on a UTF-8 boundary. `indicator` must be ASCII.
pub(crate) fn truncate_to<'a>(s: &'a str, max_bytes: usize, indicator: &'static str) -> Cow<'a, str> {
    if s.len() <= max_bytes {
        return Cow::Borrowed(s);
    }
    if max_bytes <= indicator.len() {
        return Cow::Borrowed(&indicator[..max_bytes]);
    }

    let mut idx = max_bytes - indicator.len();
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    if idx == 0 {
        return Cow::Borrowed(indicator);
    }

    let mut result = String::with_capacity(idx + indicator.len());
    result.push_str(&s[..idx]);
    result.push_str(indicator);
    Cow::Owned(result)
}
