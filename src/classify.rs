//! Exception classification: which status, which message, which log level.
//!
//! # Precedence
//!
//! Categories are matched in this order; the first match wins:
//!
//! | # | Kind | Status | Caller sees | Log |
//! |---|------|--------|-------------|-----|
//! | 1 | access denied | 403 | fixed phrase | none |
//! | 2 | not found | 404 | original message | none |
//! | 3 | invalid request / user input / illegal argument | 400 | original message | none |
//! | 4 | illegal state | declared status lookup (5/6) | | |
//! | - | upstream, with response | upstream status | original message | none |
//! | - | upstream, no response | declared status lookup | | warn |
//! | 5 | other, declared status | declared | message or declared reason | by status |
//! | 6 | other, nothing declared | 500 | message or generic phrase | error |
//!
//! Declared statuses are logged at error for 5xx, not at all for 404, and
//! at warn otherwise.
//!
//! # Sanitization
//!
//! Authorization failures never echo their message: it tends to name the
//! principal and the missing grant. Every other category passes the
//! original message through, so callers that need stricter handling of
//! unclassified failures must declare a status with a fixed reason.

use crate::decorator::{MessageDecorator, PassthroughDecorator};
use crate::logging::LogLevel;
use crate::models::{ExceptionKind, ExceptionRecord};
use crate::registry::StatusRegistry;
use crate::status::HttpStatus;
use crate::upstream::UpstreamFailure;
use std::borrow::Cow;
use std::sync::Arc;

/// Fixed caller-visible message for authorization failures.
pub const ACCESS_DENIED_MESSAGE: &str = "Access is denied";

const NETWORK_FAILURE_SUMMARY: &str = "Upstream call failed without a response";

/// Undecorated outcome of classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    /// Status to send.
    pub status: HttpStatus,
    /// Candidate caller-visible message, before decoration.
    pub message: Cow<'a, str>,
    /// Server-side severity.
    pub log_level: LogLevel,
    /// Server-side log summary.
    pub summary: &'static str,
}

/// Decorated outcome of classification, ready to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Status to send.
    pub status: HttpStatus,
    /// Final, decorated message.
    pub message: String,
    /// Server-side severity.
    pub log_level: LogLevel,
}

/// Maps exception records to statuses and messages.
///
/// Holds only read-only state and can be shared across threads.
#[derive(Clone)]
pub struct Classifier {
    registry: StatusRegistry,
    decorator: Arc<dyn MessageDecorator>,
}

impl Classifier {
    /// Classifier with a pass-through decorator.
    pub fn new(registry: StatusRegistry) -> Self {
        Self::with_decorator(registry, Arc::new(PassthroughDecorator))
    }

    /// Classifier whose messages pass through `decorator`.
    pub fn with_decorator(registry: StatusRegistry, decorator: Arc<dyn MessageDecorator>) -> Self {
        Self {
            registry,
            decorator,
        }
    }

    /// Declared statuses consulted by rules 6 and 7.
    #[inline]
    pub fn registry(&self) -> &StatusRegistry {
        &self.registry
    }

    /// Decorator applied by [`Classifier::classify`].
    #[inline]
    pub fn decorator(&self) -> &dyn MessageDecorator {
        self.decorator.as_ref()
    }

    /// Classify and decorate. Pure apart from the decorator.
    pub fn classify(&self, record: &ExceptionRecord) -> Classification {
        let resolution = self.resolve(record);
        Classification {
            status: resolution.status,
            message: self.decorator.decorate(record, &resolution.message),
            log_level: resolution.log_level,
        }
    }

    /// Pick status, candidate message and log level.
    pub fn resolve<'a>(&'a self, record: &'a ExceptionRecord) -> Resolution<'a> {
        match record.kind() {
            ExceptionKind::AccessDenied => Resolution {
                status: HttpStatus::FORBIDDEN,
                message: Cow::Borrowed(ACCESS_DENIED_MESSAGE),
                log_level: LogLevel::None,
                summary: ACCESS_DENIED_MESSAGE,
            },
            ExceptionKind::NotFound => verbatim(HttpStatus::NOT_FOUND, record),
            ExceptionKind::InvalidRequest
            | ExceptionKind::UserInput
            | ExceptionKind::IllegalArgument => verbatim(HttpStatus::BAD_REQUEST, record),
            ExceptionKind::IllegalState | ExceptionKind::Other => self.declared(record),
            ExceptionKind::Upstream(failure) => self.upstream(failure, record),
        }
    }

    fn upstream<'a>(
        &'a self,
        failure: &UpstreamFailure,
        record: &'a ExceptionRecord,
    ) -> Resolution<'a> {
        match failure.response() {
            Some(response) => {
                let status = HttpStatus::checked_new(response.status())
                    .unwrap_or(HttpStatus::BAD_GATEWAY);
                verbatim(status, record)
            }
            None => Resolution {
                log_level: LogLevel::Warn,
                summary: NETWORK_FAILURE_SUMMARY,
                ..self.declared(record)
            },
        }
    }

    /// Declared-status lookup along the type's ancestry, 500 if none.
    fn declared<'a>(&'a self, record: &'a ExceptionRecord) -> Resolution<'a> {
        match self.registry.find(record.exception_type()) {
            Some(declared) => {
                let status = declared.status();
                let log_level = if status.is_server_error() {
                    LogLevel::Error
                } else if status == HttpStatus::NOT_FOUND {
                    LogLevel::None
                } else {
                    LogLevel::Warn
                };
                let fallback = if declared.reason().trim().is_empty() {
                    status.reason_phrase()
                } else {
                    declared.reason()
                };
                Resolution {
                    status,
                    message: Cow::Borrowed(non_blank_message(record).unwrap_or(fallback)),
                    log_level,
                    summary: status.reason_phrase(),
                }
            }
            None => {
                let status = HttpStatus::INTERNAL_SERVER_ERROR;
                Resolution {
                    status,
                    message: Cow::Borrowed(
                        non_blank_message(record).unwrap_or(status.reason_phrase()),
                    ),
                    log_level: LogLevel::Error,
                    summary: status.reason_phrase(),
                }
            }
        }
    }
}

/// Pass a present message through unchanged; fall back to the reason
/// phrase only when there is no message at all.
fn verbatim(status: HttpStatus, record: &ExceptionRecord) -> Resolution<'_> {
    Resolution {
        status,
        message: Cow::Borrowed(record.message().unwrap_or(status.reason_phrase())),
        log_level: LogLevel::None,
        summary: status.reason_phrase(),
    }
}

fn non_blank_message(record: &ExceptionRecord) -> Option<&str> {
    record.message().filter(|m| !m.trim().is_empty())
}
