//! Per-request diagnostic scope.
//!
//! The handler stores the fully-contextualized exception here before the
//! response is written, so a later rendering stage (error pages, access
//! logs) can read it even if the client is already gone. The scope is an
//! explicit value owned by the dispatcher and passed by reference; nothing
//! is kept in thread-local or global state.
//!
//! Recording is best effort: a scope that refuses the record is logged and
//! otherwise ignored.

use crate::logging::{self, HandlerLog, LogLevel, LogSink};
use crate::models::ExceptionRecord;
use crate::status::HttpStatus;
use std::fmt;

/// Write side of a request's diagnostic storage.
pub trait DiagnosticScope {
    /// Store `record`. On refusal the record is handed back.
    fn store(&mut self, record: ExceptionRecord) -> Result<(), RejectedRecord>;
}

/// Why a scope refused a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeRejection {
    /// The request already completed and its scope was torn down.
    Finalized,
    /// An exception was already recorded for this request.
    AlreadyRecorded,
}

impl fmt::Display for ScopeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finalized => f.write_str("diagnostic scope already finalized"),
            Self::AlreadyRecorded => f.write_str("diagnostic scope already holds an exception"),
        }
    }
}

impl std::error::Error for ScopeRejection {}

/// A refused record together with the reason.
#[derive(Debug)]
pub struct RejectedRecord {
    /// Why the scope refused.
    pub reason: ScopeRejection,
    /// The record, returned to the caller.
    pub record: ExceptionRecord,
}

/// Diagnostic scope bound to one request.
///
/// ```rust
/// use palisade_http_errors::{DiagnosticScope, ExceptionRecord, RequestScope};
///
/// let mut scope = RequestScope::new("req-1");
/// scope.store(ExceptionRecord::not_found("gone")).unwrap();
/// assert_eq!(scope.recorded().and_then(|r| r.message()), Some("gone"));
/// ```
#[derive(Debug)]
pub struct RequestScope {
    request_id: String,
    recorded: Option<ExceptionRecord>,
    finalized: bool,
}

impl RequestScope {
    /// Empty scope for one request.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            recorded: None,
            finalized: false,
        }
    }

    /// Identifier of the owning request.
    #[inline]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Exception stored for this request, read by the rendering stage.
    #[inline]
    pub fn recorded(&self) -> Option<&ExceptionRecord> {
        self.recorded.as_ref()
    }

    /// True after [`RequestScope::finalize`].
    #[inline]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Tear the scope down once the response is complete. The stored
    /// record is dropped (and zeroized) here.
    pub fn finalize(&mut self) {
        self.finalized = true;
        self.recorded = None;
    }
}

impl DiagnosticScope for RequestScope {
    fn store(&mut self, record: ExceptionRecord) -> Result<(), RejectedRecord> {
        let reason = if self.finalized {
            ScopeRejection::Finalized
        } else if self.recorded.is_some() {
            ScopeRejection::AlreadyRecorded
        } else {
            self.recorded = Some(record);
            return Ok(());
        };
        Err(RejectedRecord { reason, record })
    }
}

/// Store `record` in `scope`, logging and swallowing a refusal.
pub fn record(scope: &mut dyn DiagnosticScope, record: ExceptionRecord, sink: &dyn LogSink) {
    if let Err(rejected) = scope.store(record) {
        let summary = match rejected.reason {
            ScopeRejection::Finalized => "Unable to record exception: scope finalized",
            ScopeRejection::AlreadyRecorded => "Unable to record exception: scope already populated",
        };
        logging::dispatch(
            sink,
            &HandlerLog::new(
                LogLevel::Warn,
                HttpStatus::INTERNAL_SERVER_ERROR,
                summary,
                &rejected.record,
            ),
        );
    }
}
