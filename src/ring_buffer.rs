// src/ring_buffer.rs
//! Ring buffer sink for bounded forensic logging.
//!
//! Keeps the most recent handled exceptions in memory with FIFO eviction, so
//! a burst of failing requests cannot grow the log without bound.
//!
//! # Design Principles
//!
//! - **Bounded memory**: fixed entry count and per-entry byte cap
//! - **FIFO eviction**: oldest entries are dropped first
//! - **RwLock-based**: concurrent readers, exclusive writers
//!
//! # Example
//!
//! ```rust
//! use palisade_http_errors::ring_buffer::RingBufferLogger;
//! use palisade_http_errors::{ExceptionRecord, HandlerLog, HttpStatus, LogLevel, LogSink};
//!
//! let logger = RingBufferLogger::new(1000, 2048);
//!
//! let record = ExceptionRecord::other("disk full");
//! logger.log(&HandlerLog::new(LogLevel::Error, HttpStatus::INTERNAL_SERVER_ERROR, "Internal Server Error", &record));
//!
//! let recent = logger.get_recent(10);
//! assert_eq!(recent[0].message.as_ref(), "disk full");
//! ```

use crate::logging::{self, HandlerLog, LogLevel, LogSink};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

const ENTRY_TRUNCATION_INDICATOR: &str = "...[TRUNC]";

/// One captured log entry with bounded size.
///
/// Uses `Arc<str>` so `get_recent` clones are refcount increments.
#[derive(Clone, Debug)]
pub struct ForensicEntry {
    /// Unix timestamp of capture
    pub timestamp: u64,
    /// Level chosen by classification
    pub level: LogLevel,
    /// Status sent to the client
    pub status: u16,
    /// Name of the logged exception type
    pub type_name: &'static str,
    /// Short summary, usually the status reason phrase
    pub summary: Arc<str>,
    /// Original exception message (empty when the exception had none)
    pub message: Arc<str>,
    /// Diagnostic attributes, rendered as text
    pub attributes: Arc<[(Arc<str>, Arc<str>)]>,
    /// Approximate size in bytes
    pub size_bytes: usize,
}

/// Log sink with bounded memory usage.
///
/// Clones share the same buffer.
#[derive(Clone)]
pub struct RingBufferLogger {
    entries: Arc<RwLock<VecDeque<ForensicEntry>>>,
    max_entries: usize,
    max_entry_bytes: usize,
    eviction_count: Arc<AtomicU64>,
}

impl RingBufferLogger {
    /// Create a new ring buffer logger.
    ///
    /// * `max_entries` - entries kept before FIFO eviction (at least 1)
    /// * `max_entry_bytes` - byte cap for the variable fields of one entry
    pub fn new(max_entries: usize, max_entry_bytes: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(max_entries))),
            max_entries,
            max_entry_bytes,
            eviction_count: Arc::new(AtomicU64::new(0)),
        }
    }

    fn create_entry(&self, log: &HandlerLog<'_>) -> ForensicEntry {
        let mut remaining = self.max_entry_bytes;
        let mut take = |text: &str, cap: usize| -> Arc<str> {
            let kept = logging::truncate_to(text, remaining.min(cap), ENTRY_TRUNCATION_INDICATOR);
            remaining -= kept.len();
            Arc::from(kept.as_ref())
        };

        let summary = take(log.summary(), 128);
        let message = take(log.message().unwrap_or(""), 512);

        let mut attributes: SmallVec<[(Arc<str>, Arc<str>); 4]> = SmallVec::new();
        for (key, value) in log.attributes() {
            let key = take(key.as_ref(), 64);
            if key.is_empty() {
                break;
            }
            let value = take(value.to_string().as_str(), 256);
            attributes.push((key, value));
        }

        ForensicEntry {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
            level: log.level(),
            status: log.status().as_u16(),
            type_name: log.type_name(),
            summary,
            message,
            attributes: attributes.into_vec().into(),
            size_bytes: self.max_entry_bytes - remaining,
        }
    }

    /// Get the N most recent entries, newest first.
    pub fn get_recent(&self, count: usize) -> Vec<ForensicEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.iter().rev().take(count).cloned().collect()
    }

    /// Get all entries, newest first.
    pub fn get_all(&self) -> Vec<ForensicEntry> {
        self.get_recent(usize::MAX)
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True when nothing has been logged (or everything was evicted).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of evictions since creation.
    #[inline]
    pub fn eviction_count(&self) -> u64 {
        self.eviction_count.load(Ordering::Relaxed)
    }
}

impl LogSink for RingBufferLogger {
    fn log(&self, entry: &HandlerLog<'_>) {
        let entry = self.create_entry(entry);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.max_entries {
            entries.pop_front();
            self.eviction_count.fetch_add(1, Ordering::Relaxed);
        }
        entries.push_back(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExceptionRecord, HttpStatus};

    fn log_message(logger: &RingBufferLogger, message: String) {
        let record = ExceptionRecord::other(message);
        logger.log(&HandlerLog::new(
            LogLevel::Error,
            HttpStatus::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            &record,
        ));
    }

    #[test]
    fn ring_buffer_evicts_oldest() {
        let logger = RingBufferLogger::new(3, 1024);
        for i in 0..5 {
            log_message(&logger, format!("error {}", i));
        }

        assert_eq!(logger.len(), 3);
        assert_eq!(logger.eviction_count(), 2);

        let entries = logger.get_all();
        assert_eq!(entries[0].message.as_ref(), "error 4");
        assert_eq!(entries[2].message.as_ref(), "error 2");
    }

    #[test]
    fn ring_buffer_respects_size_limit() {
        let logger = RingBufferLogger::new(100, 128);
        log_message(&logger, "A".repeat(10_000));

        let entry = &logger.get_recent(1)[0];
        assert!(entry.size_bytes <= 128);
        assert!(entry.message.contains("TRUNC"));
    }

    #[test]
    fn entry_keeps_status_type_and_attributes() {
        let logger = RingBufferLogger::new(4, 1024);
        let record = ExceptionRecord::illegal_state("locked").with_attribute("url", "http://orca");
        logger.log(&HandlerLog::new(LogLevel::Warn, HttpStatus::CONFLICT, "Conflict", &record));

        let entry = &logger.get_recent(1)[0];
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.status, 409);
        assert_eq!(entry.type_name, "IllegalState");
        assert_eq!(entry.attributes.len(), 1);
        assert_eq!(entry.attributes[0].1.as_ref(), "http://orca");
    }

    #[test]
    fn recent_is_newest_first() {
        let logger = RingBufferLogger::new(10, 1024);
        let record = ExceptionRecord::other("x");
        for level in [LogLevel::Warn, LogLevel::Error, LogLevel::Warn] {
            logger.log(&HandlerLog::new(level, HttpStatus::INTERNAL_SERVER_ERROR, "s", &record));
        }
        let levels: Vec<_> = logger.get_recent(2).iter().map(|e| e.level).collect();
        assert_eq!(levels, [LogLevel::Warn, LogLevel::Error]);
    }

    #[test]
    fn clone_shares_state() {
        let logger1 = RingBufferLogger::new(100, 1024);
        let logger2 = logger1.clone();
        log_message(&logger1, "shared".into());
        assert_eq!(logger2.len(), 1);
        assert!(!logger2.is_empty());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let logger = RingBufferLogger::new(0, 64);
        log_message(&logger, "a".into());
        log_message(&logger, "b".into());
        assert_eq!(logger.len(), 1);
        assert_eq!(logger.get_recent(1)[0].message.as_ref(), "b");
    }

    #[test]
    fn attributes_stop_when_budget_is_spent() {
        let logger = RingBufferLogger::new(4, 40);
        let record = ExceptionRecord::other("0123456789")
            .with_attribute("url", "http://a-long-upstream-host/with/a/path")
            .with_attribute("body", "{}");
        logger.log(&HandlerLog::new(LogLevel::Warn, HttpStatus::BAD_GATEWAY, "Bad Gateway", &record));

        let entry = &logger.get_recent(1)[0];
        assert!(entry.size_bytes <= 40);
        assert!(entry.attributes.len() < 2);
    }

    #[test]
    fn multibyte_message_truncates_on_boundary() {
        let logger = RingBufferLogger::new(4, 64);
        log_message(&logger, "🔥".repeat(100));
        let entry = &logger.get_recent(1)[0];
        assert!(entry.message.len() <= 64);
        assert!(entry.message.ends_with("...[TRUNC]"));
    }

    #[test]
    fn concurrent_logging() {
        use std::thread;

        let logger = RingBufferLogger::new(128, 256);
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let logger = logger.clone();
                thread::spawn(move || {
                    for j in 0..100 {
                        log_message(&logger, format!("t{}-{}", i, j));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("thread panicked");
        }

        assert_eq!(logger.len(), 128);
        assert_eq!(logger.eviction_count(), 800 - 128);
    }
}
