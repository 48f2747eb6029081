//! Log event structure

use super::level::Level;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

/// Longest thread name carried by an event, in bytes
pub const THREAD_NAME_MAX: usize = 15;

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<u64>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

/// Small process-unique number for the calling thread, assigned on first use
pub fn current_thread_id() -> u64 {
    THREAD_ID_CACHE.with(|cache| {
        *cache
            .borrow_mut()
            .get_or_insert_with(|| NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed))
    })
}

/// Name of the calling thread, truncated to [`THREAD_NAME_MAX`] bytes
pub fn current_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| {
                std::thread::current()
                    .name()
                    .map(|name| truncate_to_boundary(name, THREAD_NAME_MAX).to_string())
            })
            .clone()
    })
}

fn truncate_to_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// One log record in flight between a producer and a sink's worker thread.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub thread_id: u64,
    pub thread_name: Option<String>,
    pub logger_name: String,
    pub message: String,
}

impl Event {
    /// Stamp a new event with the current time and calling thread.
    pub fn new(level: Level, logger_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            thread_id: current_thread_id(),
            thread_name: current_thread_name(),
            logger_name: logger_name.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Bytes this event charges against a sink's byte budget
    #[inline]
    pub fn message_size(&self) -> usize {
        self.message.len()
    }
}
