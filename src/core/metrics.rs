//! Sink metrics for observability
//!
//! Counters describing one sink's queue and device activity. Overflow is
//! never reported to producers, so `dropped_count` is the only trace of it.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single sink
///
/// # Example
///
/// ```
/// use rust_group_logger::SinkMetrics;
///
/// let metrics = SinkMetrics::new();
///
/// metrics.record_enqueued();
/// metrics.record_dropped();
///
/// assert_eq!(metrics.enqueued_count(), 1);
/// assert_eq!(metrics.dropped_count(), 1);
/// ```
#[derive(Debug)]
pub struct SinkMetrics {
    /// Events accepted into the queue
    enqueued: AtomicU64,

    /// Events rejected or evicted because a queue cap was hit
    dropped: AtomicU64,

    /// Events formatted into the staging buffer by the worker
    written: AtomicU64,

    /// Staging buffer hand-offs to the backend
    device_writes: AtomicU64,

    /// Explicit device-level flushes
    device_flushes: AtomicU64,

    /// Backend write or flush failures
    write_errors: AtomicU64,
}

impl SinkMetrics {
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            written: AtomicU64::new(0),
            device_writes: AtomicU64::new(0),
            device_flushes: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn enqueued_count(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn written_count(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn device_writes(&self) -> u64 {
        self.device_writes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn device_flushes(&self) -> u64 {
        self.device_flushes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    /// Returns the previous value
    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the previous value
    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_written(&self) -> u64 {
        self.written.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_device_write(&self) -> u64 {
        self.device_writes.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_device_flush(&self) -> u64 {
        self.device_flushes.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_error(&self) -> u64 {
        self.write_errors.fetch_add(1, Ordering::Relaxed)
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been offered to the sink.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.enqueued_count() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }
}

impl Default for SinkMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SinkMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            enqueued: AtomicU64::new(self.enqueued_count()),
            dropped: AtomicU64::new(self.dropped_count()),
            written: AtomicU64::new(self.written_count()),
            device_writes: AtomicU64::new(self.device_writes()),
            device_flushes: AtomicU64::new(self.device_flushes()),
            write_errors: AtomicU64::new(self.write_errors()),
        }
    }
}
