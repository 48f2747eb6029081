//! Asynchronous sink: bounded event queue plus a dedicated worker thread
//!
//! Producers hand events to [`Sink::enqueue`] from any thread. The call only
//! touches the queue and a couple of atomics: it never formats and never does
//! I/O. One worker thread per sink drains the queue in FIFO order, renders
//! every event into a staging buffer through the sink's [`Formatter`], and
//! hands the buffer to the [`Backend`] when it is nearly full, when the queue
//! runs dry, or when the latency interval has passed.
//!
//! The queue enforces two caps at once: an event count and a byte budget over
//! the queued messages. Overflow is resolved by the [`OverflowPolicy`] and is
//! only visible through [`SinkMetrics::dropped_count`] and the optional
//! overflow callback.
//!
//! Dropping the sink drains everything still queued before the worker exits.

use super::backend::Backend;
use super::error::{LoggerError, Result};
use super::event::Event;
use super::formatter::{Formatter, TextFormatter};
use super::metrics::SinkMetrics;
use super::overflow_policy::{OverflowCallback, OverflowPolicy};
use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default maximum number of queued events
pub const DEFAULT_CAPACITY: usize = 1024;

/// Default byte budget over queued messages (2 MiB)
pub const DEFAULT_MAX_BYTES: usize = 2 * 1024 * 1024;

/// Default staging buffer size (64 KiB)
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Default longest delay between two device writes
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(1000);

/// Upper bound on how long the worker sleeps without checking for shutdown
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// State shared between the sink handle and its worker
struct Shared {
    name: String,
    queued_bytes: AtomicUsize,
    need_flush: AtomicBool,
    finalize: AtomicBool,
    metrics: SinkMetrics,
}

/// Named asynchronous output endpoint.
///
/// Shared between groups and loggers as `Arc<Sink>`; the worker thread is
/// joined when the last holder drops it.
pub struct Sink {
    shared: Arc<Shared>,
    capacity: usize,
    max_bytes: usize,
    overflow_policy: OverflowPolicy,
    on_overflow: Option<OverflowCallback>,
    sender: Sender<Event>,
    evictor: Receiver<Event>,
    wakeup: Sender<()>,
    backend_name: String,
    worker: Option<thread::JoinHandle<()>>,
}

impl Sink {
    /// Start building a sink that writes to `backend`
    ///
    /// # Example
    ///
    /// ```
    /// use rust_group_logger::prelude::*;
    /// use std::time::Duration;
    ///
    /// let sink = Sink::builder("capture", MemoryBackend::new())
    ///     .capacity(256)
    ///     .latency(Duration::from_millis(50))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(sink.name(), "capture");
    /// ```
    #[must_use]
    pub fn builder(name: impl Into<String>, backend: impl Backend + 'static) -> SinkBuilder {
        SinkBuilder::new(name, backend)
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Name of the device this sink writes to
    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow_policy
    }

    pub fn metrics(&self) -> &SinkMetrics {
        &self.shared.metrics
    }

    /// Events currently waiting for the worker
    pub fn queued_len(&self) -> usize {
        self.sender.len()
    }

    /// Message bytes currently charged against the byte budget
    pub fn queued_bytes(&self) -> usize {
        self.shared.queued_bytes.load(Ordering::Acquire)
    }

    /// Offer an event to the queue.
    ///
    /// Never blocks and never fails visibly: an event that does not fit is
    /// counted as dropped according to the overflow policy.
    pub fn enqueue(&self, event: Event) {
        let size = event.message_size();

        if !self.reserve(size) {
            let admitted = match self.overflow_policy {
                OverflowPolicy::DropNewest => false,
                OverflowPolicy::DropOldest => self.evict_until_reserved(size),
            };
            if !admitted {
                self.reject();
                return;
            }
        }

        match self.sender.try_send(event) {
            Ok(()) => {
                self.shared.metrics.record_enqueued();
            }
            Err(TrySendError::Full(event)) => match self.overflow_policy {
                OverflowPolicy::DropNewest => {
                    self.release(size);
                    self.reject();
                }
                OverflowPolicy::DropOldest => {
                    self.evict_one();
                    match self.sender.try_send(event) {
                        Ok(()) => {
                            self.shared.metrics.record_enqueued();
                        }
                        Err(_) => {
                            self.release(size);
                            self.reject();
                        }
                    }
                }
            },
            Err(TrySendError::Disconnected(_)) => {
                self.release(size);
                self.reject();
            }
        }
    }

    /// Ask the worker for one device-level flush.
    ///
    /// Returns immediately; concurrent requests collapse into one flush.
    pub fn flush(&self) {
        self.shared.need_flush.store(true, Ordering::Release);
        let _ = self.wakeup.try_send(());
    }

    /// Charge `size` bytes against the budget if it fits
    fn reserve(&self, size: usize) -> bool {
        let queued = &self.shared.queued_bytes;
        let mut current = queued.load(Ordering::Acquire);
        loop {
            match current.checked_add(size) {
                Some(total) if total <= self.max_bytes => {}
                _ => return false,
            }
            match queued.compare_exchange_weak(
                current,
                current + size,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    fn release(&self, size: usize) {
        self.shared.queued_bytes.fetch_sub(size, Ordering::AcqRel);
    }

    /// Remove the oldest queued event, if any
    fn evict_one(&self) -> bool {
        match self.evictor.try_recv() {
            Ok(oldest) => {
                self.release(oldest.message_size());
                self.count_drop();
                true
            }
            Err(_) => false,
        }
    }

    fn evict_until_reserved(&self, size: usize) -> bool {
        if size > self.max_bytes {
            return false;
        }
        loop {
            if self.reserve(size) {
                return true;
            }
            if !self.evict_one() {
                return self.reserve(size);
            }
        }
    }

    fn reject(&self) {
        self.count_drop();
    }

    fn count_drop(&self) {
        let previous = self.shared.metrics.record_dropped();

        // Alert on first drop and periodically thereafter
        if previous == 0 || (previous + 1) % 1000 == 0 {
            if let Some(ref callback) = self.on_overflow {
                callback(&self.shared.name, previous + 1);
            }
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("name", &self.shared.name)
            .field("backend", &self.backend_name)
            .field("capacity", &self.capacity)
            .field("max_bytes", &self.max_bytes)
            .field("overflow_policy", &self.overflow_policy)
            .field("queued", &self.queued_len())
            .finish()
    }
}

impl Drop for Sink {
    fn drop(&mut self) {
        self.shared.finalize.store(true, Ordering::Release);
        self.flush();

        if let Some(handle) = self.worker.take() {
            if let Err(e) = handle.join() {
                eprintln!(
                    "[LOGGER ERROR] Worker thread of sink '{}' panicked during shutdown: {:?}",
                    self.shared.name, e
                );
            }
        }

        let dropped = self.shared.metrics.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Sink '{}' shutting down with {} dropped events (drop rate: {:.2}%)",
                self.shared.name,
                dropped,
                self.shared.metrics.drop_rate()
            );
        }
    }
}

/// Consumer side of a sink, running on its own thread
struct Worker {
    shared: Arc<Shared>,
    events: Receiver<Event>,
    wakeup: Receiver<()>,
    backend: Box<dyn Backend>,
    formatter: Box<dyn Formatter>,
    staging: Vec<u8>,
    buffer_size: usize,
    latency: Duration,
    next_flush: Instant,
}

impl Worker {
    fn run(mut self) {
        loop {
            select! {
                recv(self.events) -> event => {
                    if let Ok(event) = event {
                        self.drain(Some(event));
                    }
                }
                recv(self.wakeup) -> _ => self.drain(None),
                default(POLL_INTERVAL) => {}
            }

            if self.shared.finalize.load(Ordering::Acquire) {
                self.drain(None);
                if self.events.is_empty() {
                    self.flush_device();
                    return;
                }
            }
        }
    }

    /// Format queued events into the staging buffer, writing it out as needed.
    ///
    /// The buffer is written out before the next event could overflow it, so
    /// it only grows past `buffer_size` to hold a single oversized line.
    fn drain(&mut self, first: Option<Event>) {
        let reserve = self.formatter.line_overhead();
        let mut next = first.or_else(|| self.events.try_recv().ok());

        while let Some(event) = next {
            if let Err(e) = self.formatter.format(&event, &mut self.staging) {
                self.shared.metrics.record_write_error();
                eprintln!(
                    "[LOGGER ERROR] Sink '{}' failed to format event: {}",
                    self.shared.name, e
                );
            }
            self.shared
                .queued_bytes
                .fetch_sub(event.message_size(), Ordering::AcqRel);
            self.shared.metrics.record_written();
            drop(event);

            next = self.events.try_recv().ok();
            let upcoming = next.as_ref().map_or(0, |e| e.message_size() + reserve);
            if next.is_none()
                || self.staging.len() + upcoming >= self.buffer_size
                || Instant::now() >= self.next_flush
            {
                self.write_out();
                // A busy queue must not hold back a requested flush
                self.take_flush_request();
            }
        }

        self.take_flush_request();
    }

    fn take_flush_request(&mut self) {
        if self
            .shared
            .need_flush
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.flush_device();
        }
    }

    fn write_out(&mut self) {
        self.next_flush = Instant::now() + self.latency;
        if self.staging.is_empty() {
            return;
        }
        self.shared.metrics.record_device_write();
        if let Err(e) = self.backend.write(&self.staging) {
            self.shared.metrics.record_write_error();
            eprintln!(
                "[LOGGER ERROR] Sink '{}' failed to write to {}: {}",
                self.shared.name,
                self.backend.name(),
                e
            );
        }
        self.staging.clear();
    }

    fn flush_device(&mut self) {
        self.write_out();
        self.shared.metrics.record_device_flush();
        if let Err(e) = self.backend.flush() {
            self.shared.metrics.record_write_error();
            eprintln!(
                "[LOGGER ERROR] Sink '{}' failed to flush {}: {}",
                self.shared.name,
                self.backend.name(),
                e
            );
        }
    }
}

/// Builder for [`Sink`]
///
/// # Example
///
/// ```
/// use rust_group_logger::prelude::*;
///
/// let sink = SinkBuilder::new("console", ConsoleBackend::stdout())
///     .formatter(TextFormatter::new().with_thread(ThreadInfo::Name))
///     .overflow_policy(OverflowPolicy::DropOldest)
///     .build()
///     .unwrap();
/// assert_eq!(sink.overflow_policy(), OverflowPolicy::DropOldest);
/// ```
pub struct SinkBuilder {
    name: String,
    backend: Box<dyn Backend>,
    formatter: Box<dyn Formatter>,
    capacity: usize,
    max_bytes: usize,
    buffer_size: usize,
    latency: Duration,
    overflow_policy: OverflowPolicy,
    on_overflow: Option<OverflowCallback>,
}

impl SinkBuilder {
    pub fn new(name: impl Into<String>, backend: impl Backend + 'static) -> Self {
        Self {
            name: name.into(),
            backend: Box::new(backend),
            formatter: Box::new(TextFormatter::new()),
            capacity: DEFAULT_CAPACITY,
            max_bytes: DEFAULT_MAX_BYTES,
            buffer_size: DEFAULT_BUFFER_SIZE,
            latency: DEFAULT_LATENCY,
            overflow_policy: OverflowPolicy::default(),
            on_overflow: None,
        }
    }

    /// Name the sink will be registered under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum number of queued events
    #[must_use = "builder methods return a new value"]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Maximum total message bytes held in the queue
    #[must_use = "builder methods return a new value"]
    pub fn max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Size of the staging buffer handed to the backend
    #[must_use = "builder methods return a new value"]
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Longest time formatted lines may sit in the staging buffer
    #[must_use = "builder methods return a new value"]
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    /// Called with the sink name and total drop count on the first drop
    /// and every thousandth one after it
    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn boxed_formatter(mut self, formatter: Box<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Validate the settings and start the worker thread
    pub fn build(self) -> Result<Sink> {
        if self.name.is_empty() {
            return Err(LoggerError::config("SinkBuilder", "sink name must not be empty"));
        }
        if self.capacity == 0 {
            return Err(LoggerError::config(
                "SinkBuilder",
                format!("capacity of sink '{}' must be positive", self.name),
            ));
        }
        if self.max_bytes == 0 {
            return Err(LoggerError::config(
                "SinkBuilder",
                format!("byte budget of sink '{}' must be positive", self.name),
            ));
        }

        let shared = Arc::new(Shared {
            name: self.name,
            queued_bytes: AtomicUsize::new(0),
            need_flush: AtomicBool::new(false),
            finalize: AtomicBool::new(false),
            metrics: SinkMetrics::new(),
        });
        let (sender, receiver) = bounded(self.capacity);
        let (wakeup, wakeup_rx) = bounded(1);
        let backend_name = self.backend.name().to_string();

        let worker = Worker {
            shared: Arc::clone(&shared),
            events: receiver.clone(),
            wakeup: wakeup_rx,
            backend: self.backend,
            formatter: self.formatter,
            staging: Vec::with_capacity(self.buffer_size),
            buffer_size: self.buffer_size,
            latency: self.latency,
            next_flush: Instant::now() + self.latency,
        };

        let handle = thread::Builder::new()
            .name(format!("log:{}", shared.name))
            .spawn(move || worker.run())
            .map_err(|e| {
                LoggerError::io_operation(
                    "starting sink worker",
                    format!("cannot spawn worker thread for sink '{}'", shared.name),
                    e,
                )
            })?;

        Ok(Sink {
            shared,
            capacity: self.capacity,
            max_bytes: self.max_bytes,
            overflow_policy: self.overflow_policy,
            on_overflow: self.on_overflow,
            sender,
            evictor: receiver,
            wakeup,
            backend_name,
            worker: Some(handle),
        })
    }
}
