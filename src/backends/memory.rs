//! In-memory capture backend
//!
//! Keeps every batch a sink writes in a shared buffer. The [`MemoryHandle`]
//! stays readable after the sink (and the backend with it) is gone, which
//! makes it the backend of choice for tests and for embedders that want to
//! inspect output.

use crate::core::{Backend, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    writes: u64,
    flushes: u64,
}

/// Backend that appends to a shared in-memory buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    captured: Arc<Mutex<Captured>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader for everything written through this backend
    #[must_use]
    pub fn handle(&self) -> MemoryHandle {
        MemoryHandle {
            captured: Arc::clone(&self.captured),
        }
    }
}

impl Backend for MemoryBackend {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let mut captured = self.captured.lock();
        captured.bytes.extend_from_slice(bytes);
        captured.writes += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.captured.lock().flushes += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Read side of a [`MemoryBackend`]
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    captured: Arc<Mutex<Captured>>,
}

impl MemoryHandle {
    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.captured.lock().bytes).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Number of batches the sink handed over
    pub fn write_count(&self) -> u64 {
        self.captured.lock().writes
    }

    /// Number of explicit device flushes
    pub fn flush_count(&self) -> u64 {
        self.captured.lock().flushes
    }

    pub fn clear(&self) {
        self.captured.lock().bytes.clear();
    }

    /// Poll until at least `count` lines arrived or `timeout` passed.
    /// Returns whether the lines arrived.
    pub fn wait_for_lines(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.lines().len() >= count {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }
}
