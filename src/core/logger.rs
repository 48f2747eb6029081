//! Logger handles
//!
//! A [`Logger`] is what application code holds and calls. It is bound to one
//! group and may override the group's level or sink. Both effective values
//! are cached on the handle and pushed in by the registry whenever they
//! change, so a log call never walks the group tree.
//!
//! The level is only stored while the sink lock is held for writing, so a
//! reader holding the sink lock always sees a matching level and sink.

use super::event::Event;
use super::group::GroupId;
use super::level::Level;
use super::sink::Sink;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Group binding and explicit overrides, changed only by the registry
pub(crate) struct Binding {
    pub(crate) group: GroupId,
    pub(crate) group_name: String,
    pub(crate) level: Option<Level>,
    pub(crate) sink: Option<Arc<Sink>>,
}

pub struct Logger {
    name: String,
    binding: RwLock<Binding>,
    effective_level: AtomicU8,
    effective_sink: RwLock<Arc<Sink>>,
}

impl Logger {
    /// Create a logger already resolved against its group's effective values
    pub(crate) fn new(
        name: String,
        binding: Binding,
        group_level: Level,
        group_sink: &Arc<Sink>,
    ) -> Self {
        let level = binding.level.unwrap_or(group_level);
        let sink = binding
            .sink
            .clone()
            .unwrap_or_else(|| Arc::clone(group_sink));
        Self {
            name,
            binding: RwLock::new(binding),
            effective_level: AtomicU8::new(level.as_u8()),
            effective_sink: RwLock::new(sink),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the group this logger is bound to
    pub fn group_name(&self) -> String {
        self.binding.read().group_name.clone()
    }

    pub(crate) fn group_id(&self) -> GroupId {
        self.binding.read().group
    }

    /// Cheap level probe for call sites
    #[inline]
    pub fn effective_level(&self) -> Level {
        Level::from_u8(self.effective_level.load(Ordering::Acquire))
    }

    /// Level set on this logger itself, if any
    pub fn explicit_level(&self) -> Option<Level> {
        self.binding.read().level
    }

    /// Sink every call currently goes to
    pub fn sink(&self) -> Arc<Sink> {
        Arc::clone(&self.effective_sink.read())
    }

    /// Effective level and sink, read together
    pub fn effective(&self) -> (Level, Arc<Sink>) {
        let sink = self.effective_sink.read();
        (self.effective_level(), Arc::clone(&sink))
    }

    /// Name of the sink set on this logger itself, if any
    pub fn explicit_sink(&self) -> Option<String> {
        self.binding
            .read()
            .sink
            .as_ref()
            .map(|s| s.name().to_string())
    }

    #[inline]
    pub fn is_enabled(&self, level: Level) -> bool {
        self.effective_level().is_enabled_for(level)
    }

    /// Log a message if `level` passes the effective level.
    ///
    /// A disabled call returns before the message is converted.
    pub fn log(&self, level: Level, message: impl Into<String>) {
        if !self.is_enabled(level) {
            return;
        }
        self.emit(level, message.into());
    }

    /// Like [`Logger::log`], but the message is only built when enabled
    pub fn log_with<F>(&self, level: Level, message: F)
    where
        F: FnOnce() -> String,
    {
        if !self.is_enabled(level) {
            return;
        }
        self.emit(level, message());
    }

    fn emit(&self, level: Level, message: String) {
        let sink = self.effective_sink.read();
        // The level may have changed together with the sink
        if !self.is_enabled(level) {
            return;
        }
        sink.enqueue(Event::new(level, self.name.as_str(), message));
    }

    pub fn critical(&self, message: impl Into<String>) {
        self.log(Level::Critical, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warn, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    pub fn verbose(&self, message: impl Into<String>) {
        self.log(Level::Verbose, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    pub fn trace(&self, message: impl Into<String>) {
        self.log(Level::Trace, message);
    }

    /// Ask the effective sink for a device flush; does not wait for it
    pub fn flush(&self) {
        self.effective_sink.read().flush();
    }

    /// Mutate the binding and re-resolve against the group's values.
    /// Called by the registry with its write lock held.
    pub(crate) fn rebind<F>(&self, group_level: Level, group_sink: &Arc<Sink>, change: F)
    where
        F: FnOnce(&mut Binding),
    {
        change(&mut self.binding.write());
        self.resolve(group_level, group_sink);
    }

    /// Recompute the cached effective values from the group's values
    pub(crate) fn resolve(&self, group_level: Level, group_sink: &Arc<Sink>) {
        let (level, sink) = {
            let binding = self.binding.read();
            (
                binding.level.unwrap_or(group_level),
                binding
                    .sink
                    .clone()
                    .unwrap_or_else(|| Arc::clone(group_sink)),
            )
        };

        let mut current = self.effective_sink.write();
        self.effective_level.store(level.as_u8(), Ordering::Release);
        if !Arc::ptr_eq(&current, &sink) {
            *current = sink;
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let binding = self.binding.read();
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("group", &binding.group_name)
            .field("level", &self.effective_level())
            .field("sink", &self.effective_sink.read().name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::{MemoryBackend, MemoryHandle};
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Duration;

    fn memory_sink(name: &str) -> (Arc<Sink>, MemoryHandle) {
        let memory = MemoryBackend::new();
        let handle = memory.handle();
        let sink = Sink::builder(name, memory)
            .latency(Duration::from_millis(10))
            .build()
            .unwrap();
        (Arc::new(sink), handle)
    }

    fn binding(level: Option<Level>, sink: Option<Arc<Sink>>) -> Binding {
        Binding {
            group: GroupId::ROOT,
            group_name: "*".to_string(),
            level,
            sink,
        }
    }

    #[test]
    fn test_inherits_group_values() {
        let (sink, _) = memory_sink("group");
        let logger = Logger::new("app".to_string(), binding(None, None), Level::Warn, &sink);

        assert_eq!(logger.effective_level(), Level::Warn);
        assert_eq!(logger.sink().name(), "group");
        assert!(logger.is_enabled(Level::Error));
        assert!(!logger.is_enabled(Level::Info));
        assert_eq!(logger.group_name(), "*");
    }

    #[test]
    fn test_override_survives_resolve() {
        let (group_sink, _) = memory_sink("group");
        let (own_sink, _) = memory_sink("own");
        let logger = Logger::new(
            "app".to_string(),
            binding(Some(Level::Trace), Some(Arc::clone(&own_sink))),
            Level::Info,
            &group_sink,
        );

        logger.resolve(Level::Error, &group_sink);
        assert_eq!(logger.effective_level(), Level::Trace);
        assert_eq!(logger.sink().name(), "own");
        assert_eq!(logger.explicit_sink().as_deref(), Some("own"));
    }

    #[test]
    fn test_rebind_reset_level() {
        let (sink, _) = memory_sink("group");
        let logger = Logger::new(
            "app".to_string(),
            binding(Some(Level::Debug), None),
            Level::Info,
            &sink,
        );

        logger.rebind(Level::Info, &sink, |b| b.level = None);
        assert_eq!(logger.explicit_level(), None);
        assert_eq!(logger.effective_level(), Level::Info);
    }

    #[test]
    fn test_disabled_calls_never_reach_sink() {
        let (sink, handle) = memory_sink("quiet");
        let logger = Logger::new("app".to_string(), binding(None, None), Level::Info, &sink);

        logger.debug("hidden");
        logger.log_with(Level::Trace, || panic!("closure must not run"));
        logger.info("shown");
        assert!(handle.wait_for_lines(1, Duration::from_secs(5)));

        assert_eq!(sink.metrics().enqueued_count(), 1);
        assert!(handle.contents().contains("shown"));
        assert!(!handle.contents().contains("hidden"));
    }

    #[test]
    fn test_off_disables_everything() {
        let (sink, _) = memory_sink("off");
        let logger = Logger::new("app".to_string(), binding(Some(Level::Off), None), Level::Trace, &sink);
        for level in Level::ALL {
            assert!(!logger.is_enabled(level));
        }
    }

    #[test]
    fn test_level_and_sink_change_together() {
        let (quiet, _) = memory_sink("quiet");
        let (loud, _) = memory_sink("loud");
        let logger = Arc::new(Logger::new(
            "app".to_string(),
            binding(None, None),
            Level::Error,
            &quiet,
        ));
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let logger = Arc::clone(&logger);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    let (level, sink) = logger.effective();
                    let expected = if sink.name() == "loud" {
                        Level::Trace
                    } else {
                        Level::Error
                    };
                    assert_eq!(level, expected, "mixed state on sink '{}'", sink.name());
                }
            })
        };

        for i in 0..2_000 {
            if i % 2 == 0 {
                logger.resolve(Level::Trace, &loud);
            } else {
                logger.resolve(Level::Error, &quiet);
            }
        }
        done.store(true, Ordering::Relaxed);
        reader.join().expect("reader saw a mixed level and sink");
    }
}
