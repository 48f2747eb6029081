//! # Rust Group Logger
//!
//! Structured logging core with hierarchical configuration and asynchronous
//! delivery.
//!
//! ## Features
//!
//! - **Group Tree**: Loggers inherit level and sink from named groups rooted at `"*"`
//! - **Live Reconfiguration**: Level and sink changes propagate to existing loggers
//! - **Asynchronous Sinks**: Bounded queue and one worker thread per sink
//! - **Backends**: Console, file, rotating file and in-memory capture
//!
//! ## Example
//!
//! ```
//! use rust_group_logger::prelude::*;
//!
//! let system = LoggingSystem::new();
//! system.configure(&FallbackConfigurator::new(Level::Info));
//!
//! let logger = system.get_logger("net", "*", None, None).unwrap();
//! logger.debug("connecting"); // below INFO, never queued
//! logger.warn("timeout");
//! ```

pub mod backends;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::backends::{
        ConsoleBackend, ConsoleStream, FileBackend, MemoryBackend, MemoryHandle,
        RotatingFileBackend, RotationPolicy, RotationStrategy,
    };
    pub use crate::core::{
        Backend, ConfigOutcome, Configurator, DeclarativeConfigurator, FallbackConfigurator,
        Formatter, GroupView, JsonFormatter, Level, LevelStyle, Logger, LoggerError,
        LoggingSystem, OverflowCallback, OverflowPolicy, Result, Severity, Sink, SinkBuilder,
        SinkMetrics, SystemConfig, TextFormatter, ThreadInfo, TimeZoneMode, ROOT_GROUP,
    };
}

pub use crate::backends::{ConsoleBackend, FileBackend, MemoryBackend, RotatingFileBackend};
pub use crate::core::{
    Backend, ConfigOutcome, Configurator, DeclarativeConfigurator, Event, FallbackConfigurator,
    Formatter, GroupView, JsonFormatter, Level, Logger, LoggerError, LoggingSystem,
    OverflowCallback, OverflowPolicy, Result, Severity, Sink, SinkBuilder, SinkMetrics,
    SystemConfig, TextFormatter, ThreadInfo, ROOT_GROUP,
};
