//! Core types: levels, events, sinks and the group/logger registry

pub mod backend;
pub mod config;
pub mod configurator;
pub mod error;
pub mod event;
pub mod formatter;
pub mod group;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod overflow_policy;
pub mod registry;
pub mod sink;
pub mod timestamp;

pub use backend::Backend;
pub use config::{DeclarativeConfigurator, GroupConfig, SinkConfig, SinkTarget, SystemConfig};
pub use configurator::{ConfigOutcome, Configurator, FallbackConfigurator, Severity};
pub use error::{LoggerError, Result};
pub use event::Event;
pub use formatter::{Formatter, JsonFormatter, LevelStyle, OutputFormat, TextFormatter, ThreadInfo};
pub use group::{GroupId, GroupView, ROOT_GROUP};
pub use level::Level;
pub use logger::Logger;
pub use metrics::SinkMetrics;
pub use overflow_policy::{OverflowCallback, OverflowPolicy};
pub use registry::LoggingSystem;
pub use sink::{Sink, SinkBuilder};
pub use timestamp::TimeZoneMode;
