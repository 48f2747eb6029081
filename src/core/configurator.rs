//! Configurators populate a [`LoggingSystem`] with sinks and groups
//!
//! A configurator reports a three-way outcome. A warning means logging works
//! in a degraded or default state; an error means setup did not complete.

use super::error::Result;
use super::formatter::TextFormatter;
use super::group::ROOT_GROUP;
use super::level::Level;
use super::registry::LoggingSystem;
use super::sink::SinkBuilder;
use crate::backends::console::ConsoleBackend;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Ok => write!(f, "ok"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Result of applying a configurator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigOutcome {
    pub severity: Severity,
    pub message: String,
}

impl ConfigOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Ok,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.severity == Severity::Ok
    }

    /// Logging is usable: ok or warning
    pub fn is_usable(&self) -> bool {
        self.severity != Severity::Error
    }
}

impl fmt::Display for ConfigOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Installs sinks, groups and levels through the registry's public API
pub trait Configurator {
    fn apply_on(&self, system: &LoggingSystem) -> ConfigOutcome;
}

/// Default setup: one stdout sink named `"console"` serving the root group
///
/// # Example
///
/// ```
/// use rust_group_logger::prelude::*;
///
/// let system = LoggingSystem::new();
/// let outcome = system.configure(&FallbackConfigurator::new(Level::Info));
/// assert_eq!(outcome.severity, Severity::Warning);
/// assert_eq!(system.get_group("*").unwrap().effective_sink, "console");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackConfigurator {
    pub level: Level,
    pub with_color: bool,
}

impl Default for FallbackConfigurator {
    fn default() -> Self {
        Self {
            level: Level::Info,
            with_color: cfg!(feature = "console"),
        }
    }
}

impl FallbackConfigurator {
    pub const SINK_NAME: &'static str = "console";

    #[must_use]
    pub fn new(level: Level) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_color(mut self, enabled: bool) -> Self {
        self.with_color = enabled;
        self
    }

    fn install(&self, system: &LoggingSystem) -> Result<()> {
        if system.get_sink(Self::SINK_NAME).is_err() {
            let formatter = TextFormatter::new().with_color(self.with_color);
            system.make_sink(
                SinkBuilder::new(Self::SINK_NAME, ConsoleBackend::stdout()).formatter(formatter),
            )?;
        }

        if system.get_group(ROOT_GROUP).is_ok() {
            system.set_sink_for_group(ROOT_GROUP, Self::SINK_NAME)?;
            system.set_level_for_group(ROOT_GROUP, self.level)?;
        } else {
            system.make_group(ROOT_GROUP, None, Some(Self::SINK_NAME), Some(self.level))?;
        }
        Ok(())
    }
}

impl Configurator for FallbackConfigurator {
    fn apply_on(&self, system: &LoggingSystem) -> ConfigOutcome {
        match self.install(system) {
            Ok(()) => ConfigOutcome::warning(format!(
                "No configuration supplied; logging to console at level {} ({})",
                self.level,
                if self.with_color { "colored" } else { "plain" }
            )),
            Err(e) => ConfigOutcome::error(format!("Fallback configuration failed: {}", e)),
        }
    }
}
