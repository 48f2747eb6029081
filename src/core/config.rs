//! Declarative configuration
//!
//! A JSON document describing sinks and a group tree:
//!
//! ```json
//! {
//!   "sinks": [
//!     { "name": "console", "type": "console", "color": true, "thread": "name" },
//!     { "name": "audit", "type": "file", "path": "logs/audit.log", "format": "json" }
//!   ],
//!   "groups": [
//!     { "name": "*", "sink": "console", "level": "info", "children": [
//!       { "name": "net", "level": "debug" },
//!       { "name": "audit", "sink": "audit" }
//!     ]}
//!   ]
//! }
//! ```
//!
//! Sinks are created first, then groups top-down. A group without a parent
//! hangs under its enclosing group, or under `"*"` at the top level.
//!
//! A document can be applied again to a running system. Every sink and
//! parent it names is checked first, so a rejected document changes nothing.

use super::configurator::{ConfigOutcome, Configurator};
use super::error::{LoggerError, Result};
use super::formatter::{Formatter, JsonFormatter, LevelStyle, OutputFormat, TextFormatter, ThreadInfo};
use super::group::ROOT_GROUP;
use super::level::Level;
use super::overflow_policy::OverflowPolicy;
use super::registry::LoggingSystem;
use super::sink::SinkBuilder;
use super::timestamp::TimeZoneMode;
use crate::backends::{
    ConsoleBackend, ConsoleStream, FileBackend, MemoryBackend, MemoryHandle, RotatingFileBackend,
    RotationPolicy,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where a configured sink writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkTarget {
    Console {
        #[serde(default)]
        stream: ConsoleStream,
    },
    File {
        path: PathBuf,
    },
    RotatingFile {
        path: PathBuf,
        #[serde(default)]
        rotation: RotationPolicy,
    },
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkConfig {
    pub name: String,
    #[serde(flatten)]
    pub target: SinkTarget,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub color: bool,
    #[serde(default)]
    pub thread: ThreadInfo,
    #[serde(default)]
    pub level_style: LevelStyle,
    #[serde(default)]
    pub time_zone: TimeZoneMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overflow: Option<OverflowPolicy>,
}

impl SinkConfig {
    fn formatter(&self) -> Box<dyn Formatter> {
        match self.format {
            OutputFormat::Text => Box::new(
                TextFormatter::new()
                    .with_color(self.color)
                    .with_thread(self.thread)
                    .with_level_style(self.level_style)
                    .with_time_zone(self.time_zone),
            ),
            OutputFormat::Json => Box::new(JsonFormatter::new()),
        }
    }

    fn tune(&self, mut builder: SinkBuilder) -> SinkBuilder {
        builder = builder.boxed_formatter(self.formatter());
        if let Some(capacity) = self.capacity {
            builder = builder.capacity(capacity);
        }
        if let Some(max_bytes) = self.max_bytes {
            builder = builder.max_bytes(max_bytes);
        }
        if let Some(buffer_size) = self.buffer_size {
            builder = builder.buffer_size(buffer_size);
        }
        if let Some(latency) = self.latency_ms {
            builder = builder.latency(Duration::from_millis(latency));
        }
        if let Some(policy) = self.overflow {
            builder = builder.overflow_policy(policy);
        }
        builder
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<GroupConfig>,
}

/// Whole-system configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

impl SystemConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "read configuration",
                format!("Failed to read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every name the document refers to before anything is created.
    ///
    /// Sinks and groups may come from the document itself or be installed
    /// in `system` already.
    fn validate(&self, system: &LoggingSystem) -> Result<()> {
        let mut groups = Vec::new();
        collect_groups(&self.groups, &mut groups);

        let declares_root = groups.iter().any(|g| g.name == ROOT_GROUP);
        if !declares_root && system.get_group(ROOT_GROUP).is_err() {
            return Err(LoggerError::config(
                "SystemConfig",
                format!("no '{}' group declared and none installed yet", ROOT_GROUP),
            ));
        }

        let mut sinks: HashSet<&str> = HashSet::new();
        for sink in &self.sinks {
            if !sinks.insert(sink.name.as_str()) {
                return Err(LoggerError::duplicate("sink", sink.name.as_str()));
            }
        }
        let installed_sinks = system.sink_names();
        let mut names: HashSet<&str> = HashSet::new();
        for group in &groups {
            if !names.insert(group.name.as_str()) {
                return Err(LoggerError::duplicate("group", group.name.as_str()));
            }
            if let Some(ref sink) = group.sink {
                if !sinks.contains(sink.as_str()) && !installed_sinks.contains(sink) {
                    return Err(LoggerError::unknown_sink(sink.as_str()));
                }
            }
        }

        let installed_groups = system.group_names();
        for group in &groups {
            if let Some(ref parent) = group.parent {
                if !names.contains(parent.as_str()) && !installed_groups.contains(parent) {
                    return Err(LoggerError::unknown_group(parent.as_str()));
                }
            }
        }
        Ok(())
    }
}

fn collect_groups<'a>(groups: &'a [GroupConfig], out: &mut Vec<&'a GroupConfig>) {
    for group in groups {
        out.push(group);
        collect_groups(&group.children, out);
    }
}

/// Applies a [`SystemConfig`] to a registry
///
/// Handles of `memory` sinks are kept so their output can be read back.
#[derive(Debug, Default)]
pub struct DeclarativeConfigurator {
    config: SystemConfig,
    memory: Mutex<HashMap<String, MemoryHandle>>,
}

impl DeclarativeConfigurator {
    #[must_use]
    pub fn new(config: SystemConfig) -> Self {
        Self {
            config,
            memory: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        SystemConfig::from_json(text).map(Self::new)
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Output of a `memory` sink created by the last application
    pub fn memory_handle(&self, sink: &str) -> Option<MemoryHandle> {
        self.memory.lock().get(sink).cloned()
    }

    /// Open the device behind `sink`
    fn builder(sink: &SinkConfig) -> Result<(SinkBuilder, Option<MemoryHandle>)> {
        let builder = match &sink.target {
            SinkTarget::Console { stream } => {
                SinkBuilder::new(&sink.name, ConsoleBackend::new(*stream))
            }
            SinkTarget::File { path } => SinkBuilder::new(&sink.name, FileBackend::new(path)?),
            SinkTarget::RotatingFile { path, rotation } => SinkBuilder::new(
                &sink.name,
                RotatingFileBackend::new(path, rotation.clone())?,
            ),
            SinkTarget::Memory => {
                let memory = MemoryBackend::new();
                let handle = memory.handle();
                return Ok((sink.tune(SinkBuilder::new(&sink.name, memory)), Some(handle)));
            }
        };
        Ok((sink.tune(builder), None))
    }

    /// Sinks already registered under a declared name are kept as they are;
    /// groups that exist are brought in line with the document.
    fn apply(&self, system: &LoggingSystem) -> Result<()> {
        self.config.validate(system)?;

        // Open every new device before registering any of them
        let mut pending = Vec::new();
        for sink in &self.config.sinks {
            if system.get_sink(&sink.name).is_err() {
                pending.push(Self::builder(sink)?);
            }
        }
        for (builder, memory) in pending {
            let name = builder.name().to_string();
            system.make_sink(builder)?;
            if let Some(handle) = memory {
                self.memory.lock().insert(name, handle);
            }
        }

        // Root first so every other group has somewhere to hang
        let (roots, others): (Vec<&GroupConfig>, Vec<&GroupConfig>) =
            self.config.groups.iter().partition(|g| g.name == ROOT_GROUP);
        for group in roots.into_iter().chain(others) {
            Self::apply_group(system, group, None)?;
        }
        Ok(())
    }

    fn apply_group(system: &LoggingSystem, group: &GroupConfig, enclosing: Option<&str>) -> Result<()> {
        let parent = group.parent.as_deref().or(enclosing);

        match system.get_group(&group.name) {
            Ok(current) if current.is_root() => {
                if let Some(ref sink) = group.sink {
                    system.set_sink_for_group(ROOT_GROUP, sink)?;
                }
                if let Some(level) = group.level {
                    system.set_level_for_group(ROOT_GROUP, level)?;
                }
            }
            Ok(current) => {
                let parent = parent.unwrap_or(ROOT_GROUP);
                if current.parent.as_deref() != Some(parent) {
                    system.set_parent_for_group(&group.name, parent)?;
                }
                match group.sink {
                    Some(ref sink) => system.set_sink_for_group(&group.name, sink)?,
                    None if current.sink.is_some() => system.reset_sink_for_group(&group.name)?,
                    None => {}
                }
                match group.level {
                    Some(level) => system.set_level_for_group(&group.name, level)?,
                    None if current.level.is_some() => system.reset_level_for_group(&group.name)?,
                    None => {}
                }
            }
            Err(_) => {
                system.make_group(&group.name, parent, group.sink.as_deref(), group.level)?;
            }
        }

        for child in &group.children {
            Self::apply_group(system, child, Some(group.name.as_str()))?;
        }
        Ok(())
    }
}

impl Configurator for DeclarativeConfigurator {
    fn apply_on(&self, system: &LoggingSystem) -> ConfigOutcome {
        match self.apply(system) {
            Ok(()) => ConfigOutcome::ok(format!(
                "Configured {} sink(s) and {} top-level group(s)",
                self.config.sinks.len(),
                self.config.groups.len()
            )),
            Err(e) => ConfigOutcome::error(format!("Configuration failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::configurator::Severity;

    const DOCUMENT: &str = r#"{
        "sinks": [
            { "name": "mem", "type": "memory", "thread": "id", "latency_ms": 10 },
            { "name": "err", "type": "console", "stream": "stderr", "overflow": "drop_oldest" }
        ],
        "groups": [
            { "name": "*", "sink": "mem", "level": "warn", "children": [
                { "name": "net", "level": "debug", "children": [
                    { "name": "net.tcp" }
                ]}
            ]},
            { "name": "db", "sink": "err" }
        ]
    }"#;

    #[test]
    fn test_parse_document() {
        let config = SystemConfig::from_json(DOCUMENT).unwrap();
        assert_eq!(config.sinks.len(), 2);
        assert_eq!(config.sinks[0].target, SinkTarget::Memory);
        assert_eq!(config.sinks[0].thread, ThreadInfo::Id);
        assert_eq!(
            config.sinks[1].target,
            SinkTarget::Console {
                stream: ConsoleStream::Stderr
            }
        );
        assert_eq!(config.sinks[1].overflow, Some(OverflowPolicy::DropOldest));
        assert_eq!(config.groups[0].children[0].level, Some(Level::Debug));
    }

    #[test]
    fn test_apply_builds_tree() {
        let system = LoggingSystem::new();
        let configurator = DeclarativeConfigurator::from_json(DOCUMENT).unwrap();
        let outcome = system.configure(&configurator);
        assert_eq!(outcome.severity, Severity::Ok, "{}", outcome);

        let tcp = system.get_group("net.tcp").unwrap();
        assert_eq!(tcp.parent.as_deref(), Some("net"));
        assert_eq!(tcp.effective_level, Level::Debug);
        assert_eq!(tcp.effective_sink, "mem");

        let db = system.get_group("db").unwrap();
        assert_eq!(db.parent.as_deref(), Some(ROOT_GROUP));
        assert_eq!(db.effective_level, Level::Warn);
        assert_eq!(db.effective_sink, "err");
        assert_eq!(
            system.get_sink("err").unwrap().overflow_policy(),
            OverflowPolicy::DropOldest
        );

        let logger = system.get_logger("tcp", "net.tcp", None, None).unwrap();
        logger.debug("handshake");
        let handle = configurator.memory_handle("mem").unwrap();
        assert!(handle.wait_for_lines(1, Duration::from_secs(5)));
        assert!(handle.contents().contains("handshake"));
    }

    #[test]
    fn test_missing_root_is_error() {
        let system = LoggingSystem::new();
        let configurator = DeclarativeConfigurator::from_json(
            r#"{ "sinks": [{ "name": "m", "type": "memory" }], "groups": [{ "name": "app", "sink": "m" }] }"#,
        )
        .unwrap();
        let outcome = system.configure(&configurator);
        assert_eq!(outcome.severity, Severity::Error);
        assert!(system.sink_names().is_empty());
    }

    #[test]
    fn test_unknown_level_rejected() {
        let result = SystemConfig::from_json(r#"{ "groups": [{ "name": "*", "level": "loud" }] }"#);
        assert!(matches!(result, Err(LoggerError::JsonError(_))));
    }

    #[test]
    fn test_unknown_sink_reference_is_error() {
        let system = LoggingSystem::new();
        let configurator = DeclarativeConfigurator::from_json(
            r#"{ "sinks": [{ "name": "m", "type": "memory" }],
                 "groups": [{ "name": "*", "sink": "m", "level": "info" }, { "name": "x", "sink": "nope" }] }"#,
        )
        .unwrap();
        let outcome = system.configure(&configurator);
        assert_eq!(outcome.severity, Severity::Error);
        assert!(outcome.message.contains("nope"));
        assert!(system.sink_names().is_empty());

        // Nothing was left behind, so the corrected document goes through
        let corrected = DeclarativeConfigurator::from_json(
            r#"{ "sinks": [{ "name": "m", "type": "memory" }, { "name": "nope", "type": "memory" }],
                 "groups": [{ "name": "*", "sink": "m", "level": "info" }, { "name": "x", "sink": "nope" }] }"#,
        )
        .unwrap();
        assert!(system.configure(&corrected).is_ok());
        assert_eq!(system.get_group("x").unwrap().effective_sink, "nope");
    }

    #[test]
    fn test_unknown_parent_reference_is_error() {
        let system = LoggingSystem::new();
        let configurator = DeclarativeConfigurator::from_json(
            r#"{ "sinks": [{ "name": "m", "type": "memory" }],
                 "groups": [{ "name": "*", "sink": "m", "level": "info" }, { "name": "x", "parent": "ghost" }] }"#,
        )
        .unwrap();
        let outcome = system.configure(&configurator);
        assert_eq!(outcome.severity, Severity::Error);
        assert!(outcome.message.contains("ghost"));
        assert!(system.group_names().is_empty());
    }

    #[test]
    fn test_duplicate_group_in_document_is_error() {
        let system = LoggingSystem::new();
        let configurator = DeclarativeConfigurator::from_json(
            r#"{ "sinks": [{ "name": "m", "type": "memory" }],
                 "groups": [{ "name": "*", "sink": "m", "level": "info", "children": [{ "name": "a" }] },
                            { "name": "a" }] }"#,
        )
        .unwrap();
        let outcome = system.configure(&configurator);
        assert_eq!(outcome.severity, Severity::Error);
        assert!(system.sink_names().is_empty());
    }

    #[test]
    fn test_apply_same_document_twice() {
        let system = LoggingSystem::new();
        let configurator = DeclarativeConfigurator::from_json(DOCUMENT).unwrap();
        assert!(system.configure(&configurator).is_ok());
        let logger = system.get_logger("tcp", "net.tcp", None, None).unwrap();

        let outcome = system.configure(&configurator);
        assert_eq!(outcome.severity, Severity::Ok, "{}", outcome);
        assert_eq!(system.sink_names(), vec!["err".to_string(), "mem".to_string()]);
        assert_eq!(
            system.group_names(),
            vec![ROOT_GROUP, "net", "net.tcp", "db"]
        );
        assert_eq!(logger.effective_level(), Level::Debug);

        // The kept memory sink is still readable
        logger.debug("after reapply");
        let handle = configurator.memory_handle("mem").unwrap();
        assert!(handle.wait_for_lines(1, Duration::from_secs(5)));
    }

    #[test]
    fn test_reapply_updates_live_tree() {
        let system = LoggingSystem::new();
        assert!(system
            .configure(&DeclarativeConfigurator::from_json(DOCUMENT).unwrap())
            .is_ok());
        let tcp = system.get_logger("tcp", "net.tcp", None, None).unwrap();
        let db = system.get_logger("db", "db", None, None).unwrap();

        // "net" loses its level, "db" moves under "net" and drops its sink
        let revised = DeclarativeConfigurator::from_json(
            r#"{ "sinks": [{ "name": "mem", "type": "memory" }],
                 "groups": [
                    { "name": "*", "level": "ERROR", "children": [
                        { "name": "net", "children": [{ "name": "net.tcp", "level": "crit" }] }
                    ]},
                    { "name": "db", "parent": "net" }
                 ] }"#,
        )
        .unwrap();
        let outcome = system.configure(&revised);
        assert!(outcome.is_ok(), "{}", outcome);

        assert_eq!(system.get_group("net").unwrap().level, None);
        assert_eq!(tcp.effective_level(), Level::Critical);
        let db_view = system.get_group("db").unwrap();
        assert_eq!(db_view.parent.as_deref(), Some("net"));
        assert_eq!(db_view.sink, None);
        assert_eq!(db.effective_level(), Level::Error);
        assert_eq!(db.sink().name(), "mem");
    }

    #[test]
    fn test_levels_accept_parse_spellings() {
        let config = SystemConfig::from_json(
            r#"{ "groups": [{ "name": "*", "level": "INFO", "children": [
                    { "name": "a", "level": "crit" }, { "name": "b", "level": "Warning" }
               ]}] }"#,
        )
        .unwrap();
        let root = &config.groups[0];
        assert_eq!(root.level, Some(Level::Info));
        assert_eq!(root.children[0].level, Some(Level::Critical));
        assert_eq!(root.children[1].level, Some(Level::Warn));
    }

    #[test]
    fn test_file_sink_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let config = SystemConfig {
            sinks: vec![SinkConfig {
                name: "file".to_string(),
                target: SinkTarget::File { path: path.clone() },
                format: OutputFormat::Json,
                color: false,
                thread: ThreadInfo::None,
                level_style: LevelStyle::Full,
                time_zone: TimeZoneMode::Utc,
                capacity: None,
                max_bytes: None,
                buffer_size: None,
                latency_ms: Some(10),
                overflow: None,
            }],
            groups: vec![GroupConfig {
                name: ROOT_GROUP.to_string(),
                parent: None,
                sink: Some("file".to_string()),
                level: Some(Level::Info),
                children: Vec::new(),
            }],
        };

        let json = config.to_json().unwrap();
        assert_eq!(SystemConfig::from_json(&json).unwrap(), config);

        let system = LoggingSystem::new();
        assert!(system.configure(&DeclarativeConfigurator::new(config)).is_ok());
        system.get_logger("app", ROOT_GROUP, None, None).unwrap().info("stored");
        drop(system);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"message\":\"stored\""));
    }
}
