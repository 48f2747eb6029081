//! Logging system registry
//!
//! [`LoggingSystem`] owns every sink and group by name and tracks loggers
//! weakly. It is the only place the group tree changes. Every mutation runs
//! under one write lock and finishes by re-resolving the affected subtree,
//! parent before children, and then every live logger bound to it.

use super::configurator::{ConfigOutcome, Configurator};
use super::error::{LoggerError, Result};
use super::group::{GroupId, GroupNode, GroupView, ROOT_GROUP};
use super::level::Level;
use super::logger::{Binding, Logger};
use super::sink::{Sink, SinkBuilder};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Weak};

#[derive(Default)]
struct Inner {
    sinks: HashMap<String, Arc<Sink>>,
    groups: Vec<GroupNode>,
    group_ids: HashMap<String, GroupId>,
    loggers: HashMap<String, Weak<Logger>>,
}

/// Registry of sinks, groups and loggers
///
/// # Example
///
/// ```
/// use rust_group_logger::prelude::*;
///
/// let system = LoggingSystem::new();
/// system.make_sink(SinkBuilder::new("console", ConsoleBackend::stdout())).unwrap();
/// system.make_group("*", None, Some("console"), Some(Level::Info)).unwrap();
/// system.make_group("net", None, None, Some(Level::Debug)).unwrap();
///
/// let logger = system.get_logger("net.client", "net", None, None).unwrap();
/// assert_eq!(logger.effective_level(), Level::Debug);
/// ```
#[derive(Default)]
pub struct LoggingSystem {
    inner: RwLock<Inner>,
}

impl LoggingSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a configurator against this registry
    pub fn configure(&self, configurator: &dyn Configurator) -> ConfigOutcome {
        configurator.apply_on(self)
    }

    // ----- sinks -----

    /// Build a sink and register it under its name
    pub fn make_sink(&self, builder: SinkBuilder) -> Result<Arc<Sink>> {
        if self.inner.read().sinks.contains_key(builder.name()) {
            return Err(LoggerError::duplicate("sink", builder.name()));
        }
        self.add_sink(builder.build()?)
    }

    /// Register an already built sink
    pub fn add_sink(&self, sink: Sink) -> Result<Arc<Sink>> {
        let mut inner = self.inner.write();
        if inner.sinks.contains_key(sink.name()) {
            return Err(LoggerError::duplicate("sink", sink.name()));
        }
        let sink = Arc::new(sink);
        inner.sinks.insert(sink.name().to_string(), Arc::clone(&sink));
        Ok(sink)
    }

    pub fn get_sink(&self, name: &str) -> Result<Arc<Sink>> {
        self.inner.read().sink(name)
    }

    pub fn sink_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read().sinks.keys().cloned().collect();
        names.sort();
        names
    }

    /// Request a device flush from every registered sink
    pub fn flush_all(&self) {
        for sink in self.inner.read().sinks.values() {
            sink.flush();
        }
    }

    // ----- groups -----

    /// Create a group.
    ///
    /// The first group must be the root `"*"` and must carry both a sink and
    /// a level. Any other group without a parent is placed under the root.
    pub fn make_group(
        &self,
        name: &str,
        parent: Option<&str>,
        sink: Option<&str>,
        level: Option<Level>,
    ) -> Result<GroupView> {
        let mut inner = self.inner.write();
        if inner.group_ids.contains_key(name) {
            return Err(LoggerError::duplicate("group", name));
        }
        let sink = sink.map(|s| inner.sink(s)).transpose()?;

        let node = if inner.groups.is_empty() {
            if name != ROOT_GROUP {
                return Err(LoggerError::config(
                    "LoggingSystem",
                    format!("the first group must be '{}', got '{}'", ROOT_GROUP, name),
                ));
            }
            if parent.is_some() {
                return Err(LoggerError::config(
                    "LoggingSystem",
                    "the root group cannot have a parent",
                ));
            }
            let (Some(level), Some(sink)) = (level, sink) else {
                return Err(LoggerError::config(
                    "LoggingSystem",
                    "the root group needs both a sink and a level",
                ));
            };
            GroupNode {
                name: name.to_string(),
                parent: None,
                children: Vec::new(),
                level: Some(level),
                sink: Some(Arc::clone(&sink)),
                effective_level: level,
                effective_sink: sink,
            }
        } else {
            let parent = inner.group_id(parent.unwrap_or(ROOT_GROUP))?;
            let parent_node = &inner.groups[parent.0];
            GroupNode {
                name: name.to_string(),
                parent: Some(parent),
                children: Vec::new(),
                effective_level: level.unwrap_or(parent_node.effective_level),
                effective_sink: sink
                    .clone()
                    .unwrap_or_else(|| Arc::clone(&parent_node.effective_sink)),
                level,
                sink,
            }
        };

        let id = GroupId(inner.groups.len());
        if let Some(parent) = node.parent {
            inner.groups[parent.0].children.push(id);
        }
        inner.groups.push(node);
        inner.group_ids.insert(name.to_string(), id);
        Ok(inner.view(id))
    }

    pub fn get_group(&self, name: &str) -> Result<GroupView> {
        let inner = self.inner.read();
        let id = inner.group_id(name)?;
        Ok(inner.view(id))
    }

    pub fn group_names(&self) -> Vec<String> {
        self.inner
            .read()
            .groups
            .iter()
            .map(|g| g.name.clone())
            .collect()
    }

    /// Move `group` under `parent`.
    ///
    /// Fails with [`LoggerError::CycleDetected`] when `parent` is `group`
    /// itself or one of its descendants; the tree is left unchanged.
    pub fn set_parent_for_group(&self, group: &str, parent: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let id = inner.group_id(group)?;
        let new_parent = inner.group_id(parent)?;
        if id == GroupId::ROOT {
            return Err(LoggerError::config(
                "LoggingSystem",
                "the root group cannot be re-parented",
            ));
        }

        let mut cursor = Some(new_parent);
        while let Some(ancestor) = cursor {
            if ancestor == id {
                return Err(LoggerError::cycle(group, parent));
            }
            cursor = inner.groups[ancestor.0].parent;
        }

        if let Some(old_parent) = inner.groups[id.0].parent {
            inner.groups[old_parent.0].children.retain(|&c| c != id);
        }
        inner.groups[new_parent.0].children.push(id);
        inner.groups[id.0].parent = Some(new_parent);
        inner.propagate(id);
        Ok(())
    }

    pub fn set_sink_for_group(&self, group: &str, sink: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let id = inner.group_id(group)?;
        let sink = inner.sink(sink)?;
        inner.groups[id.0].sink = Some(sink);
        inner.propagate(id);
        Ok(())
    }

    /// Make `group` inherit its sink again
    pub fn reset_sink_for_group(&self, group: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let id = inner.non_root_id(group, "sink")?;
        inner.groups[id.0].sink = None;
        inner.propagate(id);
        Ok(())
    }

    pub fn set_level_for_group(&self, group: &str, level: Level) -> Result<()> {
        let mut inner = self.inner.write();
        let id = inner.group_id(group)?;
        inner.groups[id.0].level = Some(level);
        inner.propagate(id);
        Ok(())
    }

    /// Make `group` inherit its level again
    pub fn reset_level_for_group(&self, group: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let id = inner.non_root_id(group, "level")?;
        inner.groups[id.0].level = None;
        inner.propagate(id);
        Ok(())
    }

    // ----- loggers -----

    /// Return the live logger called `name`, creating it under `group` if
    /// there is none.
    ///
    /// `sink` and `level` only apply on creation; a repeat call returns the
    /// existing logger untouched.
    pub fn get_logger(
        &self,
        name: &str,
        group: &str,
        sink: Option<&str>,
        level: Option<Level>,
    ) -> Result<Arc<Logger>> {
        if let Some(logger) = self.inner.read().live_logger(name) {
            return Ok(logger);
        }

        let mut inner = self.inner.write();
        // Another thread may have created it between the two locks
        if let Some(logger) = inner.live_logger(name) {
            return Ok(logger);
        }

        let id = inner.group_id(group)?;
        let sink = sink.map(|s| inner.sink(s)).transpose()?;
        let node = &inner.groups[id.0];
        let logger = Arc::new(Logger::new(
            name.to_string(),
            Binding {
                group: id,
                group_name: node.name.clone(),
                level,
                sink,
            },
            node.effective_level,
            &node.effective_sink,
        ));
        inner
            .loggers
            .insert(name.to_string(), Arc::downgrade(&logger));
        Ok(logger)
    }

    pub fn find_logger(&self, name: &str) -> Result<Arc<Logger>> {
        self.inner
            .read()
            .live_logger(name)
            .ok_or_else(|| LoggerError::unknown_logger(name))
    }

    /// Loggers still held somewhere in the application
    pub fn live_logger_count(&self) -> usize {
        self.inner
            .read()
            .loggers
            .values()
            .filter(|l| l.strong_count() > 0)
            .count()
    }

    pub fn set_group_for_logger(&self, logger: &str, group: &str) -> Result<()> {
        let inner = self.inner.write();
        let handle = inner.logger(logger)?;
        let id = inner.group_id(group)?;
        let node = &inner.groups[id.0];
        handle.rebind(node.effective_level, &node.effective_sink, |b| {
            b.group = id;
            b.group_name = node.name.clone();
        });
        Ok(())
    }

    pub fn set_sink_for_logger(&self, logger: &str, sink: &str) -> Result<()> {
        let inner = self.inner.write();
        let handle = inner.logger(logger)?;
        let sink = inner.sink(sink)?;
        inner.rebind(&handle, |b| b.sink = Some(sink));
        Ok(())
    }

    pub fn reset_sink_for_logger(&self, logger: &str) -> Result<()> {
        let inner = self.inner.write();
        let handle = inner.logger(logger)?;
        inner.rebind(&handle, |b| b.sink = None);
        Ok(())
    }

    pub fn set_level_for_logger(&self, logger: &str, level: Level) -> Result<()> {
        let inner = self.inner.write();
        let handle = inner.logger(logger)?;
        inner.rebind(&handle, |b| b.level = Some(level));
        Ok(())
    }

    pub fn reset_level_for_logger(&self, logger: &str) -> Result<()> {
        let inner = self.inner.write();
        let handle = inner.logger(logger)?;
        inner.rebind(&handle, |b| b.level = None);
        Ok(())
    }
}

impl fmt::Debug for LoggingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("LoggingSystem")
            .field("sinks", &inner.sinks.len())
            .field("groups", &inner.groups.len())
            .field("loggers", &inner.loggers.len())
            .finish()
    }
}

impl Inner {
    fn sink(&self, name: &str) -> Result<Arc<Sink>> {
        self.sinks
            .get(name)
            .cloned()
            .ok_or_else(|| LoggerError::unknown_sink(name))
    }

    fn group_id(&self, name: &str) -> Result<GroupId> {
        self.group_ids
            .get(name)
            .copied()
            .ok_or_else(|| LoggerError::unknown_group(name))
    }

    /// Group id for a reset operation; the root must keep its values
    fn non_root_id(&self, name: &str, attribute: &str) -> Result<GroupId> {
        let id = self.group_id(name)?;
        if id == GroupId::ROOT {
            return Err(LoggerError::config(
                "LoggingSystem",
                format!("the {} of the root group cannot be reset", attribute),
            ));
        }
        Ok(id)
    }

    fn live_logger(&self, name: &str) -> Option<Arc<Logger>> {
        self.loggers.get(name).and_then(Weak::upgrade)
    }

    fn logger(&self, name: &str) -> Result<Arc<Logger>> {
        self.live_logger(name)
            .ok_or_else(|| LoggerError::unknown_logger(name))
    }

    fn rebind<F>(&self, logger: &Logger, change: F)
    where
        F: FnOnce(&mut Binding),
    {
        let node = &self.groups[logger.group_id().0];
        logger.rebind(node.effective_level, &node.effective_sink, change);
    }

    fn view(&self, id: GroupId) -> GroupView {
        let node = &self.groups[id.0];
        let parent = node.parent.map(|p| self.groups[p.0].name.as_str());
        let children = node
            .children
            .iter()
            .map(|c| self.groups[c.0].name.clone())
            .collect();
        node.view(parent, children)
    }

    /// Re-resolve `from` and its subtree, then every live logger bound to it
    fn propagate(&mut self, from: GroupId) {
        let mut affected = HashSet::new();
        let mut stack = vec![from];

        while let Some(id) = stack.pop() {
            let inherited = self.groups[id.0].parent.map(|p| {
                let parent = &self.groups[p.0];
                (parent.effective_level, Arc::clone(&parent.effective_sink))
            });

            let node = &mut self.groups[id.0];
            let (level, sink) = inherited
                .unwrap_or_else(|| (node.effective_level, Arc::clone(&node.effective_sink)));
            node.effective_level = node.level.unwrap_or(level);
            node.effective_sink = node.sink.clone().unwrap_or(sink);

            affected.insert(id);
            stack.extend(node.children.iter().rev().copied());
        }

        let groups = &self.groups;
        self.loggers.retain(|_, weak| match weak.upgrade() {
            Some(logger) => {
                let id = logger.group_id();
                if affected.contains(&id) {
                    let node = &groups[id.0];
                    logger.resolve(node.effective_level, &node.effective_sink);
                }
                true
            }
            None => false,
        });
    }
}
