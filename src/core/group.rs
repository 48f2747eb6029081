//! Group tree nodes
//!
//! Groups live in an arena owned by the registry and refer to each other by
//! [`GroupId`]. Callers only ever see [`GroupView`] snapshots.

use super::level::Level;
use super::sink::Sink;
use std::sync::Arc;

/// Name of the root group every other group descends from
pub const ROOT_GROUP: &str = "*";

/// Index of a group in the registry's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub(crate) usize);

impl GroupId {
    pub const ROOT: GroupId = GroupId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Arena entry. Effective values are kept resolved at all times.
pub(crate) struct GroupNode {
    pub(crate) name: String,
    pub(crate) parent: Option<GroupId>,
    pub(crate) children: Vec<GroupId>,
    pub(crate) level: Option<Level>,
    pub(crate) sink: Option<Arc<Sink>>,
    pub(crate) effective_level: Level,
    pub(crate) effective_sink: Arc<Sink>,
}

impl GroupNode {
    pub(crate) fn view(&self, parent_name: Option<&str>, child_names: Vec<String>) -> GroupView {
        GroupView {
            name: self.name.clone(),
            parent: parent_name.map(str::to_string),
            children: child_names,
            level: self.level,
            sink: self.sink.as_ref().map(|s| s.name().to_string()),
            effective_level: self.effective_level,
            effective_sink: self.effective_sink.name().to_string(),
        }
    }
}

/// Point-in-time snapshot of one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupView {
    pub name: String,
    /// `None` only for the root group
    pub parent: Option<String>,
    pub children: Vec<String>,
    /// Explicit level, if set on this group
    pub level: Option<Level>,
    /// Explicit sink name, if set on this group
    pub sink: Option<String>,
    pub effective_level: Level,
    pub effective_sink: String,
}

impl GroupView {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
