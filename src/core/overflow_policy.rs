//! Overflow policies for a sink's bounded event queue
//!
//! A sink queue has two caps: an event count and a byte budget over the
//! queued messages. When an enqueue would break either cap, the policy
//! decides which event is lost. Producers are never blocked either way.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Policy for handling queue overflow
///
/// # Example
///
/// ```
/// use rust_group_logger::OverflowPolicy;
///
/// assert_eq!(OverflowPolicy::default(), OverflowPolicy::DropNewest);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Reject the incoming event and keep everything already queued
    #[default]
    DropNewest,

    /// Evict events from the head of the queue until the incoming one fits
    ///
    /// An event whose message alone exceeds the byte budget is still dropped.
    DropOldest,
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::DropNewest => write!(f, "DropNewest"),
            OverflowPolicy::DropOldest => write!(f, "DropOldest"),
        }
    }
}

/// Callback type for overflow notifications
///
/// Called with the sink name and the total count of dropped events so far.
pub type OverflowCallback = Arc<dyn Fn(&str, u64) + Send + Sync>;
