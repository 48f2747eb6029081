//! Timestamp rendering for text output
//!
//! Formatting a calendar date is the expensive part of a log line, and most
//! consecutive events share the same second. [`SecondCache`] keeps the
//! `YY.MM.DD HH:MM:SS` prefix for the last seen second and only re-renders it
//! when the whole-second value changes. The sub-second part is appended per
//! event.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Time zone used when rendering the calendar part of a timestamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneMode {
    #[default]
    Local,
    Utc,
}

/// Date-time prefix cache keyed by whole seconds since the epoch
#[derive(Debug, Clone)]
pub struct SecondCache {
    zone: TimeZoneMode,
    second: Option<i64>,
    rendered: String,
    refreshes: u64,
}

impl SecondCache {
    /// Width of the cached prefix: `YY.MM.DD HH:MM:SS`
    pub const WIDTH: usize = 17;

    #[must_use]
    pub fn new(zone: TimeZoneMode) -> Self {
        Self {
            zone,
            second: None,
            rendered: String::with_capacity(Self::WIDTH),
            refreshes: 0,
        }
    }

    /// Calendar prefix for `timestamp`, re-rendered only on a new second
    pub fn date_time(&mut self, timestamp: &DateTime<Utc>) -> &str {
        let second = timestamp.timestamp();
        if self.second != Some(second) {
            self.rendered = match self.zone {
                TimeZoneMode::Local => timestamp
                    .with_timezone(&Local)
                    .format("%y.%m.%d %H:%M:%S")
                    .to_string(),
                TimeZoneMode::Utc => timestamp.format("%y.%m.%d %H:%M:%S").to_string(),
            };
            self.second = Some(second);
            self.refreshes += 1;
        }
        &self.rendered
    }

    /// Microseconds within the current second, zero padded to six digits
    #[must_use]
    pub fn micros(timestamp: &DateTime<Utc>) -> String {
        format!("{:0>6}", timestamp.timestamp_subsec_micros())
    }

    /// How many times the prefix has been rendered
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }

    #[must_use]
    pub fn zone(&self) -> TimeZoneMode {
        self.zone
    }
}

impl Default for SecondCache {
    fn default() -> Self {
        Self::new(TimeZoneMode::default())
    }
}
