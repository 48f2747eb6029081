//! Log level definitions
//!
//! Levels are ordered by increasing verbosity. A threshold of `Info` enables
//! `Critical`, `Error`, `Warn` and `Info` calls; `Off` enables nothing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deserialization goes through `FromStr`, so config documents accept the same
/// spellings as `parse`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[repr(u8)]
pub enum Level {
    Off = 0,
    Critical = 1,
    Error = 2,
    Warn = 3,
    #[default]
    Info = 4,
    Verbose = 5,
    Debug = 6,
    Trace = 7,
}

impl Level {
    pub const ALL: [Level; 8] = [
        Level::Off,
        Level::Critical,
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Verbose,
        Level::Debug,
        Level::Trace,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            Level::Off => "OFF",
            Level::Critical => "CRITICAL",
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Verbose => "VERBOSE",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    /// Single-character code used by the short level style
    pub fn short_char(&self) -> char {
        match self {
            Level::Off => 'O',
            Level::Critical => 'C',
            Level::Error => 'E',
            Level::Warn => 'W',
            Level::Info => 'I',
            Level::Verbose => 'V',
            Level::Debug => 'D',
            Level::Trace => 'T',
        }
    }

    /// True when a threshold of `self` lets a call at `level` through.
    #[inline]
    pub fn is_enabled_for(self, level: Level) -> bool {
        level != Level::Off && self >= level
    }

    #[inline]
    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub(crate) fn from_u8(value: u8) -> Level {
        Level::ALL
            .get(usize::from(value))
            .copied()
            .unwrap_or(Level::Trace)
    }

    #[cfg(feature = "console")]
    pub fn color(&self) -> colored::Color {
        use colored::Color;
        match self {
            Level::Off => Color::TrueColor { r: 165, g: 42, b: 42 },
            Level::Critical => Color::Red,
            Level::Error => Color::TrueColor { r: 255, g: 69, b: 0 },
            Level::Warn => Color::TrueColor { r: 255, g: 165, b: 0 },
            Level::Info => Color::TrueColor { r: 34, g: 139, b: 34 },
            Level::Verbose => Color::TrueColor { r: 0, g: 100, b: 0 },
            Level::Debug => Color::TrueColor { r: 0, g: 0, b: 205 },
            Level::Trace => Color::BrightBlack,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OFF" => Ok(Level::Off),
            "CRITICAL" | "CRIT" => Ok(Level::Critical),
            "ERROR" => Ok(Level::Error),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "INFO" => Ok(Level::Info),
            "VERBOSE" => Ok(Level::Verbose),
            "DEBUG" => Ok(Level::Debug),
            "TRACE" => Ok(Level::Trace),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

impl TryFrom<String> for Level {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}
