//! Line formatting for sink workers
//!
//! A sink's worker thread owns one [`Formatter`] and feeds it every event it
//! drains; the formatter appends the rendered line to the staging buffer.
//!
//! - [`TextFormatter`]: `YY.MM.DD HH:MM:SS.uuuuuu  thread  LEVEL     name  message`
//! - [`JsonFormatter`]: one JSON object per line

use super::error::Result;
use super::event::{Event, THREAD_NAME_MAX};
use super::level::Level;
use super::timestamp::{SecondCache, TimeZoneMode};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

const SEPARATOR: &[u8] = b"  ";

/// Width the full level word is padded to
pub const LEVEL_WIDTH: usize = 8;

/// Turns one event into bytes for a backend.
pub trait Formatter: Send {
    /// Append the rendered event, including the trailing newline, to `out`
    fn format(&mut self, event: &Event, out: &mut Vec<u8>) -> Result<()>;

    /// Bytes a line may take beyond its message
    fn line_overhead(&self) -> usize {
        128
    }
}

/// Which thread detail goes into a text line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadInfo {
    #[default]
    None,
    /// Thread name, padded or truncated to a fixed width
    Name,
    /// Numeric thread id as `T:<id>`
    Id,
}

/// How the level is spelled in a text line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelStyle {
    /// Full word padded to [`LEVEL_WIDTH`]
    #[default]
    Full,
    /// Single character code
    Short,
}

/// Output format selector used by sink configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy)]
enum Segment {
    Fraction,
    Level(Level),
    Name,
    Message(Level),
}

/// Human readable single-line formatter
#[derive(Debug, Clone)]
pub struct TextFormatter {
    with_color: bool,
    thread: ThreadInfo,
    level_style: LevelStyle,
    cache: SecondCache,
}

impl TextFormatter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            with_color: false,
            thread: ThreadInfo::default(),
            level_style: LevelStyle::default(),
            cache: SecondCache::default(),
        }
    }

    /// Wrap each segment in ANSI styling. Ignored without the `console` feature.
    #[must_use]
    pub fn with_color(mut self, with_color: bool) -> Self {
        self.with_color = with_color;
        self
    }

    #[must_use]
    pub fn with_thread(mut self, thread: ThreadInfo) -> Self {
        self.thread = thread;
        self
    }

    #[must_use]
    pub fn with_level_style(mut self, style: LevelStyle) -> Self {
        self.level_style = style;
        self
    }

    #[must_use]
    pub fn with_time_zone(mut self, zone: TimeZoneMode) -> Self {
        self.cache = SecondCache::new(zone);
        self
    }

    /// Number of times the calendar prefix was re-rendered
    pub fn date_refreshes(&self) -> u64 {
        self.cache.refresh_count()
    }

    #[cfg(feature = "console")]
    fn push(out: &mut Vec<u8>, text: &str, segment: Segment, with_color: bool) {
        use colored::Colorize;

        if !with_color {
            out.extend_from_slice(text.as_bytes());
            return;
        }
        let styled = match segment {
            Segment::Fraction => text.color(colored::Color::BrightBlack),
            Segment::Level(level) => text.color(level.color()).bold(),
            Segment::Name => text.bold(),
            Segment::Message(level) if level <= Level::Error => text.bold(),
            Segment::Message(level) if level >= Level::Debug => text.italic(),
            Segment::Message(_) => text.normal(),
        };
        out.extend_from_slice(styled.to_string().as_bytes());
    }

    #[cfg(not(feature = "console"))]
    fn push(out: &mut Vec<u8>, text: &str, _segment: Segment, _with_color: bool) {
        out.extend_from_slice(text.as_bytes());
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for TextFormatter {
    fn format(&mut self, event: &Event, out: &mut Vec<u8>) -> Result<()> {
        let with_color = self.with_color;

        out.extend_from_slice(self.cache.date_time(&event.timestamp).as_bytes());
        let fraction = format!(".{}", SecondCache::micros(&event.timestamp));
        Self::push(out, &fraction, Segment::Fraction, with_color);
        out.extend_from_slice(SEPARATOR);

        match self.thread {
            ThreadInfo::None => {}
            ThreadInfo::Name => {
                let name = event.thread_name.as_deref().unwrap_or("");
                let name: String = name.chars().take(THREAD_NAME_MAX).collect();
                out.extend_from_slice(format!("{:<width$}", name, width = THREAD_NAME_MAX).as_bytes());
                out.extend_from_slice(SEPARATOR);
            }
            ThreadInfo::Id => {
                out.extend_from_slice(format!("T:{:<6}", event.thread_id).as_bytes());
                out.extend_from_slice(SEPARATOR);
            }
        }

        let level = match self.level_style {
            LevelStyle::Full => format!("{:<width$}", event.level.to_str(), width = LEVEL_WIDTH),
            LevelStyle::Short => event.level.short_char().to_string(),
        };
        Self::push(out, &level, Segment::Level(event.level), with_color);
        out.extend_from_slice(SEPARATOR);

        Self::push(out, &event.logger_name, Segment::Name, with_color);
        out.extend_from_slice(SEPARATOR);

        Self::push(out, &event.message, Segment::Message(event.level), with_color);
        out.push(b'\n');
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    timestamp: String,
    level: &'static str,
    thread_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_name: Option<&'a str>,
    logger: &'a str,
    message: &'a str,
}

/// JSON lines formatter, one object per event
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Formatter for JsonFormatter {
    fn format(&mut self, event: &Event, out: &mut Vec<u8>) -> Result<()> {
        let line = JsonLine {
            timestamp: event.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            level: event.level.to_str(),
            thread_id: event.thread_id,
            thread_name: event.thread_name.as_deref(),
            logger: &event.logger_name,
            message: &event.message,
        };
        serde_json::to_writer(&mut *out, &line)?;
        out.push(b'\n');
        Ok(())
    }
}
