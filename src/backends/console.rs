//! Console backend implementation

use crate::core::{Backend, Result};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleStream {
    #[default]
    Stdout,
    Stderr,
}

/// Writes batches to the process's standard output or standard error
#[derive(Debug, Default)]
pub struct ConsoleBackend {
    stream: ConsoleStream,
}

impl ConsoleBackend {
    #[must_use]
    pub fn new(stream: ConsoleStream) -> Self {
        Self { stream }
    }

    #[must_use]
    pub fn stdout() -> Self {
        Self::new(ConsoleStream::Stdout)
    }

    #[must_use]
    pub fn stderr() -> Self {
        Self::new(ConsoleStream::Stderr)
    }

    pub fn stream(&self) -> ConsoleStream {
        self.stream
    }
}

impl Backend for ConsoleBackend {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        // One locked write per batch keeps lines from other writers out of it
        match self.stream {
            ConsoleStream::Stdout => io::stdout().lock().write_all(bytes)?,
            ConsoleStream::Stderr => io::stderr().lock().write_all(bytes)?,
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        match self.stream {
            ConsoleStream::Stdout => io::stdout().flush()?,
            ConsoleStream::Stderr => io::stderr().flush()?,
        }
        Ok(())
    }

    fn name(&self) -> &str {
        match self.stream {
            ConsoleStream::Stdout => "stdout",
            ConsoleStream::Stderr => "stderr",
        }
    }
}
