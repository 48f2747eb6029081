//! Output devices a sink's worker thread writes to

pub mod console;
pub mod file;
pub mod memory;
pub mod rotating_file;

pub use console::{ConsoleBackend, ConsoleStream};
pub use file::FileBackend;
pub use memory::{MemoryBackend, MemoryHandle};
pub use rotating_file::{RotatingFileBackend, RotationPolicy, RotationStrategy};
