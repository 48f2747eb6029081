//! Backend trait for sink output devices

use super::error::Result;

/// Device a sink's worker thread writes formatted batches to.
///
/// Only the worker thread of the owning sink ever calls these methods.
pub trait Backend: Send {
    /// Write one contiguous batch of formatted lines
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Force previously written bytes to become visible on the device
    fn flush(&mut self) -> Result<()>;

    fn name(&self) -> &str;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
