//! Writer trait for log output destinations

use super::error::Result;
use super::level::Level;

/// A sink for encoded records
///
/// Implementations do not have to make concurrent writes atomic; wrap them
/// in a [`SafeWriter`](crate::writers::SafeWriter) for that.
pub trait Writer: Send + Sync {
    /// Write one encoded record, returning the number of bytes accepted
    fn write(&self, level: Level, data: &[u8]) -> Result<usize>;

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Release the underlying resource; later writes may fail
    fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Name used in error reports
    fn name(&self) -> &str {
        "writer"
    }
}

impl<W: Writer + ?Sized> Writer for std::sync::Arc<W> {
    fn write(&self, level: Level, data: &[u8]) -> Result<usize> {
        (**self).write(level, data)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<W: Writer + ?Sized> Writer for Box<W> {
    fn write(&self, level: Level, data: &[u8]) -> Result<usize> {
        (**self).write(level, data)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
