//! Writer implementations
//!
//! Writers are plain values implementing [`Writer`]; the combinators in
//! [`combinators`] wrap other writers to add locking, filtering, failover,
//! routing or buffering.

pub mod combinators;
#[cfg(feature = "console")]
pub mod console;
pub mod file;
pub mod io_adapter;
pub mod stream;

pub use combinators::{BufferWriter, FailoverWriter, LevelWriter, SafeWriter, SplitWriter};
#[cfg(feature = "console")]
pub use console::ConsoleWriter;
pub use file::{file_writer, SizedRotatingFile};
pub use io_adapter::{to_io_writer, IoAdapter};
pub use stream::{IoWriter, StreamWriter};

pub use crate::core::Writer;

use crate::core::{Level, Result};
use std::fmt;

/// Accepts and drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardWriter;

impl Writer for DiscardWriter {
    fn write(&self, _level: Level, _data: &[u8]) -> Result<usize> {
        Ok(0)
    }

    fn name(&self) -> &str {
        "DiscardWriter"
    }
}

/// A writer made of closures; see [`writer_fn`]
pub struct WriterFn<W> {
    write: W,
    flush: Option<Box<dyn Fn() -> Result<()> + Send + Sync>>,
    close: Option<Box<dyn Fn() -> Result<()> + Send + Sync>>,
}

/// Adapt a write closure to [`Writer`]
///
/// # Example
///
/// ```
/// use rust_kvlog::prelude::*;
///
/// let writer = writer_fn(|_level, data| Ok(data.len()));
/// assert_eq!(writer.write(Level::INFO, b"abc").unwrap(), 3);
/// ```
pub fn writer_fn<W>(write: W) -> WriterFn<W>
where
    W: Fn(Level, &[u8]) -> Result<usize> + Send + Sync,
{
    WriterFn {
        write,
        flush: None,
        close: None,
    }
}

impl<W> WriterFn<W> {
    #[must_use]
    pub fn with_flush(mut self, flush: impl Fn() -> Result<()> + Send + Sync + 'static) -> Self {
        self.flush = Some(Box::new(flush));
        self
    }

    #[must_use]
    pub fn with_close(mut self, close: impl Fn() -> Result<()> + Send + Sync + 'static) -> Self {
        self.close = Some(Box::new(close));
        self
    }
}

impl<W> Writer for WriterFn<W>
where
    W: Fn(Level, &[u8]) -> Result<usize> + Send + Sync,
{
    fn write(&self, level: Level, data: &[u8]) -> Result<usize> {
        (self.write)(level, data)
    }

    fn flush(&self) -> Result<()> {
        self.flush.as_ref().map_or(Ok(()), |flush| flush())
    }

    fn close(&self) -> Result<()> {
        self.close.as_ref().map_or(Ok(()), |close| close())
    }

    fn name(&self) -> &str {
        "WriterFn"
    }
}

impl<W> fmt::Debug for WriterFn<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterFn")
            .field("flush", &self.flush.is_some())
            .field("close", &self.close.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_discard() {
        assert_eq!(DiscardWriter.write(Level::INFO, b"gone").unwrap(), 0);
        assert!(DiscardWriter.close().is_ok());
    }

    #[test]
    fn test_writer_fn_hooks() {
        let flushed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&flushed);
        let writer = writer_fn(|_, data| Ok(data.len())).with_flush(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(writer.write(Level::WARN, b"12345").unwrap(), 5);
        writer.flush().unwrap();
        writer.close().unwrap();
        assert_eq!(flushed.load(Ordering::SeqCst), 1);
    }
}
