//! Writers over `std::io::Write` sinks

use crate::core::{Level, LoggerError, Result, Writer};
use parking_lot::Mutex;
use std::io::{self, Write};

/// A writer over a handle that can be written through a shared reference,
/// such as `File`, `Stdout` or `Stderr`
///
/// No locking is added; concurrent records may interleave unless the writer
/// is wrapped in a [`SafeWriter`](super::SafeWriter).
#[derive(Debug)]
pub struct StreamWriter<W> {
    inner: W,
}

impl<W> StreamWriter<W>
where
    for<'a> &'a W: Write,
{
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl StreamWriter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl StreamWriter<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W> Writer for StreamWriter<W>
where
    W: Send + Sync,
    for<'a> &'a W: Write,
{
    fn write(&self, _level: Level, data: &[u8]) -> Result<usize> {
        let mut sink = &self.inner;
        sink.write_all(data)?;
        Ok(data.len())
    }

    fn flush(&self) -> Result<()> {
        let mut sink = &self.inner;
        sink.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "StreamWriter"
    }
}

/// A writer owning an `io::Write` sink behind a mutex
///
/// # Example
///
/// ```
/// use rust_kvlog::prelude::*;
///
/// let writer = IoWriter::new(Vec::new());
/// writer.write(Level::INFO, b"line\n").unwrap();
/// assert_eq!(writer.into_inner(), b"line\n");
/// ```
#[derive(Debug)]
pub struct IoWriter<W> {
    inner: Mutex<Option<W>>,
}

impl<W: Write + Send> IoWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: Mutex::new(Some(inner)),
        }
    }

    /// Run `f` with exclusive access to the sink; `None` once closed
    pub fn with_inner<R>(&self, f: impl FnOnce(&mut W) -> R) -> Option<R> {
        self.inner.lock().as_mut().map(f)
    }

    /// Take the sink back; returns `W::default()` if the writer was closed
    pub fn into_inner(self) -> W
    where
        W: Default,
    {
        self.inner.into_inner().unwrap_or_default()
    }
}

impl<W: Write + Send> Writer for IoWriter<W> {
    fn write(&self, _level: Level, data: &[u8]) -> Result<usize> {
        match self.inner.lock().as_mut() {
            Some(sink) => {
                sink.write_all(data)?;
                Ok(data.len())
            }
            None => Err(LoggerError::writer("IoWriter", "the writer has been closed")),
        }
    }

    fn flush(&self) -> Result<()> {
        if let Some(sink) = self.inner.lock().as_mut() {
            sink.flush()?;
        }
        Ok(())
    }

    /// Flushes and drops the sink
    fn close(&self) -> Result<()> {
        if let Some(mut sink) = self.inner.lock().take() {
            sink.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "IoWriter"
    }
}
