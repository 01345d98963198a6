//! Writers wrapping other writers

use super::io_adapter::{to_io_writer, IoAdapter};
use crate::core::{Level, LoggerError, Result, Writer};
use parking_lot::Mutex;
use std::fmt;
use std::io::{BufWriter, Write};
use std::sync::Arc;

/// Lets only one write proceed at a time
///
/// Needed in front of any writer whose writes may interleave, so that each
/// record lands contiguously.
#[derive(Debug)]
pub struct SafeWriter<W> {
    inner: W,
    lock: Mutex<()>,
}

impl<W: Writer> SafeWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

impl<W: Writer> Writer for SafeWriter<W> {
    fn write(&self, level: Level, data: &[u8]) -> Result<usize> {
        let _guard = self.lock.lock();
        self.inner.write(level, data)
    }

    fn flush(&self) -> Result<()> {
        let _guard = self.lock.lock();
        self.inner.flush()
    }

    fn close(&self) -> Result<()> {
        let _guard = self.lock.lock();
        self.inner.close()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Drops records below a level before they reach the wrapped writer
#[derive(Debug)]
pub struct LevelWriter<W> {
    min: Level,
    inner: W,
}

impl<W: Writer> LevelWriter<W> {
    pub fn new(min: Level, inner: W) -> Self {
        Self { min, inner }
    }
}

impl<W: Writer> Writer for LevelWriter<W> {
    fn write(&self, level: Level, data: &[u8]) -> Result<usize> {
        if level < self.min {
            return Ok(0);
        }
        self.inner.write(level, data)
    }

    fn flush(&self) -> Result<()> {
        self.inner.flush()
    }

    fn close(&self) -> Result<()> {
        self.inner.close()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Tries each writer in turn until one succeeds
///
/// # Example
///
/// ```
/// use rust_kvlog::prelude::*;
///
/// let primary = IoWriter::new(Vec::new());
/// primary.close().unwrap();
/// let writer = FailoverWriter::new()
///     .with(primary)
///     .with(DiscardWriter);
/// assert!(writer.write(Level::INFO, b"kept\n").is_ok());
/// ```
#[derive(Default)]
pub struct FailoverWriter {
    writers: Vec<Box<dyn Writer>>,
}

impl FailoverWriter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, writer: impl Writer + 'static) -> Self {
        self.writers.push(Box::new(writer));
        self
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }
}

impl From<Vec<Box<dyn Writer>>> for FailoverWriter {
    fn from(writers: Vec<Box<dyn Writer>>) -> Self {
        Self { writers }
    }
}

impl Writer for FailoverWriter {
    /// Returns the last error if every writer failed
    fn write(&self, level: Level, data: &[u8]) -> Result<usize> {
        let mut last_err = None;
        for writer in &self.writers {
            match writer.write(level, data) {
                Ok(n) => return Ok(n),
                Err(e) => last_err = Some(e),
            }
        }
        last_err.map_or(Ok(0), Err)
    }

    fn flush(&self) -> Result<()> {
        fan_out(self.writers.iter().map(|w| w.flush()))
    }

    fn close(&self) -> Result<()> {
        fan_out(self.writers.iter().map(|w| w.close()))
    }

    fn name(&self) -> &str {
        "FailoverWriter"
    }
}

impl fmt::Debug for FailoverWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.writers.iter().map(|w| w.name()).collect();
        f.debug_struct("FailoverWriter").field("writers", &names).finish()
    }
}

/// Runs every operation and keeps the first error
fn fan_out(results: impl Iterator<Item = Result<()>>) -> Result<()> {
    let mut first_err = None;
    for result in results {
        if let Err(e) = result {
            first_err.get_or_insert(e);
        }
    }
    first_err.map_or(Ok(()), Err)
}

type Selector = Box<dyn Fn(Level) -> Option<usize> + Send + Sync>;

/// Routes each record to one of several writers by level
///
/// The selector returns an index into the writer list, or `None` to drop
/// the record.
pub struct SplitWriter {
    writers: Vec<Arc<dyn Writer>>,
    select: Selector,
}

impl SplitWriter {
    pub fn new<F>(writers: Vec<Arc<dyn Writer>>, select: F) -> Self
    where
        F: Fn(Level) -> Option<usize> + Send + Sync + 'static,
    {
        Self {
            writers,
            select: Box::new(select),
        }
    }

    /// Records at or above `threshold` go to `high`, the rest to `low`
    pub fn by_threshold(
        threshold: Level,
        low: impl Writer + 'static,
        high: impl Writer + 'static,
    ) -> Self {
        let writers: Vec<Arc<dyn Writer>> = vec![Arc::new(low), Arc::new(high)];
        Self::new(writers, move |level| Some(usize::from(level >= threshold)))
    }
}

impl Writer for SplitWriter {
    fn write(&self, level: Level, data: &[u8]) -> Result<usize> {
        match (self.select)(level) {
            Some(index) => match self.writers.get(index) {
                Some(writer) => writer.write(level, data),
                None => Err(LoggerError::writer(
                    "SplitWriter",
                    format!("no writer at index {} for level {}", index, level),
                )),
            },
            None => Ok(0),
        }
    }

    fn flush(&self) -> Result<()> {
        fan_out(self.writers.iter().map(|w| w.flush()))
    }

    fn close(&self) -> Result<()> {
        fan_out(self.writers.iter().map(|w| w.close()))
    }

    fn name(&self) -> &str {
        "SplitWriter"
    }
}

impl fmt::Debug for SplitWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitWriter")
            .field("writers", &self.writers.len())
            .finish()
    }
}

/// Collects records in memory and passes them on in large chunks
///
/// The buffer is flushed when full, on `flush`/`close`, and when dropped.
/// Chunks reach the wrapped writer at [`Level::MAX`].
pub struct BufferWriter<W: Writer> {
    buffer: Mutex<BufWriter<IoAdapter<W>>>,
}

impl<W: Writer> BufferWriter<W> {
    pub fn new(inner: W, capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(BufWriter::with_capacity(capacity, to_io_writer(inner))),
        }
    }

    /// Bytes waiting in the buffer
    pub fn buffered(&self) -> usize {
        self.buffer.lock().buffer().len()
    }
}

impl<W: Writer> Writer for BufferWriter<W> {
    fn write(&self, _level: Level, data: &[u8]) -> Result<usize> {
        self.buffer.lock().write_all(data)?;
        Ok(data.len())
    }

    fn flush(&self) -> Result<()> {
        let mut buffer = self.buffer.lock();
        buffer.flush()?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut buffer = self.buffer.lock();
        buffer.flush()?;
        buffer.get_ref().get_ref().close()
    }

    fn name(&self) -> &str {
        "BufferWriter"
    }
}

impl<W: Writer> fmt::Debug for BufferWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferWriter")
            .field("buffered", &self.buffered())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writers::{writer_fn, DiscardWriter, IoWriter};
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Seen = Arc<Mutex<Vec<(Level, Vec<u8>)>>>;

    fn recording() -> (Seen, impl Writer) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let writer = writer_fn(move |level, data| {
            sink.lock().push((level, data.to_vec()));
            Ok(data.len())
        });
        (seen, writer)
    }

    fn failing() -> impl Writer {
        writer_fn(|_, _| Err(LoggerError::writer("test", "down")))
    }

    #[test]
    fn test_level_writer_filters() {
        let (seen, inner) = recording();
        let writer = LevelWriter::new(Level::WARN, inner);

        assert_eq!(writer.write(Level::INFO, b"info").unwrap(), 0);
        assert_eq!(writer.write(Level::ERROR, b"error").unwrap(), 5);
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(seen.lock()[0].0, Level::ERROR);
    }

    #[test]
    fn test_failover_uses_first_success() {
        let (seen, backup) = recording();
        let writer = FailoverWriter::new().with(failing()).with(backup);

        writer.write(Level::INFO, b"hello").unwrap();
        assert_eq!(seen.lock()[0].1, b"hello");
    }

    #[test]
    fn test_failover_all_failed() {
        let writer = FailoverWriter::new().with(failing()).with(failing());
        assert!(matches!(
            writer.write(Level::INFO, b"x"),
            Err(LoggerError::WriteFailure { .. })
        ));
        assert_eq!(FailoverWriter::new().write(Level::INFO, b"x").unwrap(), 0);
    }

    #[test]
    fn test_failover_flush_reaches_every_writer() {
        let flushes = Arc::new(AtomicUsize::new(0));
        let make = |counter: Arc<AtomicUsize>| {
            writer_fn(|_, data| Ok(data.len())).with_flush(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };
        let writer = FailoverWriter::new()
            .with(make(Arc::clone(&flushes)))
            .with(make(Arc::clone(&flushes)));
        writer.flush().unwrap();
        assert_eq!(flushes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_split_by_threshold() {
        let (low_seen, low) = recording();
        let (high_seen, high) = recording();
        let writer = SplitWriter::by_threshold(Level::ERROR, low, high);

        writer.write(Level::INFO, b"i").unwrap();
        writer.write(Level::ERROR, b"e").unwrap();
        writer.write(Level::FATAL, b"f").unwrap();

        assert_eq!(low_seen.lock().len(), 1);
        assert_eq!(high_seen.lock().len(), 2);
    }

    #[test]
    fn test_split_drop_and_bad_index() {
        let writer = SplitWriter::new(vec![Arc::new(DiscardWriter) as Arc<dyn Writer>], |level| {
            if level == Level::DEBUG {
                None
            } else {
                Some(3)
            }
        });
        assert_eq!(writer.write(Level::DEBUG, b"d").unwrap(), 0);
        assert!(writer.write(Level::INFO, b"i").is_err());
    }

    #[test]
    fn test_buffer_writer_holds_until_flush() {
        let (seen, inner) = recording();
        let writer = BufferWriter::new(inner, 1024);

        writer.write(Level::INFO, b"one\n").unwrap();
        writer.write(Level::INFO, b"two\n").unwrap();
        assert!(seen.lock().is_empty());
        assert_eq!(writer.buffered(), 8);

        writer.flush().unwrap();
        let seen = seen.lock();
        let bytes: Vec<u8> = seen.iter().flat_map(|(_, d)| d.clone()).collect();
        assert_eq!(bytes, b"one\ntwo\n");
        assert!(seen.iter().all(|(level, _)| *level == Level::MAX));
    }

    #[test]
    fn test_buffer_writer_flushes_on_drop() {
        let (seen, inner) = recording();
        {
            let writer = BufferWriter::new(inner, 1024);
            writer.write(Level::INFO, b"pending").unwrap();
        }
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_safe_writer_forwards() {
        let writer = SafeWriter::new(IoWriter::new(Vec::new()));
        writer.write(Level::INFO, b"abc").unwrap();
        assert_eq!(writer.get_ref().with_inner(|v| v.clone()), Some(b"abc".to_vec()));
    }
}
