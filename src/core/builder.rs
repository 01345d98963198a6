//! Fluent log builder
//!
//! A [`LogBuilder`] is a pending record at one level. The gate runs when it
//! is created: if the record is rejected the builder holds no buffer and
//! every chained call does nothing.

use super::error::Result;
use super::field::{Field, FieldValue};
use super::level::Level;
use super::logger::{Logger, Outcome, CALL_FIELDS_HINT};
use super::pool::FieldBuffer;
use super::record::CallSite;
use std::borrow::Cow;
use std::fmt;

/// Builder for one structured record
///
/// # Example
///
/// ```
/// use rust_kvlog::prelude::*;
///
/// let logger = Logger::new(DiscardWriter);
///
/// logger.info_builder()
///     .k("user_id", 12345)
///     .k("latency_ms", 42.5)
///     .lazy("expensive", || "only computed when emitted")
///     .msg("Request processed");
/// ```
#[must_use = "a log builder does nothing until a message is set"]
pub struct LogBuilder<'l> {
    logger: &'l Logger,
    level: Level,
    fields: Option<FieldBuffer<'static>>,
}

impl<'l> LogBuilder<'l> {
    pub(crate) fn new(logger: &'l Logger, level: Level) -> Self {
        let fields = logger
            .gate(level)
            .then(|| logger.open_buffer(CALL_FIELDS_HINT));
        Self {
            logger,
            level,
            fields,
        }
    }

    /// Whether the record passed the gate
    #[inline]
    pub fn is_open(&self) -> bool {
        self.fields.is_some()
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Add a key-value field
    pub fn k(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<FieldValue>) -> Self {
        if let Some(fields) = self.fields.as_mut() {
            fields.push(Field::new(key, value));
        }
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        if let Some(fields) = self.fields.as_mut() {
            fields.push(field);
        }
        self
    }

    pub fn fields(mut self, extra: impl IntoIterator<Item = Field>) -> Self {
        if let Some(fields) = self.fields.as_mut() {
            fields.extend(extra);
        }
        self
    }

    /// Add a field computed only if the record is emitted
    pub fn lazy<F, V>(mut self, key: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<FieldValue>,
    {
        if let Some(fields) = self.fields.as_mut() {
            fields.push(Field::lazy(key, f));
        }
        self
    }

    /// Add the error as the `err` field
    pub fn e<E: std::error::Error + ?Sized>(mut self, err: &E) -> Self {
        if let Some(fields) = self.fields.as_mut() {
            fields.push(Field::error(err));
        }
        self
    }

    /// Emit with `message`, returning what happened
    #[track_caller]
    pub fn try_msg(self, message: &str) -> Result<Outcome> {
        let site = CallSite::caller();
        let Some(mut fields) = self.fields else {
            return Ok(Outcome::Filtered);
        };
        self.logger
            .emit_record(self.level, message, &mut fields, site)
            .map(Outcome::finish)
    }

    /// Emit with `message`; write errors are reported on stderr
    #[track_caller]
    pub fn msg(self, message: &str) {
        let writer = self.logger.writer().clone();
        if let Err(err) = self.try_msg(message) {
            eprintln!("[LOGGER ERROR] {}: {}", writer.name(), err);
        }
    }

    /// Emit with a formatted message; nothing is formatted for a closed builder
    #[track_caller]
    pub fn msg_fmt(self, args: fmt::Arguments<'_>) {
        if !self.is_open() {
            return;
        }
        match args.as_str() {
            Some(message) => self.msg(message),
            None => self.msg(&args.to_string()),
        }
    }
}

impl fmt::Debug for LogBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogBuilder")
            .field("level", &self.level)
            .field("fields", &self.fields)
            .finish()
    }
}

impl Logger {
    /// Start a record at `level`
    pub fn log_builder(&self, level: Level) -> LogBuilder<'_> {
        LogBuilder::new(self, level)
    }

    pub fn trace_builder(&self) -> LogBuilder<'_> {
        LogBuilder::new(self, Level::TRACE)
    }

    pub fn debug_builder(&self) -> LogBuilder<'_> {
        LogBuilder::new(self, Level::DEBUG)
    }

    /// Create an info-level log builder
    ///
    /// # Example
    ///
    /// ```
    /// use rust_kvlog::prelude::*;
    ///
    /// let logger = Logger::new(DiscardWriter);
    /// logger.info_builder().k("variable", "value").msg("Detailed trace");
    /// ```
    pub fn info_builder(&self) -> LogBuilder<'_> {
        LogBuilder::new(self, Level::INFO)
    }

    pub fn warn_builder(&self) -> LogBuilder<'_> {
        LogBuilder::new(self, Level::WARN)
    }

    pub fn error_builder(&self) -> LogBuilder<'_> {
        LogBuilder::new(self, Level::ERROR)
    }

    pub fn panic_builder(&self) -> LogBuilder<'_> {
        LogBuilder::new(self, Level::PANIC)
    }

    pub fn fatal_builder(&self) -> LogBuilder<'_> {
        LogBuilder::new(self, Level::FATAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pool::Pools;
    use crate::writers::IoWriter;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn capture() -> (Logger, Arc<IoWriter<Vec<u8>>>) {
        let sink = Arc::new(IoWriter::new(Vec::new()));
        let logger = Logger::new(Arc::clone(&sink)).with_pools(Pools::leaked());
        (logger, sink)
    }

    fn output(sink: &IoWriter<Vec<u8>>) -> String {
        sink.with_inner(|buf| String::from_utf8(buf.clone()).unwrap())
            .unwrap_or_default()
    }

    #[test]
    fn test_builder_fields_in_order() {
        let (logger, sink) = capture();
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");

        logger
            .with_kv("svc", "api")
            .warn_builder()
            .k("user", 7)
            .field(Field::new("ok", false))
            .e(&err)
            .msg("lookup failed");

        let line = output(&sink);
        assert!(
            line.contains(" lvl=WARN svc=api user=7 ok=false err=missing msg=\"lookup failed\"\n"),
            "{}",
            line
        );
    }

    #[test]
    fn test_closed_builder_is_inert() {
        let (logger, sink) = capture();
        let logger = logger.with_level(Level::ERROR);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let builder = logger.info_builder();
        assert!(!builder.is_open());
        let outcome = builder
            .k("a", 1)
            .lazy("n", move || counter.fetch_add(1, Ordering::SeqCst))
            .try_msg("ignored")
            .unwrap();

        assert_eq!(outcome, Outcome::Filtered);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(logger.pools().fields.metrics().acquired(), 0);
        assert!(output(&sink).is_empty());
    }

    #[test]
    fn test_lazy_called_once_when_emitted() {
        let (logger, _sink) = capture();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let outcome = logger
            .debug_builder()
            .lazy("n", move || counter.fetch_add(1, Ordering::SeqCst))
            .k("after", 1)
            .try_msg("emitted")
            .unwrap();

        assert_eq!(outcome, Outcome::Delivered);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_msg_fmt() {
        let (logger, sink) = capture();
        logger.info_builder().msg_fmt(format_args!("{} + {}", 1, 2));
        logger.info_builder().msg_fmt(format_args!("plain"));

        let out = output(&sink);
        assert!(out.contains("msg=\"1 + 2\"\n"));
        assert!(out.contains("msg=plain\n"));
    }

    #[test]
    fn test_buffers_return_to_pool() {
        let (logger, _sink) = capture();
        for _ in 0..10 {
            logger.info_builder().k("i", 1).msg("loop");
        }
        let metrics = logger.pools().fields.metrics();
        assert_eq!(metrics.acquired(), 10);
        assert_eq!(metrics.released(), 10);
        assert_eq!(metrics.fresh_allocations(), 1);
    }
}
