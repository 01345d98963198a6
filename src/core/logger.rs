//! Main logger implementation
//!
//! A [`Logger`] is an immutable configuration. Every `with_*` method returns
//! a new logger sharing what it does not change; appending fields or hooks
//! copies them into a new allocation, so sibling loggers never see each
//! other's additions.

use super::encoder::Encoder;
use super::error::{LoggerError, Result};
use super::exit;
use super::field::{Field, FieldValue};
use super::hook::{self, Hook};
use super::level::Level;
use super::metrics::LoggerMetrics;
use super::pool::{FieldBuffer, Pools};
use super::record::{CallSite, PanicRecord, Record};
use super::writer::Writer;
use crate::encoders::TextEncoder;
use crate::writers::{SafeWriter, StreamWriter};
use chrono::Utc;
use std::borrow::Cow;
use std::fmt;
use std::io;
use std::sync::Arc;

/// Field capacity reserved for call-site fields when a buffer is opened
pub(crate) const CALL_FIELDS_HINT: usize = 4;

/// What happened to one log call
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The record was encoded and accepted by the writer
    Delivered,
    /// The encoder produced no bytes, so nothing was written
    Suppressed,
    /// The level or a hook rejected the record before any work was done
    Filtered,
    /// A fatal record was written and the terminator returned
    Fatal,
    /// A panic-level record was written; [`Outcome::finish`] panics with it
    Escalated(PanicRecord),
}

impl Outcome {
    /// Perform the terminal action of fatal and panic-level outcomes
    ///
    /// `Fatal` runs the exit hooks and terminates; it is only returned if
    /// the terminator was replaced and returned. `Escalated` panics with the
    /// [`PanicRecord`] as payload.
    pub fn finish(self) -> Outcome {
        match self {
            Outcome::Fatal => {
                exit::terminate();
                Outcome::Fatal
            }
            Outcome::Escalated(record) => std::panic::panic_any(record),
            other => other,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Outcome::Delivered)
    }
}

#[derive(Clone)]
pub struct Logger {
    name: Arc<str>,
    depth: usize,
    level: Level,
    writer: Arc<dyn Writer>,
    encoder: Arc<dyn Encoder>,
    fields: Arc<[Field]>,
    hooks: Arc<[Hook]>,
    metrics: Arc<LoggerMetrics>,
    pools: &'static Pools,
}

fn appended<T: Clone>(items: &Arc<[T]>, extra: impl IntoIterator<Item = T>) -> Arc<[T]> {
    items.iter().cloned().chain(extra).collect()
}

impl Logger {
    /// Create a logger writing to `writer`
    ///
    /// The logger emits every level, encodes with a quoting [`TextEncoder`]
    /// and has no name, fields or hooks.
    pub fn new(writer: impl Writer + 'static) -> Self {
        Self::new_shared(Arc::new(writer))
    }

    /// Same as [`Logger::new`] for a writer that is already shared
    pub fn new_shared(writer: Arc<dyn Writer>) -> Self {
        Self {
            name: Arc::from(""),
            depth: 0,
            level: Level::TRACE,
            writer,
            encoder: Arc::new(TextEncoder::new(true)),
            fields: Arc::from(Vec::new()),
            hooks: Arc::from(Vec::new()),
            metrics: Arc::new(LoggerMetrics::new()),
            pools: Pools::global(),
        }
    }

    #[must_use]
    pub fn with_name(&self, name: impl AsRef<str>) -> Logger {
        Logger {
            name: Arc::from(name.as_ref()),
            ..self.clone()
        }
    }

    /// Set the threshold; records below it are filtered
    ///
    /// # Panics
    ///
    /// If the level has a negative priority.
    #[must_use]
    pub fn with_level(&self, level: Level) -> Logger {
        if level.priority() < 0 {
            panic!(
                "{}",
                LoggerError::config(
                    "logger level",
                    format!("{} has negative priority {}", level, level.priority())
                )
            );
        }
        Logger {
            level,
            ..self.clone()
        }
    }

    /// Set the threshold by name; unknown names resolve to the fallback level
    #[must_use]
    pub fn with_level_name(&self, name: &str) -> Logger {
        self.with_level(Level::from_name(name))
    }

    #[must_use]
    pub fn with_writer(&self, writer: impl Writer + 'static) -> Logger {
        self.with_shared_writer(Arc::new(writer))
    }

    #[must_use]
    pub fn with_shared_writer(&self, writer: Arc<dyn Writer>) -> Logger {
        Logger {
            writer,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_encoder(&self, encoder: impl Encoder + 'static) -> Logger {
        self.with_shared_encoder(Arc::new(encoder))
    }

    #[must_use]
    pub fn with_shared_encoder(&self, encoder: Arc<dyn Encoder>) -> Logger {
        Logger {
            encoder,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_hook(&self, hook: Hook) -> Logger {
        self.with_hooks([hook])
    }

    #[must_use]
    pub fn with_hooks(&self, hooks: impl IntoIterator<Item = Hook>) -> Logger {
        Logger {
            hooks: appended(&self.hooks, hooks),
            ..self.clone()
        }
    }

    /// Add a context field emitted with every record of the new logger
    #[must_use]
    pub fn with_field(&self, field: Field) -> Logger {
        self.with_fields([field])
    }

    #[must_use]
    pub fn with_fields(&self, fields: impl IntoIterator<Item = Field>) -> Logger {
        Logger {
            fields: appended(&self.fields, fields),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_kv(
        &self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<FieldValue>,
    ) -> Logger {
        self.with_field(Field::new(key, value))
    }

    /// Set how many frames above the call site caller fields describe
    #[must_use]
    pub fn with_depth(&self, depth: usize) -> Logger {
        Logger {
            depth,
            ..self.clone()
        }
    }

    /// Increase the depth, for loggers used inside logging helpers
    ///
    /// # Panics
    ///
    /// If the depth would overflow.
    #[must_use]
    pub fn add_depth(&self, extra: usize) -> Logger {
        match self.depth.checked_add(extra) {
            Some(depth) => self.with_depth(depth),
            None => panic!(
                "{}",
                LoggerError::config("logger depth", format!("{} + {} overflows", self.depth, extra))
            ),
        }
    }

    /// Draw field and scratch buffers from `pools` instead of the global ones
    #[must_use]
    pub fn with_pools(&self, pools: &'static Pools) -> Logger {
        Logger {
            pools,
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn writer(&self) -> &Arc<dyn Writer> {
        &self.writer
    }

    pub fn encoder(&self) -> &Arc<dyn Encoder> {
        &self.encoder
    }

    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Counters shared by this logger and every logger derived from it
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    pub fn pools(&self) -> &'static Pools {
        self.pools
    }

    /// Whether `level` passes the threshold; hooks are not consulted
    #[inline]
    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    /// The level check followed by every hook
    #[inline]
    pub(crate) fn gate(&self, level: Level) -> bool {
        if self.is_enabled(level) && hook::allows(&self.hooks, &self.name, level) {
            true
        } else {
            self.metrics.record_filtered();
            false
        }
    }

    /// A pooled buffer holding the context fields
    pub(crate) fn open_buffer(&self, extra: usize) -> FieldBuffer<'static> {
        let mut buffer = self.pools.fields.acquire(self.fields.len() + extra);
        buffer.extend(self.fields.iter());
        buffer
    }

    /// Resolve, encode and write one gated record
    ///
    /// Both pooled buffers are released when this returns, on error too.
    pub(crate) fn emit_record(
        &self,
        level: Level,
        message: &str,
        fields: &mut FieldBuffer<'_>,
        site: CallSite<'_>,
    ) -> Result<Outcome> {
        let probe = Record {
            name: &self.name,
            time: Utc::now(),
            depth: self.depth,
            level,
            message,
            site,
            fields: &[],
        };
        for field in fields.as_mut_slice() {
            field.resolve(&probe);
        }
        let record = Record {
            fields: fields.as_slice(),
            ..probe
        };

        let mut scratch = self.pools.buffers.acquire();
        self.encoder.encode(scratch.as_mut_vec(), &record);

        let outcome = if scratch.is_empty() {
            self.metrics.record_suppressed();
            Outcome::Suppressed
        } else {
            match self.writer.write(level, scratch.as_bytes()) {
                Ok(_) => {
                    self.metrics.record_delivered();
                    Outcome::Delivered
                }
                Err(err) => {
                    self.metrics.record_write_failure();
                    if level < Level::PANIC {
                        return Err(err);
                    }
                    self.report(&err);
                    Outcome::Delivered
                }
            }
        };

        Ok(if level >= Level::FATAL {
            Outcome::Fatal
        } else if level >= Level::PANIC {
            Outcome::Escalated(PanicRecord::from(&record))
        } else {
            outcome
        })
    }

    fn report(&self, err: &LoggerError) {
        eprintln!("[LOGGER ERROR] {}: {}", self.writer.name(), err);
    }

    /// Log at `level` with an explicit call site
    ///
    /// Used by adapters that know the location better than `#[track_caller]`.
    pub fn log_at<I>(&self, level: Level, message: &str, fields: I, site: CallSite<'_>) -> Result<Outcome>
    where
        I: IntoIterator<Item = Field>,
    {
        if !self.gate(level) {
            return Ok(Outcome::Filtered);
        }
        let fields = fields.into_iter();
        let mut buffer = self.open_buffer(fields.size_hint().0);
        buffer.extend(fields);
        self.emit_record(level, message, &mut buffer, site)
            .map(Outcome::finish)
    }

    /// Log one record and report what happened
    ///
    /// Write errors are returned. Fatal records terminate the process and
    /// panic-level records panic with a [`PanicRecord`] after being written.
    #[track_caller]
    pub fn log<I>(&self, level: Level, message: &str, fields: I) -> Result<Outcome>
    where
        I: IntoIterator<Item = Field>,
    {
        self.log_at(level, message, fields, CallSite::caller())
    }

    #[track_caller]
    fn log_or_report<I>(&self, level: Level, message: &str, fields: I)
    where
        I: IntoIterator<Item = Field>,
    {
        if let Err(err) = self.log(level, message, fields) {
            self.report(&err);
        }
    }

    #[track_caller]
    pub fn trace<I: IntoIterator<Item = Field>>(&self, message: &str, fields: I) {
        self.log_or_report(Level::TRACE, message, fields)
    }

    #[track_caller]
    pub fn debug<I: IntoIterator<Item = Field>>(&self, message: &str, fields: I) {
        self.log_or_report(Level::DEBUG, message, fields)
    }

    #[track_caller]
    pub fn info<I: IntoIterator<Item = Field>>(&self, message: &str, fields: I) {
        self.log_or_report(Level::INFO, message, fields)
    }

    #[track_caller]
    pub fn warn<I: IntoIterator<Item = Field>>(&self, message: &str, fields: I) {
        self.log_or_report(Level::WARN, message, fields)
    }

    #[track_caller]
    pub fn error<I: IntoIterator<Item = Field>>(&self, message: &str, fields: I) {
        self.log_or_report(Level::ERROR, message, fields)
    }

    /// Log at `PANIC`, then panic with a [`PanicRecord`]
    #[track_caller]
    pub fn panic<I: IntoIterator<Item = Field>>(&self, message: &str, fields: I) {
        self.log_or_report(Level::PANIC, message, fields)
    }

    /// Log at `FATAL`, run the exit hooks and exit with status 1
    #[track_caller]
    pub fn fatal<I: IntoIterator<Item = Field>>(&self, message: &str, fields: I) {
        self.log_or_report(Level::FATAL, message, fields)
    }

    /// An `io::Write` turning every write into one record at `level`
    ///
    /// A trailing newline is removed from each write. The call site is the
    /// caller of this method.
    #[track_caller]
    pub fn to_writer(&self, level: Level) -> LogWriter {
        LogWriter {
            logger: self.clone(),
            level,
            site: CallSite::caller(),
        }
    }

    pub fn flush(&self) -> Result<()> {
        self.writer.flush()
    }

    pub fn close(&self) -> Result<()> {
        self.writer.close()
    }
}

impl Default for Logger {
    /// Text records to standard output, serialized by a [`SafeWriter`]
    fn default() -> Self {
        Self::new(SafeWriter::new(StreamWriter::stdout()))
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level)
            .field("depth", &self.depth)
            .field("fields", &self.fields)
            .field("hooks", &self.hooks.len())
            .field("writer", &self.writer.name())
            .finish()
    }
}

/// See [`Logger::to_writer`]
#[derive(Debug, Clone)]
pub struct LogWriter {
    logger: Logger,
    level: Level,
    site: CallSite<'static>,
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        let message = text.strip_suffix('\n').unwrap_or(&text);
        let message = message.strip_suffix('\r').unwrap_or(message);
        self.logger
            .log_at(self.level, message, [], self.site)
            .map_err(io::Error::from)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.logger.flush().map_err(io::Error::from)
    }
}

/// Builder for [`Logger`]
#[must_use = "builder methods return a new value"]
pub struct LoggerBuilder {
    name: String,
    level: Level,
    depth: usize,
    writer: Option<Arc<dyn Writer>>,
    encoder: Option<Arc<dyn Encoder>>,
    fields: Vec<Field>,
    hooks: Vec<Hook>,
    pools: &'static Pools,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            level: Level::TRACE,
            depth: 0,
            writer: None,
            encoder: None,
            fields: Vec::new(),
            hooks: Vec::new(),
            pools: Pools::global(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn writer(mut self, writer: impl Writer + 'static) -> Self {
        self.writer = Some(Arc::new(writer));
        self
    }

    pub fn shared_writer(mut self, writer: Arc<dyn Writer>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn encoder(mut self, encoder: impl Encoder + 'static) -> Self {
        self.encoder = Some(Arc::new(encoder));
        self
    }

    pub fn shared_encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn field(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<FieldValue>) -> Self {
        self.fields.push(Field::new(key, value));
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn hook(mut self, hook: Hook) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn pools(mut self, pools: &'static Pools) -> Self {
        self.pools = pools;
        self
    }

    /// Build the logger; without a writer it writes to standard output
    ///
    /// # Panics
    ///
    /// If the level has a negative priority.
    pub fn build(self) -> Logger {
        let base = match self.writer {
            Some(writer) => Logger::new_shared(writer),
            None => Logger::default(),
        };
        let base = match self.encoder {
            Some(encoder) => base.with_shared_encoder(encoder),
            None => base,
        };
        base.with_name(&self.name)
            .with_level(self.level)
            .with_depth(self.depth)
            .with_fields(self.fields)
            .with_hooks(self.hooks)
            .with_pools(self.pools)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use rust_kvlog::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .name("api")
    ///     .level(Level::DEBUG)
    ///     .writer(DiscardWriter)
    ///     .field("service", "billing")
    ///     .build();
    /// assert_eq!(logger.name(), "api");
    /// ```
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::field;
    use crate::core::hook::disable_logger;
    use crate::encoders::{JsonEncoder, NopEncoder};
    use crate::writers::{writer_fn, IoWriter};
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

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
    fn test_defaults() {
        let logger = Logger::new(crate::writers::DiscardWriter);
        assert_eq!(logger.level(), Level::TRACE);
        assert_eq!(logger.depth(), 0);
        assert_eq!(logger.name(), "");
        assert!(logger.fields().is_empty());
        assert!(logger.is_enabled(Level::TRACE));
    }

    #[test]
    fn test_context_then_call_fields() {
        let (logger, sink) = capture();
        let logger = logger.with_kv("svc", "api");
        logger.info("started", [field("port", 8080)]);

        let line = output(&sink);
        assert!(line.contains(" lvl=INFO svc=api port=8080 msg=started\n"), "{}", line);
    }

    #[test]
    fn test_level_filter() {
        let (logger, sink) = capture();
        let logger = logger.with_level(Level::WARN);

        assert_eq!(logger.log(Level::INFO, "quiet", []).unwrap(), Outcome::Filtered);
        assert_eq!(logger.log(Level::WARN, "loud", []).unwrap(), Outcome::Delivered);
        assert!(!output(&sink).contains("quiet"));
        assert_eq!(logger.metrics().filtered(), 1);
        assert_eq!(logger.metrics().delivered(), 1);
    }

    #[test]
    fn test_hook_rejects_before_fields_are_built() {
        let (logger, sink) = capture();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let logger = logger.with_name("db").with_hook(disable_logger(["db"]));

        logger.info(
            "hidden",
            [Field::lazy("n", move || counter.fetch_add(1, Ordering::SeqCst))],
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(output(&sink).is_empty());
        assert_eq!(logger.pools().fields.metrics().acquired(), 0);
    }

    #[test]
    fn test_derivations_do_not_share_appends() {
        let (base, _) = capture();
        let base = base.with_kv("a", 1);
        let left = base.with_kv("b", 2);
        let right = base.with_kv("c", 3);

        let keys = |logger: &Logger| -> Vec<String> {
            logger.fields().iter().map(|f| f.key().to_string()).collect()
        };
        assert_eq!(keys(&base), ["a"]);
        assert_eq!(keys(&left), ["a", "b"]);
        assert_eq!(keys(&right), ["a", "c"]);
    }

    #[test]
    fn test_metrics_shared_with_derived_loggers() {
        let (base, _) = capture();
        let child = base.with_name("child");
        child.info("one", []);
        base.info("two", []);
        assert_eq!(base.metrics().delivered(), 2);
    }

    #[test]
    #[should_panic(expected = "negative priority")]
    fn test_negative_level_panics() {
        let _ = Logger::new(crate::writers::DiscardWriter).with_level(Level::new("BELOW", -1));
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn test_depth_overflow_panics() {
        let _ = Logger::new(crate::writers::DiscardWriter)
            .with_depth(usize::MAX)
            .add_depth(1);
    }

    #[test]
    fn test_write_error_is_returned_and_counted() {
        let logger = Logger::new(writer_fn(|_, _| Err(LoggerError::writer("broken", "disk full"))));

        assert!(logger.log(Level::INFO, "lost", []).is_err());
        logger.info("also lost", []);
        assert_eq!(logger.metrics().write_failures(), 2);
    }

    #[test]
    fn test_empty_encoding_is_suppressed() {
        let (logger, sink) = capture();
        let logger = logger.with_encoder(NopEncoder);

        assert_eq!(logger.log(Level::INFO, "x", []).unwrap(), Outcome::Suppressed);
        assert!(output(&sink).is_empty());
        assert_eq!(logger.metrics().suppressed(), 1);
    }

    #[test]
    fn test_panic_level_escalates() {
        let (logger, sink) = capture();
        let logger = logger.with_name("db");

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            logger.panic("connection lost", [field("retry", 3)]);
        }));
        let payload = result.unwrap_err();
        let record = payload.downcast_ref::<PanicRecord>().unwrap();

        assert_eq!(record.message, "connection lost");
        assert_eq!(record.level, Level::PANIC);
        assert!(output(&sink).contains("lvl=PANIC retry=3 msg=\"connection lost\""));
    }

    #[test]
    fn test_deferred_fields_see_the_record() {
        let (logger, sink) = capture();
        let logger = logger
            .with_depth(2)
            .with_field(Field::valuer("depth", |r| FieldValue::from(r.depth)))
            .with_field(Field::valuer("at", |r| FieldValue::from(r.site.short_file())));
        logger.info("m", []);

        let line = output(&sink);
        assert!(line.contains(" depth=2 at=logger.rs msg=m"), "{}", line);
        assert!(logger.fields()[0].is_deferred());
    }

    #[test]
    fn test_to_writer() {
        let (logger, sink) = capture();
        let mut writer = logger.with_encoder(JsonEncoder::new()).to_writer(Level::WARN);
        writer.write_all(b"from io\n").unwrap();

        let line = output(&sink);
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["msg"], "from io");
        assert_eq!(value["lvl"], "WARN");
    }

    #[test]
    fn test_builder_basic() {
        let logger = Logger::builder()
            .name("api")
            .level(Level::DEBUG)
            .writer(crate::writers::DiscardWriter)
            .field("region", "eu")
            .hook(disable_logger(["other"]))
            .build();

        assert_eq!(logger.name(), "api");
        assert_eq!(logger.level(), Level::DEBUG);
        assert_eq!(logger.fields().len(), 1);
        assert_eq!(logger.hooks().len(), 1);
    }
}
