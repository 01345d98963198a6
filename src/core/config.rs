//! Logger configuration from strings and JSON documents

use super::error::{LoggerError, Result};
use super::exit::register_exit_hook;
use super::level::Level;
use super::logger::Logger;
use super::timestamp::TimestampFormat;
use super::writer::Writer;
use crate::encoders::{JsonEncoder, MapJsonEncoder, TextEncoder};
use crate::writers::{SafeWriter, SizedRotatingFile, StreamWriter};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

fn unit_multiplier(unit: char) -> Option<u64> {
    let multiplier = match unit {
        'b' | 'B' => 1,
        'k' => 1000,
        'K' => 1 << 10,
        'm' => 1000u64.pow(2),
        'M' => 1 << 20,
        'g' => 1000u64.pow(3),
        'G' => 1 << 30,
        't' => 1000u64.pow(4),
        'T' => 1 << 40,
        'p' => 1000u64.pow(5),
        'P' => 1 << 50,
        'e' => 1000u64.pow(6),
        'E' => 1 << 60,
        _ => return None,
    };
    Some(multiplier)
}

/// Parse a size such as `"100M"` into bytes
///
/// Lowercase units are powers of 1000 and uppercase units powers of 1024;
/// `b`/`B` and no unit mean bytes. The empty string is 0.
///
/// ```
/// use rust_kvlog::core::config::parse_size;
///
/// assert_eq!(parse_size("10k").unwrap(), 10_000);
/// assert_eq!(parse_size("10K").unwrap(), 10_240);
/// assert!(parse_size("ten").is_err());
/// ```
pub fn parse_size(input: &str) -> Result<u64> {
    if input.is_empty() {
        return Ok(0);
    }

    let (digits, multiplier) = match input.chars().last().and_then(unit_multiplier) {
        Some(multiplier) => (&input[..input.len() - 1], multiplier),
        None => (input, 1),
    };
    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| LoggerError::invalid_size(input))
}

/// A logger at `level` writing to a rotating file
///
/// An empty `path` logs to standard output. An empty `size` means `"100M"`
/// and a `count` below 1 means 100 backups. The file is closed by an exit
/// hook when a fatal record terminates the process.
///
/// # Errors
///
/// Returns error if `size` is malformed or the file cannot be opened
pub fn new_simple_logger(level: &str, path: &str, size: &str, count: i64) -> Result<Logger> {
    let level = Level::from_name(level);
    if path.is_empty() {
        return Ok(Logger::default().with_level(level));
    }

    let file = Arc::new(SizedRotatingFile::from_options(path, size, count)?);
    let closer = Arc::clone(&file);
    register_exit_hook(move || {
        if let Err(e) = closer.close() {
            eprintln!("[LOGGER ERROR] Failed to close '{}': {}", closer.path().display(), e);
        }
    });
    Ok(Logger::new(file).with_level(level))
}

/// Record encoding selected by a [`LoggerConfig`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `key=value` text lines
    #[default]
    Text,
    /// One JSON object per line, duplicate keys kept
    Json,
    /// One JSON object per line, later duplicate keys win
    MapJson,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub path: String,
    /// Size before rotation, as accepted by [`parse_size`]
    pub size: String,
    /// Number of backups kept
    pub count: i64,
    /// Gzip rotated backups
    pub compress: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleConfig {
    pub colors: bool,
}

/// Declarative logger configuration
///
/// ```
/// use rust_kvlog::core::config::LoggerConfig;
///
/// let config = LoggerConfig::from_json(r#"{"name": "api", "level": "warn", "format": "json"}"#).unwrap();
/// let logger = config.build().unwrap();
/// assert_eq!(logger.name(), "api");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    pub name: String,
    pub level: String,
    pub format: OutputFormat,
    /// Quote text values containing whitespace
    pub quote: bool,
    pub depth: usize,
    pub timestamp: TimestampFormat,
    /// Log to a rotating file; takes precedence over `console`
    pub file: Option<FileConfig>,
    /// Log to the console, colored by level when the `console` feature is on
    pub console: Option<ConsoleConfig>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            level: "TRACE".to_string(),
            format: OutputFormat::Text,
            quote: true,
            depth: 0,
            timestamp: TimestampFormat::default(),
            file: None,
            console: None,
        }
    }
}

impl LoggerConfig {
    /// # Errors
    ///
    /// Returns error if the document is not a valid configuration
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "read config",
                format!("Failed to read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_json(&json)
    }

    /// Build the logger described by this configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for an unknown level name or an
    /// unparsable custom timestamp, and the writer's error if the log file
    /// cannot be opened.
    pub fn build(&self) -> Result<Logger> {
        let level = Level::from_name_strict(&self.level)
            .map_err(|e| LoggerError::config("level", e.to_string()))?;
        if level.priority() < 0 {
            return Err(LoggerError::config(
                "level",
                format!("{} has negative priority", level),
            ));
        }
        self.timestamp.validate()?;

        let logger = Logger::new_shared(self.writer()?)
            .with_name(&self.name)
            .with_level(level)
            .with_depth(self.depth);

        let timestamp = self.timestamp.clone();
        Ok(match self.format {
            OutputFormat::Text => logger
                .with_encoder(TextEncoder::new(self.quote).with_timestamp_format(timestamp)),
            OutputFormat::Json => {
                logger.with_encoder(JsonEncoder::new().with_timestamp_format(timestamp))
            }
            OutputFormat::MapJson => {
                logger.with_encoder(MapJsonEncoder::new().with_timestamp_format(timestamp))
            }
        })
    }

    fn writer(&self) -> Result<Arc<dyn Writer>> {
        if let Some(file) = self.file.as_ref().filter(|f| !f.path.is_empty()) {
            let writer = SizedRotatingFile::from_options(&file.path, &file.size, file.count)?
                .with_compression(file.compress);
            return Ok(Arc::new(writer));
        }

        match &self.console {
            #[cfg(feature = "console")]
            Some(console) => Ok(Arc::new(crate::writers::ConsoleWriter::with_colors(
                console.colors,
            ))),
            #[cfg(not(feature = "console"))]
            Some(_) => Ok(Arc::new(SafeWriter::new(StreamWriter::stdout()))),
            None => Ok(Arc::new(SafeWriter::new(StreamWriter::stdout()))),
        }
    }
}
