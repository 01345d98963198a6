//! Timestamp formatting for encoders
//!
//! Supports RFC 3339, ISO 8601, Unix timestamps and custom strftime formats.

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write;

/// Standardized timestamp format options
///
/// # Examples
///
/// ```
/// use rust_kvlog::core::TimestampFormat;
/// use chrono::Utc;
///
/// let timestamp = TimestampFormat::Iso8601.format(&Utc::now());
/// assert!(timestamp.ends_with('Z'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// RFC 3339 with nanoseconds: `2025-01-08T10:30:45.123456789Z`
    #[default]
    Rfc3339Nanos,

    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    Iso8601,

    /// ISO 8601 with microseconds: `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,

    /// RFC 3339 with whole seconds: `2025-01-08T10:30:45Z`
    Rfc3339,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Unix timestamp in microseconds: `1736332245123456`
    UnixMicros,

    /// Custom strftime format
    ///
    /// ```
    /// use rust_kvlog::core::TimestampFormat;
    ///
    /// let apache = TimestampFormat::Custom("%d/%b/%Y:%H:%M:%S %z".to_string());
    /// ```
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Rfc3339Nanos => datetime.to_rfc3339_opts(SecondsFormat::Nanos, true),
            TimestampFormat::Iso8601 => datetime.to_rfc3339_opts(SecondsFormat::Millis, true),
            TimestampFormat::Iso8601Micros => datetime.to_rfc3339_opts(SecondsFormat::Micros, true),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339_opts(SecondsFormat::Secs, true),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::UnixMicros => datetime.timestamp_micros().to_string(),
            TimestampFormat::Custom(pattern) => format_custom(datetime, pattern),
        }
    }

    /// Append the formatted timestamp to an encoder buffer
    pub fn write_to(&self, buf: &mut Vec<u8>, datetime: &DateTime<Utc>) {
        // Integers into a Vec cannot fail
        let _ = match self {
            TimestampFormat::Unix => write!(buf, "{}", datetime.timestamp()),
            TimestampFormat::UnixMillis => write!(buf, "{}", datetime.timestamp_millis()),
            TimestampFormat::UnixMicros => write!(buf, "{}", datetime.timestamp_micros()),
            other => {
                buf.extend_from_slice(other.format(datetime).as_bytes());
                Ok(())
            }
        };
    }

    /// Reject custom patterns holding unknown strftime specifiers
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` naming the pattern
    pub fn validate(&self) -> Result<()> {
        match self {
            TimestampFormat::Custom(pattern)
                if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) =>
            {
                Err(LoggerError::config(
                    "timestamp",
                    format!("invalid strftime pattern '{}'", pattern),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Check if this is a Unix-based numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimestampFormat::Unix | TimestampFormat::UnixMillis | TimestampFormat::UnixMicros
        )
    }
}

/// A pattern chrono cannot render falls back to RFC 3339 with nanoseconds
fn format_custom(datetime: &DateTime<Utc>, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 16);
    match write!(out, "{}", datetime.format(pattern)) {
        Ok(()) => out,
        Err(_) => datetime.to_rfc3339_opts(SecondsFormat::Nanos, true),
    }
}
