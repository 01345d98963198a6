//! The per-emission record view and its panic payload

use super::field::Field;
use super::level::Level;
use chrono::{DateTime, Utc};
use std::fmt;
use std::panic::Location;

/// Source location of a log call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite<'a> {
    pub file: &'a str,
    pub line: u32,
    pub column: u32,
}

impl<'a> CallSite<'a> {
    pub const fn new(file: &'a str, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }

    /// The file name without its directories
    pub fn short_file(&self) -> &'a str {
        self.file
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or(self.file)
    }
}

impl CallSite<'static> {
    /// The location of the outermost `#[track_caller]` frame calling this
    #[track_caller]
    #[inline]
    pub fn caller() -> Self {
        Self::from(Location::caller())
    }
}

impl From<&'static Location<'static>> for CallSite<'static> {
    fn from(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), location.line(), location.column())
    }
}

impl fmt::Display for CallSite<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.short_file(), self.line)
    }
}

/// A log record, only valid for the duration of one emission
///
/// `depth` counts the stack frames between the call site and the frame the
/// caller-aware fields should describe; 0 means the call site itself.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub name: &'a str,
    pub time: DateTime<Utc>,
    pub depth: usize,
    pub level: Level,
    pub message: &'a str,
    pub site: CallSite<'a>,
    pub fields: &'a [Field],
}

/// Payload of the panic raised by a panic-level emission
///
/// The owned copy of the record metadata; fields are not carried.
#[derive(Debug, Clone, PartialEq)]
pub struct PanicRecord {
    pub name: String,
    pub time: DateTime<Utc>,
    pub depth: usize,
    pub level: Level,
    pub message: String,
    pub file: String,
    pub line: u32,
}

impl From<&Record<'_>> for PanicRecord {
    fn from(record: &Record<'_>) -> Self {
        Self {
            name: record.name.to_string(),
            time: record.time,
            depth: record.depth,
            level: record.level,
            message: record.message.to_string(),
            file: record.site.file.to_string(),
            line: record.site.line,
        }
    }
}

impl fmt::Display for PanicRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "[{}] {}", self.level, self.message)
        } else {
            write!(f, "[{}] {}: {}", self.level, self.name, self.message)
        }
    }
}

impl std::error::Error for PanicRecord {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::field;

    #[test]
    fn test_short_file() {
        assert_eq!(CallSite::new("src/core/record.rs", 1, 1).short_file(), "record.rs");
        assert_eq!(CallSite::new("C:\\app\\main.rs", 1, 1).short_file(), "main.rs");
        assert_eq!(CallSite::new("main.rs", 9, 1).to_string(), "main.rs:9");
    }

    #[test]
    fn test_caller_site_is_this_file() {
        let site = CallSite::caller();
        assert_eq!(site.short_file(), "record.rs");
        assert_eq!(site.line, line!() - 2);
    }

    #[test]
    fn test_panic_record_strips_fields() {
        let fields = [field("k", "v")];
        let record = Record {
            name: "db",
            time: Utc::now(),
            depth: 0,
            level: Level::PANIC,
            message: "connection lost",
            site: CallSite::new("src/db.rs", 12, 5),
            fields: &fields,
        };

        let payload = PanicRecord::from(&record);
        assert_eq!(payload.name, "db");
        assert_eq!(payload.message, "connection lost");
        assert_eq!(payload.line, 12);
        assert_eq!(payload.to_string(), "[PANIC] db: connection lost");
    }
}
