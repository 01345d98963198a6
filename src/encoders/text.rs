//! Key-value text encoder
//!
//! One line per record:
//!
//! ```text
//! t=2025-01-08T10:30:45.123456789Z logger=db lvl=INFO table=users msg=connected
//! ```

use crate::core::{Encoder, FieldValue, Record, TimestampFormat};
use std::io::Write;

#[derive(Debug, Clone, Default)]
pub struct TextEncoder {
    quote: bool,
    timestamp_format: TimestampFormat,
}

impl TextEncoder {
    /// Create an encoder; with `quote`, string values containing whitespace
    /// are written as JSON strings.
    pub fn new(quote: bool) -> Self {
        Self {
            quote,
            timestamp_format: TimestampFormat::default(),
        }
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    pub fn quote(&self) -> bool {
        self.quote
    }

    fn append_str(&self, buf: &mut Vec<u8>, s: &str) {
        if self.quote && s.chars().any(char::is_whitespace) {
            if serde_json::to_writer(&mut *buf, s).is_err() {
                buf.extend_from_slice(s.as_bytes());
            }
        } else {
            buf.extend_from_slice(s.as_bytes());
        }
    }

    fn append_value(&self, buf: &mut Vec<u8>, value: &FieldValue) {
        match value {
            FieldValue::String(s) => self.append_str(buf, s),
            FieldValue::Int(i) => {
                let _ = write!(buf, "{}", i);
            }
            FieldValue::Uint(u) => {
                let _ = write!(buf, "{}", u);
            }
            FieldValue::Float(f) => {
                let _ = write!(buf, "{}", f);
            }
            FieldValue::Bool(b) => buf.extend_from_slice(if *b { b"true" } else { b"false" }),
            FieldValue::Time(t) => self.timestamp_format.write_to(buf, t),
            FieldValue::Json(v) => self.append_str(buf, &v.to_string()),
            FieldValue::Null => buf.extend_from_slice(b"null"),
        }
    }
}

impl Encoder for TextEncoder {
    fn encode(&self, buf: &mut Vec<u8>, record: &Record<'_>) {
        buf.extend_from_slice(b"t=");
        self.timestamp_format.write_to(buf, &record.time);

        if !record.name.is_empty() {
            buf.extend_from_slice(b" logger=");
            self.append_str(buf, record.name);
        }

        buf.extend_from_slice(b" lvl=");
        buf.extend_from_slice(record.level.name().as_bytes());

        for field in record.fields {
            buf.push(b' ');
            buf.extend_from_slice(field.key().as_bytes());
            buf.push(b'=');
            self.append_value(buf, &field.value());
        }

        buf.extend_from_slice(b" msg=");
        self.append_str(buf, record.message);
        buf.push(b'\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{field, CallSite, Level};
    use chrono::{TimeZone, Utc};

    fn encode(encoder: &TextEncoder, name: &str, message: &str, fields: &[crate::core::Field]) -> String {
        let record = Record {
            name,
            time: Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap(),
            depth: 0,
            level: Level::INFO,
            message,
            site: CallSite::new("src/main.rs", 1, 1),
            fields,
        };
        let mut buf = Vec::new();
        encoder.encode(&mut buf, &record);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_layout() {
        let encoder = TextEncoder::new(true);
        let line = encode(&encoder, "", "test logger", &[field("key1", 123), field("key2", "abc")]);
        assert_eq!(
            line,
            "t=2025-01-08T10:30:45.000000000Z lvl=INFO key1=123 key2=abc msg=\"test logger\"\n"
        );
    }

    #[test]
    fn test_logger_name_is_included() {
        let encoder = TextEncoder::new(false).with_timestamp_format(TimestampFormat::Unix);
        let line = encode(&encoder, "db", "up", &[]);
        assert_eq!(line, "t=1736332245 logger=db lvl=INFO msg=up\n");
    }

    #[test]
    fn test_quoting_only_with_whitespace() {
        let quoted = TextEncoder::new(true);
        let plain = TextEncoder::new(false);
        let fields = [field("path", "/a b"), field("id", "x1")];

        assert!(encode(&quoted, "", "m", &fields).contains("path=\"/a b\" id=x1 "));
        assert!(encode(&plain, "", "m", &fields).contains("path=/a b id=x1 "));
    }

    #[test]
    fn test_value_kinds() {
        let encoder = TextEncoder::new(false);
        let line = encode(
            &encoder,
            "",
            "m",
            &[
                field("f", 1.5),
                field("b", false),
                field("n", None::<i32>),
                field("neg", -3),
            ],
        );
        assert!(line.contains(" f=1.5 b=false n=null neg=-3 msg=m\n"));
    }

    #[test]
    fn test_structured_value_is_compact_json() {
        let fields = [
            crate::core::Field::serialize("ids", &[1, 2]),
            field("cfg", serde_json::json!({"retry": true})),
        ];
        let line = encode(&TextEncoder::new(false), "", "m", &fields);
        assert!(line.contains(r#" ids=[1,2] cfg={"retry":true} msg=m"#), "{}", line);
    }

    #[test]
    fn test_bad_custom_timestamp_does_not_panic() {
        let encoder = TextEncoder::new(false)
            .with_timestamp_format(TimestampFormat::Custom("%Q".to_string()));
        let line = encode(&encoder, "", "m", &[field("at", Utc.with_ymd_and_hms(2025, 1, 8, 0, 0, 0).unwrap())]);
        assert_eq!(
            line,
            "t=2025-01-08T10:30:45.000000000Z lvl=INFO at=2025-01-08T00:00:00.000000000Z msg=m\n"
        );
    }
}
