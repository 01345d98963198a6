//! JSON encoders
//!
//! [`JsonEncoder`] streams keys in a fixed order (`t`, `logger`, `lvl`,
//! fields, `msg`) and keeps duplicate field keys. [`MapJsonEncoder`] builds a
//! `serde_json::Map` first, so a later duplicate key replaces an earlier one.

use crate::core::{Encoder, Record, TimestampFormat};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    timestamp_format: TimestampFormat,
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    fn append_time(&self, buf: &mut Vec<u8>, time: &DateTime<Utc>) {
        if self.timestamp_format.is_numeric() {
            self.timestamp_format.write_to(buf, time);
        } else {
            append_json(buf, &self.timestamp_format.format(time));
        }
    }
}

fn append_json<T: Serialize + ?Sized>(buf: &mut Vec<u8>, value: &T) {
    let mark = buf.len();
    if let Err(err) = serde_json::to_writer(&mut *buf, value) {
        buf.truncate(mark);
        let _ = serde_json::to_writer(&mut *buf, &format!("<JsonEncoder:Error:{}>", err));
    }
}

impl Encoder for JsonEncoder {
    fn encode(&self, buf: &mut Vec<u8>, record: &Record<'_>) {
        buf.extend_from_slice(br#"{"t":"#);
        self.append_time(buf, &record.time);

        if !record.name.is_empty() {
            buf.extend_from_slice(br#","logger":"#);
            append_json(buf, record.name);
        }

        buf.extend_from_slice(br#","lvl":"#);
        append_json(buf, record.level.name());

        for field in record.fields {
            buf.push(b',');
            append_json(buf, field.key());
            buf.push(b':');
            append_json(buf, &*field.value());
        }

        buf.extend_from_slice(br#","msg":"#);
        append_json(buf, record.message);
        buf.extend_from_slice(b"}\n");
    }
}

/// JSON through an intermediate `serde_json::Map`
#[derive(Debug, Clone, Default)]
pub struct MapJsonEncoder {
    timestamp_format: TimestampFormat,
}

impl MapJsonEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// The object a record encodes to
    pub fn to_map(&self, record: &Record<'_>) -> Map<String, Value> {
        let mut map = Map::with_capacity(record.fields.len() + 4);
        map.insert(
            "t".to_string(),
            Value::String(self.timestamp_format.format(&record.time)),
        );
        map.insert("lvl".to_string(), Value::String(record.level.name().to_string()));
        map.insert("msg".to_string(), Value::String(record.message.to_string()));
        if !record.name.is_empty() {
            map.insert("logger".to_string(), Value::String(record.name.to_string()));
        }
        for field in record.fields {
            map.insert(field.key().to_string(), field.value().to_json_value());
        }
        map
    }
}

impl Encoder for MapJsonEncoder {
    fn encode(&self, buf: &mut Vec<u8>, record: &Record<'_>) {
        append_json(buf, &self.to_map(record));
        buf.push(b'\n');
    }
}
