//! Key-value fields attached to log records
//!
//! A [`Field`] holds either a ready [`FieldValue`] or a deferred one:
//!
//! - a lazy closure ([`Field::lazy`]) evaluated when the record is emitted,
//! - a record-aware resolver ([`Field::valuer`]) that also receives the
//!   in-flight [`Record`], used for call-site and stack information.
//!
//! Deferred values are only evaluated after the level/hook gate has let the
//! record through, and exactly once per emission.

use super::record::Record;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Time(DateTime<Utc>),
    /// Structured data, written natively by JSON encoders
    Json(serde_json::Value),
    Null,
}

impl FieldValue {
    /// Render any `Display` value as a string field value
    pub fn display(value: impl fmt::Display) -> Self {
        FieldValue::String(value.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to serde_json::Value for map-based JSON encoding
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Uint(u) => serde_json::Value::Number((*u).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Time(t) => {
                serde_json::Value::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            FieldValue::Json(v) => v.clone(),
            FieldValue::Null => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => f.write_str(s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Uint(u) => write!(f, "{}", u),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Time(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            FieldValue::Json(v) => write!(f, "{}", v),
            FieldValue::Null => f.write_str("null"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::String(s.clone())
    }
}

impl From<Cow<'_, str>> for FieldValue {
    fn from(s: Cow<'_, str>) -> Self {
        FieldValue::String(s.into_owned())
    }
}

impl From<char> for FieldValue {
    fn from(c: char) -> Self {
        FieldValue::String(c.to_string())
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(i: $t) -> Self {
                FieldValue::Int(i as i64)
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(u: $t) -> Self {
                FieldValue::Uint(u as u64)
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for FieldValue {
    fn from(f: f32) -> Self {
        FieldValue::Float(f64::from(f))
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(t: DateTime<Utc>) -> Self {
        FieldValue::Time(t)
    }
}

impl From<Duration> for FieldValue {
    fn from(d: Duration) -> Self {
        FieldValue::String(format!("{:?}", d))
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        FieldValue::Json(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

/// A zero-argument closure evaluated at emission time
pub type LazyValue = Arc<dyn Fn() -> FieldValue + Send + Sync>;

/// A resolver evaluated at emission time with the in-flight record
pub type Valuer = Arc<dyn Fn(&Record<'_>) -> FieldValue + Send + Sync>;

#[derive(Clone)]
enum Slot {
    Ready(FieldValue),
    Lazy(LazyValue),
    Valuer(Valuer),
}

/// A key-value pair attached to a log record
#[derive(Clone)]
pub struct Field {
    key: Cow<'static, str>,
    slot: Slot,
}

impl Field {
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            slot: Slot::Ready(value.into()),
        }
    }

    /// A field whose value is computed only when the record is emitted
    ///
    /// # Example
    ///
    /// ```
    /// use rust_kvlog::Field;
    ///
    /// let field = Field::lazy("expensive", || "computed".to_string());
    /// assert!(field.is_deferred());
    /// ```
    pub fn lazy<F, V>(key: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<FieldValue>,
    {
        Self {
            key: key.into(),
            slot: Slot::Lazy(Arc::new(move || f().into())),
        }
    }

    /// A field resolved against the record being emitted, such as the caller location
    pub fn valuer<F>(key: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(&Record<'_>) -> FieldValue + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            slot: Slot::Valuer(Arc::new(f)),
        }
    }

    /// Same as [`Field::valuer`] for an already shared resolver
    pub fn from_valuer(key: impl Into<Cow<'static, str>>, valuer: Valuer) -> Self {
        Self {
            key: key.into(),
            slot: Slot::Valuer(valuer),
        }
    }

    /// A field holding any serializable value as structured JSON
    ///
    /// A value serde cannot represent is kept as an error string.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_kvlog::{Field, FieldValue};
    ///
    /// let field = Field::serialize("ids", &[1, 2, 3]);
    /// assert_eq!(*field.value(), FieldValue::Json(serde_json::json!([1, 2, 3])));
    /// ```
    pub fn serialize<T: Serialize + ?Sized>(key: impl Into<Cow<'static, str>>, value: &T) -> Self {
        let value = match serde_json::to_value(value) {
            Ok(v) => FieldValue::Json(v),
            Err(err) => FieldValue::String(format!("<Field:Error:{}>", err)),
        };
        Field::new(key, value)
    }

    /// The conventional `err` field
    pub fn error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        Field::new("err", err.to_string())
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The field value; lazy closures are called, record-aware resolvers
    /// yield `Null` because there is no record to resolve against.
    pub fn value(&self) -> Cow<'_, FieldValue> {
        match &self.slot {
            Slot::Ready(value) => Cow::Borrowed(value),
            Slot::Lazy(f) => Cow::Owned(f()),
            Slot::Valuer(_) => Cow::Owned(FieldValue::Null),
        }
    }

    /// Whether the value still has to be evaluated
    #[inline]
    pub fn is_deferred(&self) -> bool {
        !matches!(self.slot, Slot::Ready(_))
    }

    /// Evaluate a deferred value in place; ready values are left untouched.
    pub fn resolve(&mut self, record: &Record<'_>) {
        let value = match &self.slot {
            Slot::Ready(_) => return,
            Slot::Lazy(f) => f(),
            Slot::Valuer(v) => v(record),
        };
        self.slot = Slot::Ready(value);
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Field");
        s.field("key", &self.key);
        match &self.slot {
            Slot::Ready(value) => s.field("value", value),
            Slot::Lazy(_) => s.field("value", &"<lazy>"),
            Slot::Valuer(_) => s.field("value", &"<valuer>"),
        };
        s.finish()
    }
}

impl<K, V> From<(K, V)> for Field
where
    K: Into<Cow<'static, str>>,
    V: Into<FieldValue>,
{
    fn from((key, value): (K, V)) -> Self {
        Field::new(key, value)
    }
}

/// Shorthand for [`Field::new`]
pub fn field(key: impl Into<Cow<'static, str>>, value: impl Into<FieldValue>) -> Field {
    Field::new(key, value)
}

/// Shorthand for [`Field::error`]
pub fn err_field<E: std::error::Error + ?Sized>(err: &E) -> Field {
    Field::error(err)
}
