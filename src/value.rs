//! Backend values and conversions between them and Rust field types.
//!
//! `Value` is what crosses the `Executor` boundary in both directions: bound
//! arguments going out and result cells coming back. `SqlValue` is the typed
//! side of that boundary, implemented for every type a column can hold.

use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Semantic column types understood by the query layer
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean = 1,
    Int32 = 2,
    Int64 = 3,
    Float64 = 4,
    Varchar = 5,
    Bytes = 6,
    Timestamp = 7,
}

impl DataType {
    /// Name used when asking a dialect for its native type
    pub fn semantic_name(&self) -> &'static str {
        match self {
            DataType::Boolean => "bool",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Float64 => "float64",
            DataType::Varchar => "string",
            DataType::Bytes => "bytes",
            DataType::Timestamp => "timestamp",
        }
    }
}

/// Values exchanged with the backend
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    /// Loosely-typed cell, as some drivers return for numerics and text
    Bytes(Bytes),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Get the data type of this value
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int32(_) => Some(DataType::Int32),
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::String(_) => Some(DataType::Varchar),
            Value::Bytes(_) => Some(DataType::Bytes),
            Value::Timestamp(_) => Some(DataType::Timestamp),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short description used in conversion errors
    fn describe(&self) -> String {
        match self.data_type() {
            Some(data_type) => format!("{:?}", data_type),
            None => "NULL".to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int32(i) => write!(f, "{}", i),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float64(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

/// A backend value could not be converted into the requested Rust type
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot convert {found} into {expected:?}")]
pub struct ConversionError {
    pub expected: DataType,
    pub found: String,
}

impl ConversionError {
    fn new(expected: DataType, found: &Value) -> Self {
        Self {
            expected,
            found: found.describe(),
        }
    }

    fn unparsable(expected: DataType, text: &str) -> Self {
        Self {
            expected,
            found: format!("unparsable text {:?}", text),
        }
    }
}

/// Rust types that can be bound as arguments and decoded from result cells
pub trait SqlValue: Sized {
    /// Semantic type of the column holding this value
    const DATA_TYPE: DataType;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

/// Text view of a loosely-typed cell
fn loose_text(bytes: &Bytes, expected: DataType) -> Result<&str, ConversionError> {
    std::str::from_utf8(bytes).map_err(|_| ConversionError {
        expected,
        found: "non-UTF-8 bytes".to_string(),
    })
}

impl SqlValue for bool {
    const DATA_TYPE: DataType = DataType::Boolean;

    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Boolean(b) => Ok(b),
            Value::Int32(i) => Ok(i != 0),
            Value::Int64(i) => Ok(i != 0),
            Value::Bytes(ref bytes) => {
                let text = loose_text(bytes, DataType::Boolean)?.trim();
                match text.to_ascii_lowercase().as_str() {
                    "t" | "true" | "1" => Ok(true),
                    "f" | "false" | "0" => Ok(false),
                    _ => Err(ConversionError::unparsable(DataType::Boolean, text)),
                }
            }
            other => Err(ConversionError::new(DataType::Boolean, &other)),
        }
    }
}

impl SqlValue for i32 {
    const DATA_TYPE: DataType = DataType::Int32;

    fn to_value(&self) -> Value {
        Value::Int32(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Int32(i) => Ok(i),
            Value::Int64(i) => i32::try_from(i).map_err(|_| ConversionError {
                expected: DataType::Int32,
                found: format!("out of range Int64 {}", i),
            }),
            Value::Bytes(ref bytes) => {
                let text = loose_text(bytes, DataType::Int32)?.trim();
                text.parse()
                    .map_err(|_| ConversionError::unparsable(DataType::Int32, text))
            }
            other => Err(ConversionError::new(DataType::Int32, &other)),
        }
    }
}

impl SqlValue for i64 {
    const DATA_TYPE: DataType = DataType::Int64;

    fn to_value(&self) -> Value {
        Value::Int64(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Int64(i) => Ok(i),
            Value::Int32(i) => Ok(i64::from(i)),
            Value::Bytes(ref bytes) => {
                let text = loose_text(bytes, DataType::Int64)?.trim();
                text.parse()
                    .map_err(|_| ConversionError::unparsable(DataType::Int64, text))
            }
            other => Err(ConversionError::new(DataType::Int64, &other)),
        }
    }
}

impl SqlValue for f64 {
    const DATA_TYPE: DataType = DataType::Float64;

    fn to_value(&self) -> Value {
        Value::Float64(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Float64(x) => Ok(x),
            Value::Int32(i) => Ok(f64::from(i)),
            Value::Int64(i) => Ok(i as f64),
            Value::Bytes(ref bytes) => {
                let text = loose_text(bytes, DataType::Float64)?.trim();
                text.parse()
                    .map_err(|_| ConversionError::unparsable(DataType::Float64, text))
            }
            other => Err(ConversionError::new(DataType::Float64, &other)),
        }
    }
}

impl SqlValue for String {
    const DATA_TYPE: DataType = DataType::Varchar;

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::String(s) => Ok(s),
            Value::Bytes(ref bytes) => Ok(loose_text(bytes, DataType::Varchar)?.to_string()),
            other => Err(ConversionError::new(DataType::Varchar, &other)),
        }
    }
}

impl SqlValue for Bytes {
    const DATA_TYPE: DataType = DataType::Bytes;

    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bytes(bytes) => Ok(bytes),
            Value::String(s) => Ok(Bytes::from(s)),
            other => Err(ConversionError::new(DataType::Bytes, &other)),
        }
    }
}

impl SqlValue for DateTime<Utc> {
    const DATA_TYPE: DataType = DataType::Timestamp;

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            Value::String(ref s) => parse_timestamp(s),
            Value::Bytes(ref bytes) => parse_timestamp(loose_text(bytes, DataType::Timestamp)?),
            other => Err(ConversionError::new(DataType::Timestamp, &other)),
        }
    }
}

/// Accepts RFC 3339 as well as the `YYYY-MM-DD HH:MM:SS[.f]` form most
/// backends print for timestamps without a zone (read as UTC).
fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, ConversionError> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| ConversionError::unparsable(DataType::Timestamp, text))
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::TimeZone;

    #[test]
    fn test_value_data_type() {
        assert_eq!(Value::Null.data_type(), None);
        assert_eq!(Value::Boolean(true).data_type(), Some(DataType::Boolean));
        assert_eq!(Value::Int32(1).data_type(), Some(DataType::Int32));
        assert_eq!(Value::Int64(1).data_type(), Some(DataType::Int64));
        assert_eq!(Value::from("a").data_type(), Some(DataType::Varchar));
    }

    #[test]
    fn test_integer_widening_and_narrowing() -> Result<()> {
        assert_eq!(i64::from_value(Value::Int32(7))?, 7);
        assert_eq!(i32::from_value(Value::Int64(7))?, 7);
        assert!(i32::from_value(Value::Int64(i64::MAX)).is_err());
        assert_eq!(f64::from_value(Value::Int32(2))?, 2.0);
        Ok(())
    }

    #[test]
    fn test_loose_bytes_fallback() -> Result<()> {
        assert_eq!(i64::from_value(Value::Bytes(Bytes::from_static(b"42")))?, 42);
        assert_eq!(i32::from_value(Value::Bytes(Bytes::from_static(b" -3 ")))?, -3);
        assert_eq!(f64::from_value(Value::Bytes(Bytes::from_static(b"1.5")))?, 1.5);
        assert!(bool::from_value(Value::Bytes(Bytes::from_static(b"t")))?);
        assert!(!bool::from_value(Value::Bytes(Bytes::from_static(b"0")))?);
        assert_eq!(
            String::from_value(Value::Bytes(Bytes::from_static(b"alice")))?,
            "alice"
        );
        Ok(())
    }

    #[test]
    fn test_loose_bool_ignores_case() -> Result<()> {
        for text in ["T", "True", "TRUE", " true "] {
            assert!(bool::from_value(Value::Bytes(Bytes::from(text)))?, "{text}");
        }
        for text in ["F", "False", "FALSE", "f"] {
            assert!(!bool::from_value(Value::Bytes(Bytes::from(text)))?, "{text}");
        }
        let err = bool::from_value(Value::Bytes(Bytes::from_static(b"Yes"))).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert unparsable text \"Yes\" into Boolean");
        Ok(())
    }

    #[test]
    fn test_conversion_error_display() {
        let err = i32::from_value(Value::from("abc")).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert Varchar into Int32");

        let err = i64::from_value(Value::Bytes(Bytes::from_static(b"x1"))).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert unparsable text \"x1\" into Int64");

        let err = bool::from_value(Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert NULL into Boolean");
    }

    #[test]
    fn test_timestamp_parsing() -> Result<()> {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(
            DateTime::<Utc>::from_value(Value::from("2024-03-01T12:30:00Z"))?,
            expected
        );
        assert_eq!(
            DateTime::<Utc>::from_value(Value::Bytes(Bytes::from_static(
                b"2024-03-01 12:30:00"
            )))?,
            expected
        );
        Ok(())
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Int32(18).to_string(), "18");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::from("bob").to_string(), "\"bob\"");
        assert_eq!(Value::Null.to_string(), "NULL");
    }
}
