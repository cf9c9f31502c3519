//! A present/absent wrapper for nullable columns.
//!
//! `Optional<T>` reads as absent from a backend NULL, binds as NULL when
//! absent, and serializes to `null` in textual interchange formats. When
//! present, every direction delegates to `T`.

use crate::value::{ConversionError, DataType, SqlValue, Value};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A value that may or may not be present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Optional<T> {
    value: Option<T>,
}

impl<T> Optional<T> {
    /// Create a present value
    pub fn some(value: T) -> Self {
        Self { value: Some(value) }
    }

    /// Create an absent value
    pub fn none() -> Self {
        Self { value: None }
    }

    /// Create from anything pointer-like: `None` maps to absent
    pub fn from_option(value: Option<T>) -> Self {
        Self { value }
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    pub fn is_absent(&self) -> bool {
        self.value.is_none()
    }

    /// Borrow the contained value.
    ///
    /// # Panics
    ///
    /// Panics when the value is absent. Check `is_present` first.
    pub fn get(&self) -> &T {
        match &self.value {
            Some(value) => value,
            None => panic!("Optional::get called on an absent value"),
        }
    }

    pub fn get_or_default(self, default: T) -> T {
        self.value.unwrap_or(default)
    }

    pub fn get_or_zero(self) -> T
    where
        T: Default,
    {
        self.value.unwrap_or_default()
    }

    pub fn as_option(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn into_option(self) -> Option<T> {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Optional<U> {
        Optional {
            value: self.value.map(f),
        }
    }

    pub fn flat_map<U>(self, f: impl FnOnce(T) -> Optional<U>) -> Optional<U> {
        match self.value {
            Some(value) => f(value),
            None => Optional::none(),
        }
    }

    /// Keep the value only when `predicate` accepts it
    pub fn filter(self, predicate: impl FnOnce(&T) -> bool) -> Self {
        Self {
            value: self.value.filter(predicate),
        }
    }

    pub fn if_present(&self, f: impl FnOnce(&T)) {
        if let Some(value) = &self.value {
            f(value);
        }
    }

    pub fn if_present_or_else(&self, present: impl FnOnce(&T), absent: impl FnOnce()) {
        match &self.value {
            Some(value) => present(value),
            None => absent(),
        }
    }
}

impl<T: Clone> Optional<T> {
    /// Clone out of a borrowed option
    pub fn from_ref(value: Option<&T>) -> Self {
        Self {
            value: value.cloned(),
        }
    }
}

impl<T> Default for Optional<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> From<Option<T>> for Optional<T> {
    fn from(value: Option<T>) -> Self {
        Self::from_option(value)
    }
}

impl<T> From<Optional<T>> for Option<T> {
    fn from(value: Optional<T>) -> Self {
        value.value
    }
}

impl<T: SqlValue> SqlValue for Optional<T> {
    const DATA_TYPE: DataType = T::DATA_TYPE;

    fn to_value(&self) -> Value {
        match &self.value {
            Some(value) => value.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        if value.is_null() {
            return Ok(Self::none());
        }
        T::from_value(value).map(Self::some)
    }
}

impl<T: Serialize> Serialize for Optional<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.value {
            Some(value) => value.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Optional<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from_option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use bytes::Bytes;
    use std::cell::Cell;

    #[test]
    fn test_presence() {
        let present = Optional::some(5);
        let absent = Optional::<i32>::none();
        assert!(present.is_present());
        assert!(!present.is_absent());
        assert!(absent.is_absent());
        assert_eq!(*present.get(), 5);
        assert_eq!(absent.get_or_default(9), 9);
        assert_eq!(absent.get_or_zero(), 0);
        assert_eq!(Optional::<i32>::default(), absent);
    }

    #[test]
    #[should_panic(expected = "absent value")]
    fn test_get_on_absent_panics() {
        let absent = Optional::<String>::none();
        absent.get();
    }

    #[test]
    fn test_combinators() {
        let name = Optional::some("alice".to_string());
        assert_eq!(name.clone().map(|s| s.len()), Optional::some(5));
        assert_eq!(
            name.clone().flat_map(|s| if s.is_empty() {
                Optional::none()
            } else {
                Optional::some(s.to_uppercase())
            }),
            Optional::some("ALICE".to_string())
        );
        assert!(name.clone().filter(|s| s.starts_with('b')).is_absent());
        assert!(name.filter(|s| s.starts_with('a')).is_present());

        let seen = Cell::new(0);
        Optional::some(3).if_present(|v| seen.set(*v));
        assert_eq!(seen.get(), 3);
        Optional::<i32>::none().if_present_or_else(|_| seen.set(1), || seen.set(-1));
        assert_eq!(seen.get(), -1);
    }

    #[test]
    fn test_from_option_like() {
        let value = 7;
        assert_eq!(Optional::from_ref(Some(&value)), Optional::some(7));
        assert_eq!(Optional::<i32>::from_ref(None), Optional::none());
        let back: Option<i32> = Optional::some(1).into();
        assert_eq!(back, Some(1));
    }

    #[test]
    fn test_backend_null_round_trip() -> Result<()> {
        let absent = Optional::<i32>::none();
        assert_eq!(absent.to_value(), Value::Null);
        assert_eq!(Optional::<i32>::from_value(absent.to_value())?, absent);

        let present = Optional::some(5);
        assert_eq!(present.to_value(), Value::Int32(5));
        assert_eq!(Optional::<i32>::from_value(present.to_value())?, present);
        Ok(())
    }

    #[test]
    fn test_scan_loose_representation() -> Result<()> {
        let scanned = Optional::<i64>::from_value(Value::Bytes(Bytes::from_static(b"12")))?;
        assert_eq!(scanned, Optional::some(12));
        assert!(Optional::<i64>::from_value(Value::from("twelve")).is_err());
        Ok(())
    }

    #[test]
    fn test_json_interchange() -> Result<()> {
        assert_eq!(serde_json::to_string(&Optional::<String>::none())?, "null");
        assert_eq!(
            serde_json::to_string(&Optional::some("bob".to_string()))?,
            "\"bob\""
        );
        let parsed: Optional<i32> = serde_json::from_str("null")?;
        assert!(parsed.is_absent());
        let parsed: Optional<i32> = serde_json::from_str("42")?;
        assert_eq!(parsed, Optional::some(42));
        Ok(())
    }
}
