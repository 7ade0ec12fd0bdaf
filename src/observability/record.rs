//! Structured log record model.
//!
//! A [`LogRecord`] carries two ordered attribute groups, `request` and
//! `response`. Groups nest: headers and path parameters are groups inside
//! the request group. Serialization keeps insertion order.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use tracing::Level;

/// Message attached to every request record.
pub const RECORD_MESSAGE: &str = "HTTP";

/// Value of one attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Uint(u64),
    Time(DateTime<Utc>),
    /// Rendered as whole nanoseconds.
    Duration(Duration),
    Strings(Vec<String>),
    Group(AttrGroup),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            AttrValue::Uint(n) => Some(*n),
            AttrValue::Int(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&AttrGroup> {
        match self {
            AttrValue::Group(g) => Some(g),
            _ => None,
        }
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<u64> for AttrValue {
    fn from(value: u64) -> Self {
        AttrValue::Uint(value)
    }
}

impl From<u16> for AttrValue {
    fn from(value: u16) -> Self {
        AttrValue::Uint(u64::from(value))
    }
}

impl From<DateTime<Utc>> for AttrValue {
    fn from(value: DateTime<Utc>) -> Self {
        AttrValue::Time(value)
    }
}

impl From<Duration> for AttrValue {
    fn from(value: Duration) -> Self {
        AttrValue::Duration(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        AttrValue::Strings(value)
    }
}

impl From<AttrGroup> for AttrValue {
    fn from(value: AttrGroup) -> Self {
        AttrValue::Group(value)
    }
}

impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttrValue::Str(s) => serializer.serialize_str(s),
            AttrValue::Int(n) => serializer.serialize_i64(*n),
            AttrValue::Uint(n) => serializer.serialize_u64(*n),
            AttrValue::Time(t) => {
                serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Nanos, true))
            }
            AttrValue::Duration(d) => {
                serializer.serialize_u64(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            }
            AttrValue::Strings(values) => values.serialize(serializer),
            AttrValue::Group(group) => group.serialize(serializer),
        }
    }
}

/// A key paired with its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub key: String,
    pub value: AttrValue,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered list of attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrGroup {
    attrs: Vec<Attr>,
}

impl AttrGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            attrs: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.push(Attr::new(key, value));
    }

    /// First attribute with this key.
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.attrs
            .iter()
            .find(|attr| attr.key == key)
            .map(|attr| &attr.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attrs.iter().map(|attr| attr.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.attrs.iter()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl FromIterator<Attr> for AttrGroup {
    fn from_iter<I: IntoIterator<Item = Attr>>(iter: I) -> Self {
        Self {
            attrs: iter.into_iter().collect(),
        }
    }
}

impl Serialize for AttrGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attrs.len()))?;
        for attr in &self.attrs {
            map.serialize_entry(&attr.key, &attr.value)?;
        }
        map.end()
    }
}

/// One record per logged request/response cycle.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: Level,
    pub message: &'static str,
    pub request: AttrGroup,
    pub response: AttrGroup,
}

impl LogRecord {
    pub fn new(level: Level, request: AttrGroup, response: AttrGroup) -> Self {
        Self {
            level,
            message: RECORD_MESSAGE,
            request,
            response,
        }
    }
}

impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("LogRecord", 4)?;
        record.serialize_field("level", self.level.as_str())?;
        record.serialize_field("msg", self.message)?;
        record.serialize_field("request", &self.request)?;
        record.serialize_field("response", &self.response)?;
        record.end()
    }
}
