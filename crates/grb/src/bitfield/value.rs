// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Decoded values and records.

use super::bits::BitString;
use super::CodecError;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Raw integer parsed from a bit sequence.
    Int(u64),
    /// Literal bit sequence.
    Bits(BitString),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    /// Consecutive scalars.
    Array(Vec<Value>),
    /// Row-major 2-D array.
    Matrix(Vec<Vec<Value>>),
    /// Nested sub-table.
    Record(Record),
}

impl Value {
    /// Unsigned integer view of integer-like values.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Int(v) | Value::U64(v) => Some(v),
            Value::U8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::Bits(ref b) => b.to_u64(),
            _ => None,
        }
    }

    /// Floating point view of numeric scalars.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v.into()),
            Value::F64(v) => Some(v),
            _ => self.as_u64().map(|v| v as f64),
        }
    }

    pub fn as_bits(&self) -> Option<&BitString> {
        match self {
            Value::Bits(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&[Vec<Value>]> {
        match self {
            Value::Matrix(m) => Some(m),
            _ => None,
        }
    }
}

/// Ordered mapping from field name to value, in layout order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(&'static str, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            fields: Vec::with_capacity(n),
        }
    }

    /// Append a field. Later inserts of the same name shadow nothing; the
    /// first one wins on lookup.
    pub fn insert(&mut self, name: &'static str, value: Value) {
        self.fields.push((name, value));
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &'static str, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Look up a dotted path through nested records, e.g.
    /// `"primary_header.virtual_channel_id"`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.get(parts.next()?)?;
        for part in parts {
            current = current.as_record()?.get(part)?;
        }
        Some(current)
    }

    /// Integer at `path`, or `MissingField`.
    pub fn uint(&self, path: &str) -> Result<u64, CodecError> {
        self.get_path(path)
            .and_then(Value::as_u64)
            .ok_or_else(|| CodecError::MissingField(path.to_string()))
    }

    /// Bit string at `path`, or `MissingField`.
    pub fn bits(&self, path: &str) -> Result<&BitString, CodecError> {
        self.get_path(path)
            .and_then(Value::as_bits)
            .ok_or_else(|| CodecError::MissingField(path.to_string()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.fields.iter().map(|(n, v)| (*n, v))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
