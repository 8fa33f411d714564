//! Value representations on either side of the coercion pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A raw request value, before coercion. Form and query fields arrive as
/// text; uploaded files arrive as bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Text(String),
    Bytes(Vec<u8>),
}

impl RawValue {
    /// Returns the value as text, if it is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            RawValue::Bytes(_) => None,
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(b: Vec<u8>) -> Self {
        RawValue::Bytes(b)
    }
}

/// A coerced value handed to prepare/apply routines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypedValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Raw encoded image (or other uploaded) bytes, kept unchanged so they
    /// can cross the wire without a decode/re-encode cycle.
    Bytes(Vec<u8>),
}

impl TypedValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TypedValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the numeric value, widening integers to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Float(v) => Some(*v),
            TypedValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TypedValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TypedValue::Bytes(v) => Some(v),
            _ => None,
        }
    }
}

/// The coerced input vector for one invocation: field name to typed value,
/// deterministically ordered.
pub type Record = BTreeMap<String, TypedValue>;
