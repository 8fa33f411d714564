//! Scalar type declarations and strict literal parsing.

use serde::{Deserialize, Serialize};

use crate::CoercionError;

/// The coercion applied to a raw request value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Bool,
    Integer,
    Float,
    String,
    Image,
}

/// The native representation a coerced value is reported as in endpoint
/// introspection. The serving core itself computes in `i64`/`f64`; the
/// narrower declarations document what the model routine expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Str,
    Bool,
    Bytes,
}

const TRUE_LITERALS: [&str; 4] = ["true", "t", "1", "yes"];
const FALSE_LITERALS: [&str; 4] = ["false", "f", "0", "no"];

/// Parses a boolean literal, case-insensitively.
///
/// Accepts `true`/`t`/`1`/`yes` and `false`/`f`/`0`/`no`; anything else is
/// rejected rather than defaulting.
pub fn parse_bool(value: &str) -> Result<bool, CoercionError> {
    let lowered = value.to_ascii_lowercase();
    if TRUE_LITERALS.contains(&lowered.as_str()) {
        Ok(true)
    } else if FALSE_LITERALS.contains(&lowered.as_str()) {
        Ok(false)
    } else {
        Err(CoercionError::InvalidBool(value.to_string()))
    }
}

/// Parses an integer literal: an optional leading sign followed by digits.
///
/// Decimal points, thousands separators, and surrounding whitespace are all
/// rejected. Leading zeros are accepted (`"-025"` parses to `-25`).
pub fn parse_integer(value: &str) -> Result<i64, CoercionError> {
    value
        .parse::<i64>()
        .map_err(|_| CoercionError::InvalidInteger(value.to_string()))
}

/// Parses a float literal using `.` as the decimal separator.
///
/// Locale variants using `,` are rejected, not reinterpreted.
pub fn parse_float(value: &str) -> Result<f64, CoercionError> {
    value
        .parse::<f64>()
        .map_err(|_| CoercionError::InvalidFloat(value.to_string()))
}
