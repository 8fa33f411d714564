//! Column declarations attached to an endpoint's schema.

use serde::{Deserialize, Serialize};

use crate::scalar::{NativeType, ScalarType};

/// Describes how one raw request value is coerced and whether its absence
/// is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInformation {
    pub scalar: ScalarType,
    pub native: NativeType,
    /// Absent-and-required is a coercion error naming the column.
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl ColumnInformation {
    fn simple(scalar: ScalarType, native: NativeType) -> Self {
        Self {
            scalar,
            native,
            required: true,
        }
    }

    /// Shorthand for an `i8` integer column.
    pub fn int8() -> Self {
        Self::simple(ScalarType::Integer, NativeType::I8)
    }

    /// Shorthand for a `u8` integer column.
    pub fn uint8() -> Self {
        Self::simple(ScalarType::Integer, NativeType::U8)
    }

    /// Shorthand for an `i16` integer column.
    pub fn int16() -> Self {
        Self::simple(ScalarType::Integer, NativeType::I16)
    }

    /// Shorthand for a `u16` integer column.
    pub fn uint16() -> Self {
        Self::simple(ScalarType::Integer, NativeType::U16)
    }

    /// Shorthand for an `i32` integer column.
    pub fn int32() -> Self {
        Self::simple(ScalarType::Integer, NativeType::I32)
    }

    /// Shorthand for a `u32` integer column.
    pub fn uint32() -> Self {
        Self::simple(ScalarType::Integer, NativeType::U32)
    }

    /// Shorthand for an `i64` integer column.
    pub fn int64() -> Self {
        Self::simple(ScalarType::Integer, NativeType::I64)
    }

    /// Shorthand for a `u64` integer column.
    pub fn uint64() -> Self {
        Self::simple(ScalarType::Integer, NativeType::U64)
    }

    /// Shorthand for an `f32` float column.
    pub fn float32() -> Self {
        Self::simple(ScalarType::Float, NativeType::F32)
    }

    /// Shorthand for an `f64` float column.
    pub fn float64() -> Self {
        Self::simple(ScalarType::Float, NativeType::F64)
    }

    /// Shorthand for a string column.
    pub fn string() -> Self {
        Self::simple(ScalarType::String, NativeType::Str)
    }

    /// Shorthand for a boolean column.
    pub fn boolean() -> Self {
        Self::simple(ScalarType::Bool, NativeType::Bool)
    }

    /// Shorthand for an image column (raw encoded bytes after validation).
    pub fn image() -> Self {
        Self::simple(ScalarType::Image, NativeType::Bytes)
    }

    /// Marks the column as optional: absence is skipped, not an error.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthands_are_required_by_default() {
        assert!(ColumnInformation::int32().required);
        assert!(!ColumnInformation::int32().optional().required);
    }

    #[test]
    fn serde_defaults_required_to_true() {
        let parsed: ColumnInformation =
            serde_json::from_str(r#"{"scalar":"integer","native":"i32"}"#).unwrap();
        assert!(parsed.required);
        assert_eq!(parsed.scalar, ScalarType::Integer);
        assert_eq!(parsed.native, NativeType::I32);
    }
}
