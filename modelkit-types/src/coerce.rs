//! The per-request coercion pipeline.

use std::collections::BTreeMap;

use tracing::debug;

use crate::column::ColumnInformation;
use crate::image_ref;
use crate::scalar::{parse_bool, parse_float, parse_integer, ScalarType};
use crate::value::{RawValue, Record, TypedValue};
use crate::CoercionError;

/// Coerces a map of raw request values against an endpoint's column
/// declarations.
///
/// - `columns == None` means the endpoint was exported untyped: every value
///   passes through unconverted.
/// - A declared, required column with no value is an error naming the column.
/// - A declared, optional column with no value is skipped.
/// - Fields not covered by any declaration are forwarded unchanged; schema
///   rejection is the routine's business, not the pipeline's.
pub fn coerce_columns(
    columns: Option<&BTreeMap<String, ColumnInformation>>,
    input: &BTreeMap<String, RawValue>,
) -> Result<Record, CoercionError> {
    let Some(columns) = columns else {
        return Ok(input
            .iter()
            .map(|(name, raw)| (name.clone(), passthrough(raw)))
            .collect());
    };

    let mut record = Record::new();

    for (name, column) in columns {
        match input.get(name) {
            Some(raw) => {
                record.insert(name.clone(), coerce_value(name, column, raw)?);
            }
            None if column.required => {
                return Err(CoercionError::MissingColumn(name.clone()));
            }
            None => {
                debug!(column = %name, "optional column absent, skipping");
            }
        }
    }

    for (name, raw) in input {
        if !columns.contains_key(name) {
            record.insert(name.clone(), passthrough(raw));
        }
    }

    Ok(record)
}

fn passthrough(raw: &RawValue) -> TypedValue {
    match raw {
        RawValue::Text(s) => TypedValue::Text(s.clone()),
        RawValue::Bytes(b) => TypedValue::Bytes(b.clone()),
    }
}

fn coerce_value(
    name: &str,
    column: &ColumnInformation,
    raw: &RawValue,
) -> Result<TypedValue, CoercionError> {
    match column.scalar {
        ScalarType::Bool => Ok(TypedValue::Bool(parse_bool(text_of(name, raw)?)?)),
        ScalarType::Integer => Ok(TypedValue::Integer(parse_integer(text_of(name, raw)?)?)),
        ScalarType::Float => Ok(TypedValue::Float(parse_float(text_of(name, raw)?)?)),
        ScalarType::String => Ok(TypedValue::Text(text_of(name, raw)?.to_string())),
        ScalarType::Image => match raw {
            // Uploaded bytes: validate in place, keep the encoding.
            RawValue::Bytes(bytes) => {
                image_ref::validate_image(name, bytes)?;
                Ok(TypedValue::Bytes(bytes.clone()))
            }
            RawValue::Text(reference) => {
                Ok(TypedValue::Bytes(image_ref::fetch_image(reference)?))
            }
        },
    }
}

/// Scalar columns coerce from text; uploaded bytes are accepted when they
/// hold valid UTF-8 (clients may send any field as a file part).
fn text_of<'a>(name: &str, raw: &'a RawValue) -> Result<&'a str, CoercionError> {
    match raw {
        RawValue::Text(s) => Ok(s),
        RawValue::Bytes(b) => std::str::from_utf8(b)
            .map_err(|_| CoercionError::InvalidUtf8(name.to_string())),
    }
}
