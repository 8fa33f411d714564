//! Type system for the modelkit serving runtime.
//!
//! This crate defines everything the serving layer needs to turn raw request
//! values into typed values a model routine can consume:
//! - [`ScalarType`] / [`NativeType`] - declared column types
//! - [`ColumnInformation`] - per-column coercion rules (type + required flag)
//! - [`RawValue`] / [`TypedValue`] - values before and after coercion
//! - [`coerce_columns`] - the coercion pipeline run on every request
//! - [`fetch_image`] - image reference resolution (path or http(s) URL)
//!
//! Column-type auto-deduction from sample data is deliberately not provided:
//! callers either declare column types explicitly or export an untyped
//! endpoint whose values pass through unconverted.

mod coerce;
mod column;
mod image_ref;
mod scalar;
mod value;

pub use coerce::coerce_columns;
pub use column::ColumnInformation;
pub use image_ref::fetch_image;
pub use scalar::{parse_bool, parse_float, parse_integer, NativeType, ScalarType};
pub use value::{RawValue, Record, TypedValue};

/// Errors raised while coercing raw request values into typed values.
#[derive(Debug, thiserror::Error)]
pub enum CoercionError {
    #[error("invalid boolean literal: {0:?}")]
    InvalidBool(String),

    #[error("invalid integer literal: {0:?}")]
    InvalidInteger(String),

    #[error("invalid float literal: {0:?}")]
    InvalidFloat(String),

    #[error("value for column {0:?} is not valid UTF-8")]
    InvalidUtf8(String),

    #[error("missing value for required column {0:?}")]
    MissingColumn(String),

    #[error("unsupported image reference scheme: {0}")]
    UnsupportedScheme(String),

    #[error("failed to fetch image from {url}: {message}")]
    ImageFetch { url: String, message: String },

    #[error("failed to read image file {path}: {source}")]
    ImageRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("data from {reference} does not decode as an image: {message}")]
    ImageDecode { reference: String, message: String },
}
