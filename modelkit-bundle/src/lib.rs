//! Portable model bundle format.
//!
//! A bundle is a zip archive, written once at training time and read-only
//! afterward, containing:
//! - `manifest.json`          - flat metadata map (`model.id`, `model.version`,
//!   `model.endpoints`, `model.required_properties`, engine-specific keys)
//! - `properties.json`        - property values at save time
//! - `endpoints/<name>.json`  - one [`EndpointRecord`] per endpoint
//!
//! Endpoint records reference their apply/prepare routines by name; the
//! serving process resolves those names against its routine registry when it
//! loads the bundle. Model code is linked into the host binary, never
//! serialized into the bundle.

mod archive;
mod error;
mod manifest;

pub use archive::{Bundle, BundleBuilder, BundleEntry, EndpointRecord};
pub use error::BundleError;
pub use manifest::BundleManifest;
