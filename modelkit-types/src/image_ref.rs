//! Image reference resolution: local paths and http(s) URLs.

use std::io::Cursor;

use image::ImageReader;
use tracing::debug;

use crate::CoercionError;

/// Resolves an image reference to its raw encoded bytes.
///
/// The reference is either a local filesystem path or an `http(s)://` URL;
/// no other schemes are accepted. The bytes are decoded just far enough to
/// confirm the payload is a well-formed image (readable dimensions), then
/// returned unchanged so they can cross the wire without re-encoding.
///
/// This performs blocking I/O; async callers run it on a blocking thread.
pub fn fetch_image(reference: &str) -> Result<Vec<u8>, CoercionError> {
    let bytes = if reference.starts_with("http://") || reference.starts_with("https://") {
        fetch_url(reference)?
    } else if reference.contains("://") {
        let scheme = reference.split("://").next().unwrap_or_default();
        return Err(CoercionError::UnsupportedScheme(scheme.to_string()));
    } else {
        std::fs::read(reference).map_err(|source| CoercionError::ImageRead {
            path: reference.to_string(),
            source,
        })?
    };

    validate_image(reference, &bytes)?;
    Ok(bytes)
}

fn fetch_url(url: &str) -> Result<Vec<u8>, CoercionError> {
    debug!(url, "fetching image payload");
    let response = reqwest::blocking::get(url).map_err(|e| CoercionError::ImageFetch {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    let response = response
        .error_for_status()
        .map_err(|e| CoercionError::ImageFetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;
    let body = response.bytes().map_err(|e| CoercionError::ImageFetch {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    Ok(body.to_vec())
}

/// Confirms the bytes decode as an image by reading the dimensions.
pub(crate) fn validate_image(reference: &str, bytes: &[u8]) -> Result<(), CoercionError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CoercionError::ImageDecode {
            reference: reference.to_string(),
            message: e.to_string(),
        })?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| CoercionError::ImageDecode {
            reference: reference.to_string(),
            message: e.to_string(),
        })?;
    debug!(reference, width, height, "validated image payload");
    Ok(())
}
