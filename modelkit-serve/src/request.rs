//! Request-value collection.
//!
//! An invocation's inputs can arrive three ways at once: query parameters,
//! urlencoded form fields, and multipart parts. They merge into one raw-value
//! map. Later sources win on a name collision, and uploaded files merge last
//! so a file always beats a same-named text field.

use std::collections::BTreeMap;

use axum::body::to_bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;

use modelkit_types::RawValue;

use crate::error::ApiError;

const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Merges query string, form body, and multipart body into one map of raw
/// values keyed by field name.
pub async fn collect_values(
    query: Option<&str>,
    request: Request,
) -> Result<BTreeMap<String, RawValue>, ApiError> {
    let mut values = BTreeMap::new();

    if let Some(query) = query {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| ApiError::BadRequest(format!("malformed query string: {e}")))?;
        for (name, value) in pairs {
            values.insert(name, RawValue::Text(value));
        }
    }

    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    match content_type.as_deref() {
        Some(ct) if ct.starts_with("multipart/form-data") => {
            collect_multipart(request, &mut values).await?;
        }
        Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => {
            collect_form(request, &mut values).await?;
        }
        // GET requests and bodyless POSTs carry values in the query alone.
        _ => {}
    }

    Ok(values)
}

async fn collect_form(
    request: Request,
    values: &mut BTreeMap<String, RawValue>,
) -> Result<(), ApiError> {
    let body = to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::BadRequest(format!("unreadable request body: {e}")))?;
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&body)
        .map_err(|e| ApiError::BadRequest(format!("malformed form body: {e}")))?;
    for (name, value) in pairs {
        values.insert(name, RawValue::Text(value));
    }
    Ok(())
}

async fn collect_multipart(
    request: Request,
    values: &mut BTreeMap<String, RawValue>,
) -> Result<(), ApiError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?;

    let mut files = BTreeMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart field: {e}")))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if field.file_name().is_some() {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("unreadable file field: {e}")))?;
            files.insert(name, RawValue::Bytes(data.to_vec()));
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("unreadable text field: {e}")))?;
            values.insert(name, RawValue::Text(text));
        }
    }

    // Files merge after text fields so they win collisions.
    values.append(&mut files);
    Ok(())
}
