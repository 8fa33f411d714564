//! Route handlers for the model API.

use std::sync::Arc;

use axum::extract::{Path, RawQuery, Request, State};
use axum::response::Json;
use serde_json::Value;
use tracing::debug;

use modelkit_context::{LoadedModel, ModelDescription};

use crate::error::ApiError;
use crate::request::collect_values;

pub async fn healthcheck() -> &'static str {
    "OK"
}

pub async fn info(
    State(model): State<Arc<LoadedModel>>,
    Path(name): Path<String>,
) -> Json<ModelDescription> {
    debug!(model = %name, "describing model");
    Json(model.description())
}

pub async fn invoke_default(
    state: State<Arc<LoadedModel>>,
    Path(name): Path<String>,
    query: RawQuery,
    request: Request,
) -> Result<Json<Value>, ApiError> {
    invoke(state, name, None, query, request).await
}

pub async fn invoke_endpoint(
    state: State<Arc<LoadedModel>>,
    Path((name, endpoint)): Path<(String, String)>,
    query: RawQuery,
    request: Request,
) -> Result<Json<Value>, ApiError> {
    invoke(state, name, Some(endpoint), query, request).await
}

async fn invoke(
    State(model): State<Arc<LoadedModel>>,
    name: String,
    endpoint: Option<String>,
    RawQuery(query): RawQuery,
    request: Request,
) -> Result<Json<Value>, ApiError> {
    let values = collect_values(query.as_deref(), request).await?;
    debug!(
        model = %name,
        endpoint = endpoint.as_deref().unwrap_or("default"),
        fields = values.len(),
        "invoking"
    );

    // Coercion may fetch or read image bytes, which blocks.
    let result = tokio::task::spawn_blocking(move || {
        model.model().apply(endpoint.as_deref(), &values)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("invocation task failed: {e}")))??;

    Ok(Json(result))
}
