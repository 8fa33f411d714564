//! HTTP serving dispatcher for model bundles.
//!
//! One worker process serves one loaded bundle. The router exposes model
//! introspection, endpoint invocation, and a healthcheck:
//!
//! - `GET|POST /api/model/{name}/info`
//! - `GET|POST /api/model/{name}/invoke`
//! - `GET|POST /api/model/{name}/invoke/{endpoint}`
//! - `GET|POST /healthcheck`

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use serde_json::Value;

use modelkit_context::{IdentityPrepare, LoadedModel, RoutineError, RoutineRegistry};
use modelkit_types::Record;

mod error;
mod handlers;
mod request;

pub use error::ApiError;

/// Build the HTTP API router over the loaded model.
pub fn build_router(model: Arc<LoadedModel>) -> Router {
    Router::new()
        .route("/healthcheck", get(handlers::healthcheck).post(handlers::healthcheck))
        .route(
            "/api/model/{name}/info",
            get(handlers::info).post(handlers::info),
        )
        .route(
            "/api/model/{name}/invoke",
            get(handlers::invoke_default).post(handlers::invoke_default),
        )
        .route(
            "/api/model/{name}/invoke/{endpoint}",
            get(handlers::invoke_endpoint).post(handlers::invoke_endpoint),
        )
        .with_state(model)
}

/// The registry every server ships with: an `identity` prepare and an `echo`
/// apply that reflects the coerced input back as JSON. Deployments register
/// their model crate's routines on top before loading a bundle.
pub fn builtin_registry() -> Result<RoutineRegistry, modelkit_context::ContextError> {
    let mut registry = RoutineRegistry::new();
    registry.register_prepare("identity", Arc::new(IdentityPrepare))?;
    registry.register_apply(
        "echo",
        Arc::new(|input: &Record| -> Result<Value, RoutineError> {
            serde_json::to_value(input).map_err(|e| RoutineError::new(e.to_string()))
        }),
    )?;
    Ok(registry)
}
