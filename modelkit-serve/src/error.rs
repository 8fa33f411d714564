//! HTTP-facing error wrapper.
//!
//! Request-scoped failures map to structured JSON bodies: coercion problems
//! are the client's fault (400), a bad endpoint name is 404, and anything
//! that went wrong inside the model or the server itself is 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::error;

use modelkit_context::ContextError;

#[derive(Debug)]
pub enum ApiError {
    /// The request body or fields could not be read or parsed.
    BadRequest(String),
    /// A model-side failure, classified by its [`ContextError`] kind.
    Context(ContextError),
    /// The invocation task was cancelled or panicked.
    Internal(String),
}

impl From<ContextError> for ApiError {
    fn from(err: ContextError) -> Self {
        ApiError::Context(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Context(ContextError::Coercion(_)) => StatusCode::BAD_REQUEST,
            ApiError::Context(ContextError::UnknownEndpoint(_)) => StatusCode::NOT_FOUND,
            ApiError::Context(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(message) | ApiError::Internal(message) => message.clone(),
            ApiError::Context(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!(%status, message, "request failed");
        }
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelkit_context::RoutineError;
    use modelkit_types::CoercionError;

    #[test]
    fn coercion_maps_to_bad_request() {
        let err = ApiError::from(ContextError::Coercion(CoercionError::MissingColumn(
            "a".into(),
        )));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_endpoint_maps_to_not_found() {
        let err = ApiError::from(ContextError::UnknownEndpoint("ghost".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn routine_failure_maps_to_server_error() {
        let err = ApiError::from(ContextError::Routine(RoutineError::new("boom")));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message().contains("boom"));
    }
}
