//! Error types for the context crate.
//!
//! Variant groups follow the runtime's error-kind contract: initialization
//! and registration errors are fatal to the training path; coercion maps to
//! a client error at the HTTP boundary; routine errors map to a server
//! error; bundle errors are fatal at load time.

use thiserror::Error;

use crate::routine::RoutineError;

#[derive(Debug, Error)]
pub enum ContextError {
    // Initialization
    #[error("model context already initialized in this process")]
    AlreadyInitialized,

    #[error("model id {0:?} is empty after normalization")]
    EmptyModelId(String),

    // Registration
    #[error("endpoint {0:?} already registered")]
    DuplicateEndpoint(String),

    #[error("routine {0:?} already registered")]
    DuplicateRoutine(String),

    #[error("routine {0:?} is not registered")]
    UnknownRoutine(String),

    #[error("context already saved; endpoints can no longer be registered")]
    AlreadySaved,

    #[error("cannot save a context with no registered endpoints")]
    NoEndpoints,

    // Invocation
    #[error("unknown endpoint {0:?}")]
    UnknownEndpoint(String),

    #[error(transparent)]
    Coercion(#[from] modelkit_types::CoercionError),

    #[error("routine failed: {0}")]
    Routine(#[from] RoutineError),

    // Properties
    #[error("property change callback failed: {0}")]
    PropertyCallback(String),

    // Bundle I/O
    #[error(transparent)]
    Bundle(#[from] modelkit_bundle::BundleError),
}
