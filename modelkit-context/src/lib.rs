//! Model context for the modelkit runtime.
//!
//! The context is the in-process registry for one model, on both sides of
//! the bundle file:
//! - training side: [`ModelContext::init`] → [`ModelContext::export`] →
//!   [`ModelContext::save`]
//! - serving side: [`LoadedModel::load`] → [`ModelContext::apply`], repeatably
//!
//! Routines are plain Rust implementations of [`ApplyRoutine`] /
//! [`PrepareRoutine`] registered by name in a [`RoutineRegistry`]; bundles
//! store only the names. The host binary links the model code and registers
//! it under those names before loading a bundle.

mod context;
mod error;
mod load;
mod properties;
mod routine;
mod store;

pub use context::{
    normalize_name, reset, EndpointDescription, EndpointSpec, ModelContext, ModelDescription,
    DEFAULT_ENDPOINT, MODEL_ID_HEADER, MODEL_PATH_HEADER, MODEL_VERSION_HEADER,
    SAVE_STATUS_HEADER,
};
pub use error::ContextError;
pub use load::LoadedModel;
pub use properties::PropertyStore;
pub use routine::{ApplyRoutine, IdentityPrepare, PrepareRoutine, RoutineError, RoutineRegistry};
pub use store::SharedStore;
