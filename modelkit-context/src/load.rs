//! Serve-time bundle handle.

use std::path::Path;

use serde_json::Value;
use tracing::info;

use modelkit_bundle::Bundle;

use crate::context::{ModelContext, ModelDescription};
use crate::routine::RoutineRegistry;
use crate::ContextError;

/// A loaded bundle plus its reconstructed model context.
///
/// A serving process loads exactly one of these at startup. The bundle's
/// file handle is already released by the time `load` returns; the handle
/// only keeps the parsed contents.
#[derive(Debug)]
pub struct LoadedModel {
    bundle: Bundle,
    model: ModelContext,
}

impl LoadedModel {
    /// Opens the bundle at `path` and resolves its endpoints against
    /// `registry`. Any missing routine makes the whole load fail.
    pub fn load(path: impl AsRef<Path>, registry: RoutineRegistry) -> Result<Self, ContextError> {
        let bundle = Bundle::open(path)?;
        let model = ModelContext::from_bundle(&bundle, registry)?;
        info!(
            model_id = model.model_id(),
            model_version = model.model_version(),
            endpoints = model.endpoint_names().len(),
            "bundle loaded"
        );
        Ok(Self { bundle, model })
    }

    /// Dict-style metadata lookup over the bundle manifest.
    pub fn metadata(&self, key: &str) -> Option<Value> {
        self.bundle.metadata(key)
    }

    /// The reconstructed model context.
    pub fn model(&self) -> &ModelContext {
        &self.model
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    /// Model description for the introspection endpoint.
    pub fn description(&self) -> ModelDescription {
        self.model.description()
    }
}
