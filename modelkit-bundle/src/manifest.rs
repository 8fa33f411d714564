//! Bundle manifest (manifest.json) within a model bundle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::BundleError;

/// Top-level metadata map embedded in every bundle.
///
/// Serialized as a flat JSON object with dotted keys so external consumers
/// can read `model.id` / `model.version` without knowing this type. Unknown
/// keys round-trip through `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Normalized model identifier.
    #[serde(rename = "model.id")]
    pub model_id: String,
    /// Model version string.
    #[serde(rename = "model.version")]
    pub model_version: String,
    /// Names of the endpoints stored under `endpoints/`.
    #[serde(rename = "model.endpoints", default)]
    pub endpoints: Vec<String>,
    /// Property names the model declared at training time.
    #[serde(rename = "model.required_properties", default)]
    pub required_properties: Vec<String>,
    /// Version of the engine that wrote the bundle.
    #[serde(rename = "engine.version", default)]
    pub engine_version: String,
    /// Engine-specific keys preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl BundleManifest {
    pub fn new(model_id: impl Into<String>, model_version: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            model_version: model_version.into(),
            endpoints: Vec::new(),
            required_properties: Vec::new(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            extra: BTreeMap::new(),
        }
    }

    /// Dict-style metadata lookup over known and engine-specific keys.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "model.id" => Some(Value::String(self.model_id.clone())),
            "model.version" => Some(Value::String(self.model_version.clone())),
            "model.endpoints" => serde_json::to_value(&self.endpoints).ok(),
            "model.required_properties" => {
                serde_json::to_value(&self.required_properties).ok()
            }
            "engine.version" => Some(Value::String(self.engine_version.clone())),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Validates the manifest for required fields and constraints.
    pub fn validate(&self) -> Result<(), BundleError> {
        if self.model_id.is_empty() {
            return Err(BundleError::ManifestInvalid("model.id is required".into()));
        }
        if self.model_version.is_empty() {
            return Err(BundleError::ManifestInvalid(
                "model.version is required".into(),
            ));
        }
        if self.endpoints.is_empty() {
            return Err(BundleError::ManifestInvalid(
                "bundle must declare at least one endpoint".into(),
            ));
        }
        Ok(())
    }
}
