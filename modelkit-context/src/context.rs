//! The model context: endpoint registration, invocation, and bundle save.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use modelkit_bundle::{Bundle, BundleBuilder, BundleManifest, EndpointRecord};
use modelkit_types::{coerce_columns, ColumnInformation, RawValue};

use crate::properties::PropertyStore;
use crate::routine::{ApplyRoutine, IdentityPrepare, PrepareRoutine, RoutineRegistry};
use crate::ContextError;

/// Endpoint name used when a caller does not pick one.
pub const DEFAULT_ENDPOINT: &str = "default";

/// Stderr announcement headers consumed by external log collection.
pub const MODEL_ID_HEADER: &str = "Model-Id";
pub const MODEL_VERSION_HEADER: &str = "Model-Version";
pub const MODEL_PATH_HEADER: &str = "Model-Path";
pub const SAVE_STATUS_HEADER: &str = "Save-Status";

/// One context per process on the training side.
static CONTEXT_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Drops the single-init guard so a new context can be created.
///
/// Exists for test harnesses that exercise the training lifecycle more than
/// once per process; production code initializes exactly once at startup.
pub fn reset() {
    CONTEXT_INITIALIZED.store(false, Ordering::SeqCst);
}

/// Normalizes a model id: common delimiters become `-`, every other
/// character outside `[a-zA-Z0-9.-]` is dropped.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, ' ' | '_' | '+') { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.'))
        .collect()
}

/// Writes one `<Header-Name>:<value>` line to stderr, flushed immediately.
fn announce(header: &str, value: &str) {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{header}:{value}");
    let _ = stderr.flush();
}

/// Declares one endpoint for [`ModelContext::export`].
#[derive(Debug, Clone)]
pub struct EndpointSpec {
    name: String,
    apply: String,
    prepare: Option<String>,
    columns: Option<BTreeMap<String, ColumnInformation>>,
}

impl EndpointSpec {
    /// Declares an endpoint backed by the named apply routine, registered
    /// under [`DEFAULT_ENDPOINT`] unless renamed.
    pub fn new(apply: impl Into<String>) -> Self {
        Self {
            name: DEFAULT_ENDPOINT.to_string(),
            apply: apply.into(),
            prepare: None,
            columns: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn prepare(mut self, name: impl Into<String>) -> Self {
        self.prepare = Some(name.into());
        self
    }

    /// Declares one column. Endpoints with no declared columns are untyped
    /// and receive request values as-is.
    pub fn column(mut self, name: impl Into<String>, info: ColumnInformation) -> Self {
        self.columns
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), info);
        self
    }

    pub fn columns(mut self, columns: BTreeMap<String, ColumnInformation>) -> Self {
        self.columns = Some(columns);
        self
    }
}

struct Endpoint {
    record: EndpointRecord,
    apply: Arc<dyn ApplyRoutine>,
    prepare: Arc<dyn PrepareRoutine>,
}

/// Introspection description of a whole model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescription {
    pub model_id: String,
    pub model_version: String,
    pub endpoints: BTreeMap<String, EndpointDescription>,
}

/// Introspection description of one endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointDescription {
    pub name: String,
    /// Declared input columns; `None` for untyped endpoints.
    pub input: Option<BTreeMap<String, ColumnInformation>>,
}

/// The in-process registry of endpoints and properties for one model.
pub struct ModelContext {
    model_id: String,
    model_version: String,
    registry: RoutineRegistry,
    endpoints: BTreeMap<String, Endpoint>,
    properties: PropertyStore,
    required_properties: Vec<String>,
    saved: bool,
}

impl ModelContext {
    /// Initializes the process's model context.
    ///
    /// Fails if a context was already initialized in this process, or if the
    /// model id is empty after normalization. On success the normalized id
    /// and version are announced on stderr for external log scraping, the
    /// only externally observable side effect of initialization.
    pub fn init(
        model_id: &str,
        model_version: &str,
        registry: RoutineRegistry,
    ) -> Result<Self, ContextError> {
        if CONTEXT_INITIALIZED.swap(true, Ordering::SeqCst) {
            return Err(ContextError::AlreadyInitialized);
        }

        let normalized = normalize_name(model_id);
        if normalized.is_empty() {
            // Leave the process free to retry with a usable id.
            CONTEXT_INITIALIZED.store(false, Ordering::SeqCst);
            return Err(ContextError::EmptyModelId(model_id.to_string()));
        }

        info!(model_id = %normalized, model_version, "model context initialized");
        announce(MODEL_ID_HEADER, &normalized);
        announce(MODEL_VERSION_HEADER, model_version);

        Ok(Self {
            model_id: normalized,
            model_version: model_version.to_string(),
            registry,
            endpoints: BTreeMap::new(),
            properties: PropertyStore::new(),
            required_properties: Vec::new(),
            saved: false,
        })
    }

    /// Rebuilds a context from an opened bundle, resolving routine names
    /// against `registry`. Does not touch the training-side init guard.
    pub(crate) fn from_bundle(
        bundle: &Bundle,
        registry: RoutineRegistry,
    ) -> Result<Self, ContextError> {
        let mut endpoints = BTreeMap::new();
        for (name, record) in bundle.endpoints() {
            let endpoint = resolve_endpoint(&registry, record.clone())?;
            endpoints.insert(name.clone(), endpoint);
        }

        let properties = PropertyStore::new();
        properties.restore(bundle.properties.clone());

        Ok(Self {
            model_id: bundle.manifest.model_id.clone(),
            model_version: bundle.manifest.model_version.clone(),
            registry,
            endpoints,
            properties,
            required_properties: bundle.manifest.required_properties.clone(),
            saved: true,
        })
    }

    /// Registers an endpoint. Duplicate names and unregistered routine
    /// references are rejected; so is any registration after `save`.
    pub fn export(&mut self, spec: EndpointSpec) -> Result<(), ContextError> {
        if self.saved {
            return Err(ContextError::AlreadySaved);
        }
        if self.endpoints.contains_key(&spec.name) {
            return Err(ContextError::DuplicateEndpoint(spec.name));
        }

        let record = EndpointRecord {
            name: spec.name.clone(),
            apply: spec.apply,
            prepare: spec.prepare,
            columns: spec.columns,
        };
        let endpoint = resolve_endpoint(&self.registry, record)?;

        info!(endpoint = %spec.name, "endpoint registered");
        self.endpoints.insert(spec.name, endpoint);
        Ok(())
    }

    /// Defines a model property with its initial value and records it as
    /// required by this model.
    pub fn define_property(&mut self, name: &str, initial: Value) -> Result<(), ContextError> {
        self.required_properties.push(name.to_string());
        self.properties.set(name, initial)
    }

    /// Registers a property change callback (see [`PropertyStore::observe`]).
    pub fn on_property_change(
        &self,
        callback: impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + 'static,
    ) {
        self.properties.observe(callback);
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    /// Invokes an endpoint with raw request values.
    ///
    /// `endpoint == None` picks [`DEFAULT_ENDPOINT`]. The values are coerced
    /// against the endpoint's column declarations, prepared, and applied.
    pub fn apply(
        &self,
        endpoint: Option<&str>,
        input: &BTreeMap<String, RawValue>,
    ) -> Result<Value, ContextError> {
        let name = endpoint.unwrap_or(DEFAULT_ENDPOINT);
        let endpoint = self
            .endpoints
            .get(name)
            .ok_or_else(|| ContextError::UnknownEndpoint(name.to_string()))?;

        debug!(endpoint = name, fields = input.len(), "invoking endpoint");
        let record = coerce_columns(endpoint.record.columns.as_ref(), input)?;
        let record = endpoint.prepare.prepare(record)?;
        let result = endpoint.apply.apply(&record)?;
        debug!(endpoint = name, "invocation complete");
        Ok(result)
    }

    /// Serializes the context into a bundle file at `path` and freezes it.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), ContextError> {
        if self.endpoints.is_empty() {
            return Err(ContextError::NoEndpoints);
        }
        let path = path.as_ref();

        let mut manifest = BundleManifest::new(&self.model_id, &self.model_version);
        manifest.required_properties = self.required_properties.clone();

        let mut builder = BundleBuilder::new(manifest).properties(self.properties.snapshot());
        for endpoint in self.endpoints.values() {
            builder = builder.endpoint(endpoint.record.clone());
        }
        builder.write_to(path)?;
        self.saved = true;

        info!(path = %path.display(), "model saved");
        announce(MODEL_PATH_HEADER, &path.display().to_string());
        announce(SAVE_STATUS_HEADER, "OK");
        Ok(())
    }

    /// Describes the model and every endpoint's declared schema.
    pub fn description(&self) -> ModelDescription {
        ModelDescription {
            model_id: self.model_id.clone(),
            model_version: self.model_version.clone(),
            endpoints: self
                .endpoints
                .iter()
                .map(|(name, ep)| (name.clone(), describe(ep)))
                .collect(),
        }
    }

    /// Describes one endpoint, failing if it does not exist.
    pub fn describe_endpoint(&self, name: &str) -> Result<EndpointDescription, ContextError> {
        self.endpoints
            .get(name)
            .map(describe)
            .ok_or_else(|| ContextError::UnknownEndpoint(name.to_string()))
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub fn endpoint_names(&self) -> Vec<String> {
        self.endpoints.keys().cloned().collect()
    }
}

// Routines are trait objects, so only the structural fields are shown.
impl fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelContext")
            .field("model_id", &self.model_id)
            .field("model_version", &self.model_version)
            .field("endpoints", &self.endpoint_names())
            .field("required_properties", &self.required_properties)
            .field("saved", &self.saved)
            .finish_non_exhaustive()
    }
}

fn describe(endpoint: &Endpoint) -> EndpointDescription {
    EndpointDescription {
        name: endpoint.record.name.clone(),
        input: endpoint.record.columns.clone(),
    }
}

fn resolve_endpoint(
    registry: &RoutineRegistry,
    record: EndpointRecord,
) -> Result<Endpoint, ContextError> {
    let apply = registry
        .apply_routine(&record.apply)
        .ok_or_else(|| ContextError::UnknownRoutine(record.apply.clone()))?;
    let prepare = match &record.prepare {
        Some(name) => registry
            .prepare_routine(name)
            .ok_or_else(|| ContextError::UnknownRoutine(name.clone()))?,
        None => Arc::new(IdentityPrepare),
    };
    Ok(Endpoint {
        record,
        apply,
        prepare,
    })
}
