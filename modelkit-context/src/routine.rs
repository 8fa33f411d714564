//! The routine seam: typed prepare/apply interfaces and the name registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use modelkit_types::Record;

use crate::ContextError;

/// A failure inside model code. Distinct from coercion errors so the HTTP
/// boundary can report it as a server-side fault.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RoutineError(String);

impl RoutineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The prediction entry point of an endpoint. Receives the prepared input
/// vector and returns a JSON-serializable result.
pub trait ApplyRoutine: Send + Sync {
    fn apply(&self, input: &Record) -> Result<Value, RoutineError>;
}

/// Optional input transformation run before [`ApplyRoutine::apply`].
pub trait PrepareRoutine: Send + Sync {
    fn prepare(&self, input: Record) -> Result<Record, RoutineError>;
}

impl<F> ApplyRoutine for F
where
    F: Fn(&Record) -> Result<Value, RoutineError> + Send + Sync,
{
    fn apply(&self, input: &Record) -> Result<Value, RoutineError> {
        self(input)
    }
}

impl<F> PrepareRoutine for F
where
    F: Fn(Record) -> Result<Record, RoutineError> + Send + Sync,
{
    fn prepare(&self, input: Record) -> Result<Record, RoutineError> {
        self(input)
    }
}

/// The default prepare: hands the coerced record through untouched.
pub struct IdentityPrepare;

impl PrepareRoutine for IdentityPrepare {
    fn prepare(&self, input: Record) -> Result<Record, RoutineError> {
        Ok(input)
    }
}

/// Maps routine names to implementations.
///
/// Endpoints and bundles reference routines only by these names, so the set
/// registered here is the full universe of model code a process can serve.
#[derive(Clone, Default)]
pub struct RoutineRegistry {
    apply: BTreeMap<String, Arc<dyn ApplyRoutine>>,
    prepare: BTreeMap<String, Arc<dyn PrepareRoutine>>,
}

impl RoutineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an apply routine; duplicate names are rejected.
    pub fn register_apply(
        &mut self,
        name: impl Into<String>,
        routine: Arc<dyn ApplyRoutine>,
    ) -> Result<(), ContextError> {
        let name = name.into();
        if self.apply.contains_key(&name) {
            return Err(ContextError::DuplicateRoutine(name));
        }
        self.apply.insert(name, routine);
        Ok(())
    }

    /// Registers a prepare routine; duplicate names are rejected.
    pub fn register_prepare(
        &mut self,
        name: impl Into<String>,
        routine: Arc<dyn PrepareRoutine>,
    ) -> Result<(), ContextError> {
        let name = name.into();
        if self.prepare.contains_key(&name) {
            return Err(ContextError::DuplicateRoutine(name));
        }
        self.prepare.insert(name, routine);
        Ok(())
    }

    pub fn apply_routine(&self, name: &str) -> Option<Arc<dyn ApplyRoutine>> {
        self.apply.get(name).cloned()
    }

    pub fn prepare_routine(&self, name: &str) -> Option<Arc<dyn PrepareRoutine>> {
        self.prepare.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn closures_are_routines() {
        let mut registry = RoutineRegistry::new();
        registry
            .register_apply("const", Arc::new(|_: &Record| Ok(json!({"v": 1}))))
            .unwrap();
        let routine = registry.apply_routine("const").unwrap();
        assert_eq!(routine.apply(&Record::new()).unwrap(), json!({"v": 1}));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = RoutineRegistry::new();
        registry
            .register_apply("r", Arc::new(|_: &Record| Ok(json!(null))))
            .unwrap();
        let err = registry
            .register_apply("r", Arc::new(|_: &Record| Ok(json!(null))))
            .unwrap_err();
        assert!(matches!(err, ContextError::DuplicateRoutine(_)));
    }

    #[test]
    fn identity_prepare_is_a_no_op() {
        let mut record = Record::new();
        record.insert("a".into(), modelkit_types::TypedValue::Integer(1));
        let out = IdentityPrepare.prepare(record.clone()).unwrap();
        assert_eq!(out, record);
    }
}
