//! Mutable property store with synchronous change notification.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde_json::Value;
use tracing::debug;

use crate::ContextError;

type Observer = Box<dyn Fn(&str, &Value) -> Result<(), String> + Send + Sync>;

/// Key/value store owned by a model context.
///
/// Writes commit first, then notify every registered observer synchronously
/// in registration order on the mutating thread. An observer failure is
/// returned to the mutator; the committed value is never rolled back, and
/// later observers still run. Observers may block the mutating thread;
/// running them elsewhere is the caller's responsibility, not a guarantee
/// made here.
#[derive(Default)]
pub struct PropertyStore {
    values: Mutex<BTreeMap<String, Value>>,
    observers: Mutex<Vec<Observer>>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits `value` under `name` and notifies observers.
    pub fn set(&self, name: &str, value: Value) -> Result<(), ContextError> {
        {
            let mut values = self.values.lock().expect("property store poisoned");
            values.insert(name.to_string(), value.clone());
        }
        debug!(property = name, "property committed");

        let observers = self.observers.lock().expect("property observers poisoned");
        let mut first_error = None;
        for observer in observers.iter() {
            if let Err(message) = observer(name, &value) {
                if first_error.is_none() {
                    first_error = Some(message);
                }
            }
        }
        match first_error {
            Some(message) => Err(ContextError::PropertyCallback(message)),
            None => Ok(()),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.values
            .lock()
            .expect("property store poisoned")
            .get(name)
            .cloned()
    }

    /// Registers a change observer, appended after existing ones.
    pub fn observe(&self, observer: impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + 'static) {
        self.observers
            .lock()
            .expect("property observers poisoned")
            .push(Box::new(observer));
    }

    /// Snapshot of all current values, for bundle serialization.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.values.lock().expect("property store poisoned").clone()
    }

    /// Replaces the whole value map without notifying, used at bundle load.
    pub(crate) fn restore(&self, values: BTreeMap<String, Value>) {
        *self.values.lock().expect("property store poisoned") = values;
    }
}
