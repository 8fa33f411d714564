//! Identity-stable shared store for model routines.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A mutable holder usable by prediction code, identified by a token that
/// survives duplication through the bundle serialization path.
///
/// Only the identity token is serialized: two handles deserialized from the
/// same original compare equal by [`SharedStore::id`], while their attribute
/// maps stay independent and process-local. This type provides identity
/// stability, not cross-process synchronization; callers needing the latter
/// must use an external shared-state service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedStore {
    id: String,
    #[serde(skip)]
    attrs: BTreeMap<String, Value>,
}

impl SharedStore {
    /// Creates a store with a fresh identity token.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            attrs: BTreeMap::new(),
        }
    }

    /// Creates a store with a caller-chosen identity token.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// The stable identity token.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.attrs.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialization_preserves_identity_only() {
        let mut original = SharedStore::with_id("store-1");
        original.set("hits", json!(3));

        let text = serde_json::to_string(&original).unwrap();
        let mut dup: SharedStore = serde_json::from_str(&text).unwrap();

        assert_eq!(dup.id(), original.id());
        // Attributes do not travel with the handle.
        assert!(dup.get("hits").is_none());

        // Independent writes stay independent.
        dup.set("hits", json!(9));
        assert_eq!(original.get("hits"), Some(&json!(3)));
        assert_eq!(dup.get("hits"), Some(&json!(9)));
    }

    #[test]
    fn fresh_stores_get_distinct_tokens() {
        assert_ne!(SharedStore::new().id(), SharedStore::new().id());
    }
}
