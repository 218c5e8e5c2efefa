//! Operation abstraction and the kind registry
//!
//! An operation is a named, parameterized, validated recipe that computes a
//! [`Change`](crate::change::Change) against a project. Operations never
//! mutate the project directly; all mutation flows through the change they
//! return. Every operation is fully re-derivable from its serialized
//! parameters, which is what makes replay-on-reload possible.

use crate::change::Change;
use crate::error::{Error, Result};
use crate::table::Project;
use serde_json::Value;
use std::collections::HashMap;

/// A named, parameterized recipe that computes a change against a project
pub trait Operation: std::fmt::Debug {
    /// The registry key identifying this operation kind, e.g. "core/text-transform"
    fn op_kind(&self) -> &'static str;

    /// Check that required parameters are present and internally consistent.
    /// Does not check column existence; columns may change between
    /// validation and application, so that is a runtime condition.
    fn validate(&self) -> Result<()>;

    /// Human-readable summary for history display
    fn describe(&self) -> String;

    /// Resolve parameters against the current project, run row selection,
    /// execute the algorithm, and return the resulting change. Performs no
    /// mutation; fails hard if a referenced column no longer resolves.
    fn create_change(&self, project: &Project) -> Result<Box<dyn Change>>;

    /// Serialize to the persisted structured record
    fn to_value(&self) -> Result<Value>;
}

/// Decoder from a persisted structured record to a concrete operation
pub type DecodeFn = fn(&Value) -> Result<Box<dyn Operation>>;

/// Open registry mapping operation kind keys to decoders.
///
/// New transformation kinds register themselves without modifying the core
/// dispatch logic.
pub struct OperationRegistry {
    decoders: HashMap<String, DecodeFn>,
}

impl OperationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Create a registry pre-seeded with the built-in core operations
    pub fn with_core_operations() -> Self {
        let mut registry = Self::new();
        crate::operations::register_core_operations(&mut registry);
        registry
    }

    /// Register a decoder for an operation kind
    pub fn register(&mut self, kind: impl Into<String>, decode: DecodeFn) {
        self.decoders.insert(kind.into(), decode);
    }

    /// Decode a persisted operation record, dispatching on its "op" key
    pub fn decode(&self, value: &Value) -> Result<Box<dyn Operation>> {
        let kind = value
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::UnknownOperation("<missing op field>".to_string()))?;
        let decode = self
            .decoders
            .get(kind)
            .ok_or_else(|| Error::UnknownOperation(kind.to_string()))?;
        decode(value)
    }

    /// Decode a recipe: a JSON array of persisted operation records
    pub fn decode_recipe(&self, value: &Value) -> Result<Vec<Box<dyn Operation>>> {
        let entries = value
            .as_array()
            .ok_or_else(|| Error::InvalidRecipe("expected a JSON array".to_string()))?;
        entries.iter().map(|entry| self.decode(entry)).collect()
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::with_core_operations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_operation_kind() {
        let registry = OperationRegistry::with_core_operations();
        let value: Value =
            serde_json::from_str("{\"op\":\"core/no-such-operation\"}").unwrap();
        assert!(matches!(
            registry.decode(&value),
            Err(Error::UnknownOperation(kind)) if kind == "core/no-such-operation"
        ));
    }

    #[test]
    fn test_missing_op_field() {
        let registry = OperationRegistry::with_core_operations();
        let value: Value = serde_json::from_str("{\"columnName\":\"A\"}").unwrap();
        assert!(matches!(
            registry.decode(&value),
            Err(Error::UnknownOperation(_))
        ));
    }

    #[test]
    fn test_decode_then_encode_preserves_wire_form() {
        let registry = OperationRegistry::with_core_operations();
        let json = "{\"op\":\"core/multivalued-cell-join\",\
                     \"description\":\"Join multi-valued cells in column v\",\
                     \"columnName\":\"v\",\
                     \"keyColumnName\":\"k\",\
                     \"separator\":\",\"}";
        let value: Value = serde_json::from_str(json).unwrap();
        let op = registry.decode(&value).unwrap();
        assert_eq!(op.op_kind(), "core/multivalued-cell-join");
        assert_eq!(
            serde_json::to_string(&op.to_value().unwrap()).unwrap(),
            json
        );
    }

    #[test]
    fn test_decode_recipe_dispatches_each_entry() {
        let registry = OperationRegistry::with_core_operations();
        let value: Value = serde_json::from_str(
            "[{\"op\":\"core/multivalued-cell-join\",\
               \"description\":\"Join multi-valued cells in column v\",\
               \"columnName\":\"v\",\"keyColumnName\":\"k\",\"separator\":\",\"},\
              {\"op\":\"core/text-transform\",\
               \"description\":\"Text transform on cells in column v using expression trim(value)\",\
               \"engineConfig\":{\"mode\":\"row-based\",\"facets\":[]},\
               \"columnName\":\"v\",\"expression\":\"trim(value)\",\
               \"onError\":\"keep-original\",\"repeat\":false,\"repeatCount\":10}]",
        )
        .unwrap();
        let operations = registry.decode_recipe(&value).unwrap();
        assert_eq!(operations.len(), 2);
        assert_eq!(operations[0].op_kind(), "core/multivalued-cell-join");
        assert_eq!(operations[1].op_kind(), "core/text-transform");
    }

    #[test]
    fn test_recipe_must_be_an_array() {
        let registry = OperationRegistry::with_core_operations();
        let value: Value = serde_json::from_str("{\"op\":\"x\"}").unwrap();
        assert!(matches!(
            registry.decode_recipe(&value),
            Err(Error::InvalidRecipe(_))
        ));
    }
}
