//! Snapshot import/export
//!
//! The domain snapshot format is plain JSON matching the model in
//! [`crate::model`], stable under serialize/deserialize round-trips. It is
//! used for import/export and for cross-replica snapshot comparison in
//! tests.
//!
//! [`validate`] performs the structural pre-flight checks on externally
//! supplied data before anything reaches the codec: the codec itself
//! assumes well-formed input and does not re-validate.

use serde_json::Value;

use crate::doc::keys;
use crate::error::SyncError;
use crate::model::Project;

/// Serialize a project snapshot to JSON.
pub fn to_json(project: &Project) -> Result<Value, SyncError> {
    Ok(serde_json::to_value(project)?)
}

/// Parse and validate an externally supplied snapshot.
pub fn from_json(value: &Value) -> Result<Project, SyncError> {
    validate(value)?;
    Ok(serde_json::from_value(value.clone())?)
}

/// Structural pre-flight validation: identity fields present and typed,
/// collection keys (when present) array-typed.
pub fn validate(value: &Value) -> Result<(), SyncError> {
    let object = value
        .as_object()
        .ok_or_else(|| SyncError::Snapshot("snapshot is not an object".to_string()))?;

    for field in [keys::ID, keys::NAME] {
        match object.get(field) {
            Some(Value::String(s)) if !s.is_empty() => {}
            Some(_) => {
                return Err(SyncError::Snapshot(format!(
                    "field '{field}' is not a string"
                )))
            }
            None => return Err(SyncError::Snapshot(format!("missing field '{field}'"))),
        }
    }

    for collection in keys::COLLECTIONS {
        if let Some(v) = object.get(*collection) {
            if !v.is_array() {
                return Err(SyncError::Snapshot(format!(
                    "collection '{collection}' is not an array"
                )));
            }
        }
    }

    if let Some(view_config) = object.get(keys::VIEW_CONFIG) {
        if !view_config.is_object() {
            return Err(SyncError::Snapshot(
                "'viewConfig' is not an object".to_string(),
            ));
        }
    }

    if let Some(temporal) = object.get(keys::TEMPORAL) {
        if !temporal.is_object() && !temporal.is_null() {
            return Err(SyncError::Snapshot(
                "'temporal' is neither an object nor null".to_string(),
            ));
        }
    }

    Ok(())
}
