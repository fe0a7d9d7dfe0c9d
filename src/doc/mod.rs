//! Document schema and typed access helpers
//!
//! The replicated document holds one root map container, [`keys::PROJECT`],
//! laid out as an arena of flat sequences:
//!
//! ```text
//! project (map)
//!   ├── id, name                       - scalar values
//!   ├── contexts, relationships, ...   - one list container per collection,
//!   │                                    each element a keyed map container
//!   ├── viewConfig (map)
//!   │     └── flowStages (list)
//!   └── temporal                       - null sentinel, or map container
//!         ├── enabled                    { enabled, keyframes }
//!         └── keyframes (list)
//! ```
//!
//! Optional scalar fields always materialize their key, holding the null
//! sentinel when absent. Concurrent partial writes then merge per key
//! without ever creating or losing a slot.

pub mod codec;

use loro::{Container, LoroDoc, LoroList, LoroMap, LoroMapValue, LoroValue, ValueOrContainer};

use crate::error::SyncError;

/// Container and field keys of the project subtree.
pub mod keys {
    pub const PROJECT: &str = "project";

    pub const ID: &str = "id";
    pub const NAME: &str = "name";

    pub const CONTEXTS: &str = "contexts";
    pub const RELATIONSHIPS: &str = "relationships";
    pub const GROUPS: &str = "groups";
    pub const REPOS: &str = "repos";
    pub const PEOPLE: &str = "people";
    pub const TEAMS: &str = "teams";
    pub const USERS: &str = "users";
    pub const USER_NEEDS: &str = "userNeeds";
    pub const USER_NEED_CONNECTIONS: &str = "userNeedConnections";
    pub const NEED_CONTEXT_CONNECTIONS: &str = "needContextConnections";

    pub const VIEW_CONFIG: &str = "viewConfig";
    pub const FLOW_STAGES: &str = "flowStages";
    pub const TEMPORAL: &str = "temporal";
    pub const KEYFRAMES: &str = "keyframes";

    /// Every key the project map may carry, used when clearing it.
    pub const ALL_PROJECT_KEYS: &[&str] = &[
        ID,
        NAME,
        CONTEXTS,
        RELATIONSHIPS,
        GROUPS,
        REPOS,
        PEOPLE,
        TEAMS,
        USERS,
        USER_NEEDS,
        USER_NEED_CONNECTIONS,
        NEED_CONTEXT_CONNECTIONS,
        VIEW_CONFIG,
        TEMPORAL,
    ];

    /// The collection keys, in display order.
    pub const COLLECTIONS: &[&str] = &[
        CONTEXTS,
        RELATIONSHIPS,
        GROUPS,
        REPOS,
        PEOPLE,
        TEAMS,
        USERS,
        USER_NEEDS,
        USER_NEED_CONNECTIONS,
        NEED_CONTEXT_CONNECTIONS,
    ];
}

/// The root map of the project subtree.
pub fn project_map(doc: &LoroDoc) -> LoroMap {
    doc.get_map(keys::PROJECT)
}

// ============================================================================
// Live container access
// ============================================================================

/// Child map container under `key`, if one is present.
pub(crate) fn child_map(map: &LoroMap, key: &str) -> Option<LoroMap> {
    match map.get(key) {
        Some(ValueOrContainer::Container(Container::Map(m))) => Some(m),
        _ => None,
    }
}

/// Child list container under `key`, if one is present.
pub(crate) fn child_list(map: &LoroMap, key: &str) -> Option<LoroList> {
    match map.get(key) {
        Some(ValueOrContainer::Container(Container::List(l))) => Some(l),
        _ => None,
    }
}

/// The map container at `index`, if the element is one.
pub(crate) fn item_map(list: &LoroList, index: usize) -> Option<LoroMap> {
    match list.get(index) {
        Some(ValueOrContainer::Container(Container::Map(m))) => Some(m),
        _ => None,
    }
}

/// String value under `key` of a live map.
pub(crate) fn live_str(map: &LoroMap, key: &str) -> Option<String> {
    match map.get(key) {
        Some(ValueOrContainer::Value(LoroValue::String(s))) => Some(s.to_string()),
        _ => None,
    }
}

/// Linear scan for the element whose `id` field equals `id`.
pub(crate) fn find_by_id(list: &LoroList, id: &str) -> Option<(usize, LoroMap)> {
    for index in 0..list.len() {
        if let Some(map) = item_map(list, index) {
            if live_str(&map, keys::ID).as_deref() == Some(id) {
                return Some((index, map));
            }
        }
    }
    None
}

/// Index of `value` in a list of plain strings.
pub(crate) fn string_index(list: &LoroList, value: &str) -> Option<usize> {
    for index in 0..list.len() {
        if let Some(ValueOrContainer::Value(LoroValue::String(s))) = list.get(index) {
            if s.as_ref() == value {
                return Some(index);
            }
        }
    }
    None
}

/// Remove every occurrence of `value` from a list of plain strings.
/// Concurrent adds from different replicas can merge into duplicates, so
/// one pass is not enough.
pub(crate) fn remove_string_all(list: &LoroList, value: &str) -> Result<bool, SyncError> {
    let mut removed = false;
    while let Some(index) = string_index(list, value) {
        list.delete(index, 1)?;
        removed = true;
    }
    Ok(removed)
}

/// Write an optional string field, materializing the null sentinel when
/// absent.
pub(crate) fn insert_opt_str(
    map: &LoroMap,
    key: &str,
    value: Option<&str>,
) -> Result<(), SyncError> {
    match value {
        Some(v) => map.insert(key, v)?,
        None => map.insert(key, LoroValue::Null)?,
    }
    Ok(())
}

/// Write an optional integer field, materializing the null sentinel when
/// absent.
pub(crate) fn insert_opt_i64(
    map: &LoroMap,
    key: &str,
    value: Option<i64>,
) -> Result<(), SyncError> {
    match value {
        Some(v) => map.insert(key, v)?,
        None => map.insert(key, LoroValue::Null)?,
    }
    Ok(())
}

/// Replace the contents of a string-list field with `values`.
pub(crate) fn write_string_list(
    map: &LoroMap,
    key: &str,
    values: &[String],
) -> Result<LoroList, SyncError> {
    let list = map.get_or_create_container(key, LoroList::new())?;
    let len = list.len();
    if len > 0 {
        list.delete(0, len)?;
    }
    for value in values {
        list.push(value.as_str())?;
    }
    Ok(list)
}

// ============================================================================
// Deep-value access (decode side)
// ============================================================================

pub(crate) fn as_str(value: &LoroValue) -> Option<String> {
    match value {
        LoroValue::String(s) => Some(s.to_string()),
        _ => None,
    }
}

pub(crate) fn as_f64(value: &LoroValue) -> Option<f64> {
    match value {
        LoroValue::Double(d) => Some(*d),
        LoroValue::I64(i) => Some(*i as f64),
        _ => None,
    }
}

pub(crate) fn as_i64(value: &LoroValue) -> Option<i64> {
    match value {
        LoroValue::I64(i) => Some(*i),
        _ => None,
    }
}

pub(crate) fn as_bool(value: &LoroValue) -> Option<bool> {
    match value {
        LoroValue::Bool(b) => Some(*b),
        _ => None,
    }
}

/// String field of a decoded map; the null sentinel reads as `None`.
pub(crate) fn str_field(map: &LoroMapValue, key: &str) -> Option<String> {
    map.get(key).and_then(as_str)
}

pub(crate) fn i64_field(map: &LoroMapValue, key: &str) -> Option<i64> {
    map.get(key).and_then(as_i64)
}

pub(crate) fn f64_field(map: &LoroMapValue, key: &str) -> Option<f64> {
    map.get(key).and_then(as_f64)
}

pub(crate) fn bool_field(map: &LoroMapValue, key: &str) -> Option<bool> {
    map.get(key).and_then(as_bool)
}

/// Decoded string-list field; missing or sentinel reads as empty.
pub(crate) fn string_list_field(map: &LoroMapValue, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(LoroValue::List(items)) => items.iter().filter_map(as_str).collect(),
        _ => Vec::new(),
    }
}

/// Decoded string-set field: like [`string_list_field`] but keeps only the
/// first occurrence of each id, upholding the deduplicated-membership
/// invariant after merges.
pub(crate) fn string_set_field(map: &LoroMapValue, key: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    string_list_field(map, key)
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
