//! Mutation operations
//!
//! One function per (entity type, verb). Each is a short, synchronous
//! function of (document, target ids, payload) and performs no commit of
//! its own: the facade wraps every call in exactly one transaction so the
//! observer and the undo history each see one logical step.
//!
//! Operations against an id that no longer exists are silent no-ops, never
//! errors: another replica may have deleted the entity concurrently, and the
//! merged outcome must not depend on which replica noticed first.

pub mod cascade;

use loro::{LoroDoc, LoroList, LoroMap};
use tracing::debug;

use crate::doc::{
    self, child_list, child_map, codec, find_by_id, insert_opt_i64, insert_opt_str, keys,
    remove_string_all, string_index, write_string_list,
};
use crate::error::SyncError;
use crate::model::{
    BoundedContext, ContextPatch, FlowStageMarker, FlowStagePatch, Group, GroupPatch,
    KeyframePatch, NeedContextConnection, NeedContextConnectionPatch, Person, PersonPatch, Point,
    PositionLayout, ProjectPatch, Relationship, RelationshipPatch, Repo, RepoPatch, Team,
    TeamPatch, TemporalKeyframe, User, UserNeed, UserNeedConnection, UserNeedConnectionPatch,
    UserNeedPatch, UserPatch,
};

fn ensure_collection(doc: &LoroDoc, key: &str) -> Result<LoroList, SyncError> {
    Ok(doc::project_map(doc).get_or_create_container(key, LoroList::new())?)
}

fn collection(doc: &LoroDoc, key: &str) -> Option<LoroList> {
    child_list(&doc::project_map(doc), key)
}

fn append_entity(
    list: &LoroList,
    write: impl FnOnce(&LoroMap) -> Result<(), SyncError>,
) -> Result<(), SyncError> {
    let map = list.insert_container(list.len(), LoroMap::new())?;
    write(&map)
}

/// Find an entity map by id, or record the silent no-op.
fn entity_for_update(doc: &LoroDoc, key: &str, id: &str) -> Option<LoroMap> {
    let list = collection(doc, key)?;
    match find_by_id(&list, id) {
        Some((_, map)) => Some(map),
        None => {
            debug!(collection = key, id, "target missing, skipping mutation");
            None
        }
    }
}

fn delete_entity(doc: &LoroDoc, key: &str, id: &str) -> Result<bool, SyncError> {
    let Some(list) = collection(doc, key) else {
        return Ok(false);
    };
    match find_by_id(&list, id) {
        Some((index, _)) => {
            list.delete(index, 1)?;
            Ok(true)
        }
        None => {
            debug!(collection = key, id, "target missing, skipping delete");
            Ok(false)
        }
    }
}

// ============================================================================
// Project
// ============================================================================

pub fn update_project(doc: &LoroDoc, patch: &ProjectPatch) -> Result<(), SyncError> {
    let root = doc::project_map(doc);
    if let Some(name) = &patch.name {
        root.insert(keys::NAME, name.as_str())?;
    }
    Ok(())
}

// ============================================================================
// Bounded contexts
// ============================================================================

pub fn add_context(doc: &LoroDoc, context: &BoundedContext) -> Result<(), SyncError> {
    let list = ensure_collection(doc, keys::CONTEXTS)?;
    append_entity(&list, |map| codec::write_context(map, context))
}

pub fn update_context(doc: &LoroDoc, id: &str, patch: &ContextPatch) -> Result<(), SyncError> {
    let Some(map) = entity_for_update(doc, keys::CONTEXTS, id) else {
        return Ok(());
    };
    if let Some(name) = &patch.name {
        map.insert(keys::NAME, name.as_str())?;
    }
    if let Some(description) = &patch.description {
        insert_opt_str(&map, "description", description.as_deref())?;
    }
    if let Some(team_id) = &patch.team_id {
        insert_opt_str(&map, "teamId", team_id.as_deref())?;
    }
    if let Some(code_size) = &patch.code_size {
        codec::write_opt_code_size(&map, code_size.as_ref())?;
    }
    Ok(())
}

/// Delete a context and enforce referential integrity across the document.
pub fn delete_context(doc: &LoroDoc, id: &str) -> Result<(), SyncError> {
    if delete_entity(doc, keys::CONTEXTS, id)? {
        cascade::on_context_deleted(doc, id)?;
    }
    Ok(())
}

/// Update one layout slot of a context's position group. `None` clears it.
pub fn update_context_position(
    doc: &LoroDoc,
    id: &str,
    layout: PositionLayout,
    point: Option<&Point>,
) -> Result<(), SyncError> {
    let Some(map) = entity_for_update(doc, keys::CONTEXTS, id) else {
        return Ok(());
    };
    let positions = map.get_or_create_container("positions", LoroMap::new())?;
    codec::write_opt_point(&positions, layout.key(), point)
}

// ============================================================================
// Relationships
// ============================================================================

pub fn add_relationship(doc: &LoroDoc, relationship: &Relationship) -> Result<(), SyncError> {
    let list = ensure_collection(doc, keys::RELATIONSHIPS)?;
    append_entity(&list, |map| codec::write_relationship(map, relationship))
}

pub fn update_relationship(
    doc: &LoroDoc,
    id: &str,
    patch: &RelationshipPatch,
) -> Result<(), SyncError> {
    let Some(map) = entity_for_update(doc, keys::RELATIONSHIPS, id) else {
        return Ok(());
    };
    if let Some(from) = &patch.from_context_id {
        map.insert("fromContextId", from.as_str())?;
    }
    if let Some(to) = &patch.to_context_id {
        map.insert("toContextId", to.as_str())?;
    }
    if let Some(kind) = &patch.kind {
        insert_opt_str(&map, "kind", kind.as_deref())?;
    }
    if let Some(upstream) = &patch.upstream_pattern {
        insert_opt_str(&map, "upstreamPattern", upstream.as_deref())?;
    }
    if let Some(downstream) = &patch.downstream_pattern {
        insert_opt_str(&map, "downstreamPattern", downstream.as_deref())?;
    }
    if let Some(label) = &patch.label {
        insert_opt_str(&map, "label", label.as_deref())?;
    }
    Ok(())
}

pub fn delete_relationship(doc: &LoroDoc, id: &str) -> Result<(), SyncError> {
    delete_entity(doc, keys::RELATIONSHIPS, id).map(|_| ())
}

// ============================================================================
// Groups
// ============================================================================

pub fn add_group(doc: &LoroDoc, group: &Group) -> Result<(), SyncError> {
    let list = ensure_collection(doc, keys::GROUPS)?;
    append_entity(&list, |map| codec::write_group(map, group))
}

pub fn update_group(doc: &LoroDoc, id: &str, patch: &GroupPatch) -> Result<(), SyncError> {
    let Some(map) = entity_for_update(doc, keys::GROUPS, id) else {
        return Ok(());
    };
    if let Some(name) = &patch.name {
        insert_opt_str(&map, keys::NAME, name.as_deref())?;
    }
    if let Some(color) = &patch.color {
        insert_opt_str(&map, "color", color.as_deref())?;
    }
    Ok(())
}

pub fn delete_group(doc: &LoroDoc, id: &str) -> Result<(), SyncError> {
    delete_entity(doc, keys::GROUPS, id).map(|_| ())
}

/// Add a context to a group's membership; a no-op when already present.
pub fn add_context_to_group(
    doc: &LoroDoc,
    group_id: &str,
    context_id: &str,
) -> Result<(), SyncError> {
    let Some(map) = entity_for_update(doc, keys::GROUPS, group_id) else {
        return Ok(());
    };
    let ids = map.get_or_create_container("contextIds", LoroList::new())?;
    if string_index(&ids, context_id).is_none() {
        ids.push(context_id)?;
    }
    Ok(())
}

pub fn remove_context_from_group(
    doc: &LoroDoc,
    group_id: &str,
    context_id: &str,
) -> Result<(), SyncError> {
    let Some(map) = entity_for_update(doc, keys::GROUPS, group_id) else {
        return Ok(());
    };
    if let Some(ids) = child_list(&map, "contextIds") {
        remove_string_all(&ids, context_id)?;
    }
    Ok(())
}

// ============================================================================
// Repos
// ============================================================================

pub fn add_repo(doc: &LoroDoc, repo: &Repo) -> Result<(), SyncError> {
    let list = ensure_collection(doc, keys::REPOS)?;
    append_entity(&list, |map| codec::write_repo(map, repo))
}

pub fn update_repo(doc: &LoroDoc, id: &str, patch: &RepoPatch) -> Result<(), SyncError> {
    let Some(map) = entity_for_update(doc, keys::REPOS, id) else {
        return Ok(());
    };
    if let Some(name) = &patch.name {
        map.insert(keys::NAME, name.as_str())?;
    }
    if let Some(url) = &patch.url {
        insert_opt_str(&map, "url", url.as_deref())?;
    }
    if let Some(context_id) = &patch.context_id {
        insert_opt_str(&map, "contextId", context_id.as_deref())?;
    }
    if let Some(team_ids) = &patch.team_ids {
        write_string_list(&map, "teamIds", team_ids)?;
    }
    if let Some(contributors) = &patch.contributors {
        write_string_list(&map, "contributors", contributors)?;
    }
    Ok(())
}

pub fn delete_repo(doc: &LoroDoc, id: &str) -> Result<(), SyncError> {
    delete_entity(doc, keys::REPOS, id).map(|_| ())
}

// ============================================================================
// People
// ============================================================================

pub fn add_person(doc: &LoroDoc, person: &Person) -> Result<(), SyncError> {
    let list = ensure_collection(doc, keys::PEOPLE)?;
    append_entity(&list, |map| codec::write_person(map, person))
}

pub fn update_person(doc: &LoroDoc, id: &str, patch: &PersonPatch) -> Result<(), SyncError> {
    let Some(map) = entity_for_update(doc, keys::PEOPLE, id) else {
        return Ok(());
    };
    if let Some(name) = &patch.name {
        map.insert(keys::NAME, name.as_str())?;
    }
    if let Some(email) = &patch.email {
        insert_opt_str(&map, "email", email.as_deref())?;
    }
    if let Some(team_ids) = &patch.team_ids {
        write_string_list(&map, "teamIds", team_ids)?;
    }
    Ok(())
}

/// Delete a person and remove them from every repo's contributor list.
pub fn delete_person(doc: &LoroDoc, id: &str) -> Result<(), SyncError> {
    if delete_entity(doc, keys::PEOPLE, id)? {
        cascade::on_person_deleted(doc, id)?;
    }
    Ok(())
}

// ============================================================================
// Teams
// ============================================================================

pub fn add_team(doc: &LoroDoc, team: &Team) -> Result<(), SyncError> {
    let list = ensure_collection(doc, keys::TEAMS)?;
    append_entity(&list, |map| codec::write_team(map, team))
}

pub fn update_team(doc: &LoroDoc, id: &str, patch: &TeamPatch) -> Result<(), SyncError> {
    let Some(map) = entity_for_update(doc, keys::TEAMS, id) else {
        return Ok(());
    };
    if let Some(name) = &patch.name {
        map.insert(keys::NAME, name.as_str())?;
    }
    if let Some(color) = &patch.color {
        insert_opt_str(&map, "color", color.as_deref())?;
    }
    Ok(())
}

/// Delete a team and clear the team reference on contexts that carried it.
pub fn delete_team(doc: &LoroDoc, id: &str) -> Result<(), SyncError> {
    if delete_entity(doc, keys::TEAMS, id)? {
        cascade::on_team_deleted(doc, id)?;
    }
    Ok(())
}

// ============================================================================
// Users and user needs
// ============================================================================

pub fn add_user(doc: &LoroDoc, user: &User) -> Result<(), SyncError> {
    let list = ensure_collection(doc, keys::USERS)?;
    append_entity(&list, |map| codec::write_user(map, user))
}

pub fn update_user(doc: &LoroDoc, id: &str, patch: &UserPatch) -> Result<(), SyncError> {
    let Some(map) = entity_for_update(doc, keys::USERS, id) else {
        return Ok(());
    };
    if let Some(name) = &patch.name {
        map.insert(keys::NAME, name.as_str())?;
    }
    if let Some(role) = &patch.role {
        insert_opt_str(&map, "role", role.as_deref())?;
    }
    Ok(())
}

pub fn delete_user(doc: &LoroDoc, id: &str) -> Result<(), SyncError> {
    delete_entity(doc, keys::USERS, id).map(|_| ())
}

pub fn add_user_need(doc: &LoroDoc, need: &UserNeed) -> Result<(), SyncError> {
    let list = ensure_collection(doc, keys::USER_NEEDS)?;
    append_entity(&list, |map| codec::write_user_need(map, need))
}

pub fn update_user_need(doc: &LoroDoc, id: &str, patch: &UserNeedPatch) -> Result<(), SyncError> {
    let Some(map) = entity_for_update(doc, keys::USER_NEEDS, id) else {
        return Ok(());
    };
    if let Some(description) = &patch.description {
        map.insert("description", description.as_str())?;
    }
    if let Some(priority) = &patch.priority {
        insert_opt_i64(&map, "priority", *priority)?;
    }
    Ok(())
}

pub fn delete_user_need(doc: &LoroDoc, id: &str) -> Result<(), SyncError> {
    delete_entity(doc, keys::USER_NEEDS, id).map(|_| ())
}

// ============================================================================
// Connections
// ============================================================================

pub fn add_user_need_connection(
    doc: &LoroDoc,
    connection: &UserNeedConnection,
) -> Result<(), SyncError> {
    let list = ensure_collection(doc, keys::USER_NEED_CONNECTIONS)?;
    append_entity(&list, |map| codec::write_user_need_connection(map, connection))
}

pub fn update_user_need_connection(
    doc: &LoroDoc,
    id: &str,
    patch: &UserNeedConnectionPatch,
) -> Result<(), SyncError> {
    let Some(map) = entity_for_update(doc, keys::USER_NEED_CONNECTIONS, id) else {
        return Ok(());
    };
    if let Some(user_id) = &patch.user_id {
        map.insert("userId", user_id.as_str())?;
    }
    if let Some(user_need_id) = &patch.user_need_id {
        map.insert("userNeedId", user_need_id.as_str())?;
    }
    if let Some(label) = &patch.label {
        insert_opt_str(&map, "label", label.as_deref())?;
    }
    Ok(())
}

pub fn delete_user_need_connection(doc: &LoroDoc, id: &str) -> Result<(), SyncError> {
    delete_entity(doc, keys::USER_NEED_CONNECTIONS, id).map(|_| ())
}

pub fn add_need_context_connection(
    doc: &LoroDoc,
    connection: &NeedContextConnection,
) -> Result<(), SyncError> {
    let list = ensure_collection(doc, keys::NEED_CONTEXT_CONNECTIONS)?;
    append_entity(&list, |map| {
        codec::write_need_context_connection(map, connection)
    })
}

pub fn update_need_context_connection(
    doc: &LoroDoc,
    id: &str,
    patch: &NeedContextConnectionPatch,
) -> Result<(), SyncError> {
    let Some(map) = entity_for_update(doc, keys::NEED_CONTEXT_CONNECTIONS, id) else {
        return Ok(());
    };
    if let Some(user_need_id) = &patch.user_need_id {
        map.insert("userNeedId", user_need_id.as_str())?;
    }
    if let Some(context_id) = &patch.context_id {
        map.insert("contextId", context_id.as_str())?;
    }
    if let Some(label) = &patch.label {
        insert_opt_str(&map, "label", label.as_deref())?;
    }
    Ok(())
}

pub fn delete_need_context_connection(doc: &LoroDoc, id: &str) -> Result<(), SyncError> {
    delete_entity(doc, keys::NEED_CONTEXT_CONNECTIONS, id).map(|_| ())
}

// ============================================================================
// View config
// ============================================================================

pub fn add_flow_stage(doc: &LoroDoc, stage: &FlowStageMarker) -> Result<(), SyncError> {
    let root = doc::project_map(doc);
    let view_config = root.get_or_create_container(keys::VIEW_CONFIG, LoroMap::new())?;
    let stages = view_config.get_or_create_container(keys::FLOW_STAGES, LoroList::new())?;
    append_entity(&stages, |map| codec::write_flow_stage(map, stage))
}

/// Update a flow stage by index; out-of-range indices are no-ops.
pub fn update_flow_stage(
    doc: &LoroDoc,
    index: usize,
    patch: &FlowStagePatch,
) -> Result<(), SyncError> {
    let Some(stages) = codec::flow_stages_list(doc) else {
        return Ok(());
    };
    if index >= stages.len() {
        debug!(index, len = stages.len(), "flow stage index out of range");
        return Ok(());
    }
    let Some(map) = doc::item_map(&stages, index) else {
        return Ok(());
    };
    if let Some(name) = &patch.name {
        map.insert(keys::NAME, name.as_str())?;
    }
    if let Some(x) = patch.x {
        map.insert("x", x)?;
    }
    Ok(())
}

pub fn remove_flow_stage(doc: &LoroDoc, index: usize) -> Result<(), SyncError> {
    let Some(stages) = codec::flow_stages_list(doc) else {
        return Ok(());
    };
    if index >= stages.len() {
        debug!(index, len = stages.len(), "flow stage index out of range");
        return Ok(());
    }
    stages.delete(index, 1)?;
    Ok(())
}

// ============================================================================
// Temporal
// ============================================================================

/// The temporal map, materialized on first use with the enabled flag off.
fn ensure_temporal(doc: &LoroDoc) -> Result<LoroMap, SyncError> {
    let root = doc::project_map(doc);
    if let Some(map) = child_map(&root, keys::TEMPORAL) {
        return Ok(map);
    }
    let map = root.get_or_create_container(keys::TEMPORAL, LoroMap::new())?;
    map.insert("enabled", false)?;
    map.get_or_create_container(keys::KEYFRAMES, LoroList::new())?;
    Ok(map)
}

fn keyframes_list(doc: &LoroDoc) -> Option<LoroList> {
    let root = doc::project_map(doc);
    let temporal = child_map(&root, keys::TEMPORAL)?;
    child_list(&temporal, keys::KEYFRAMES)
}

fn keyframe_for_update(doc: &LoroDoc, id: &str) -> Option<LoroMap> {
    let list = keyframes_list(doc)?;
    match find_by_id(&list, id) {
        Some((_, map)) => Some(map),
        None => {
            debug!(id, "keyframe missing, skipping mutation");
            None
        }
    }
}

pub fn set_temporal_enabled(doc: &LoroDoc, enabled: bool) -> Result<(), SyncError> {
    let temporal = ensure_temporal(doc)?;
    temporal.insert("enabled", enabled)?;
    Ok(())
}

pub fn add_keyframe(doc: &LoroDoc, keyframe: &TemporalKeyframe) -> Result<(), SyncError> {
    let temporal = ensure_temporal(doc)?;
    let list = temporal.get_or_create_container(keys::KEYFRAMES, LoroList::new())?;
    append_entity(&list, |map| codec::write_keyframe(map, keyframe))
}

pub fn update_keyframe(doc: &LoroDoc, id: &str, patch: &KeyframePatch) -> Result<(), SyncError> {
    let Some(map) = keyframe_for_update(doc, id) else {
        return Ok(());
    };
    if let Some(label) = &patch.label {
        insert_opt_str(&map, "label", label.as_deref())?;
    }
    Ok(())
}

pub fn delete_keyframe(doc: &LoroDoc, id: &str) -> Result<(), SyncError> {
    let Some(list) = keyframes_list(doc) else {
        return Ok(());
    };
    match find_by_id(&list, id) {
        Some((index, _)) => {
            list.delete(index, 1)?;
            Ok(())
        }
        None => {
            debug!(id, "keyframe missing, skipping delete");
            Ok(())
        }
    }
}

/// Set the position of a context at a keyframe.
pub fn set_keyframe_position(
    doc: &LoroDoc,
    keyframe_id: &str,
    context_id: &str,
    point: &Point,
) -> Result<(), SyncError> {
    let Some(map) = keyframe_for_update(doc, keyframe_id) else {
        return Ok(());
    };
    let positions = map.get_or_create_container("positions", LoroMap::new())?;
    let entry = positions.get_or_create_container(context_id, LoroMap::new())?;
    codec::write_point(&entry, point)
}

/// Remove a context's position entry from a keyframe.
///
/// Keyframe positions are keyed dynamically by context id; unlike declared
/// schema fields they are genuinely removable, so no sentinel is left.
pub fn clear_keyframe_position(
    doc: &LoroDoc,
    keyframe_id: &str,
    context_id: &str,
) -> Result<(), SyncError> {
    let Some(map) = keyframe_for_update(doc, keyframe_id) else {
        return Ok(());
    };
    if let Some(positions) = child_map(&map, "positions") {
        if positions.get(context_id).is_some() {
            positions.delete(context_id)?;
        }
    }
    Ok(())
}

/// Mark a context as present at a keyframe; a no-op when already marked.
pub fn add_active_context(
    doc: &LoroDoc,
    keyframe_id: &str,
    context_id: &str,
) -> Result<(), SyncError> {
    let Some(map) = keyframe_for_update(doc, keyframe_id) else {
        return Ok(());
    };
    let ids = map.get_or_create_container("activeContextIds", LoroList::new())?;
    if string_index(&ids, context_id).is_none() {
        ids.push(context_id)?;
    }
    Ok(())
}

pub fn remove_active_context(
    doc: &LoroDoc,
    keyframe_id: &str,
    context_id: &str,
) -> Result<(), SyncError> {
    let Some(map) = keyframe_for_update(doc, keyframe_id) else {
        return Ok(());
    };
    if let Some(ids) = child_list(&map, "activeContextIds") {
        remove_string_all(&ids, context_id)?;
    }
    Ok(())
}
