//! Entity <-> document codec
//!
//! `write_*` populates a map container from an entity, materializing every
//! declared field: optional fields that are absent hold the null sentinel
//! rather than omitting the key. `extract_*` is the exact inverse, reading
//! from the decoded deep value of the document; a sentinel reads back as an
//! unset field, never as a null-like value.
//!
//! The codec assumes well-formed input. Structural validation of externally
//! supplied snapshots happens in [`crate::snapshot`] before data reaches
//! this layer.

use loro::{LoroList, LoroMap, LoroMapValue, LoroValue};

use super::{
    bool_field, child_list, f64_field, i64_field, insert_opt_i64, insert_opt_str, keys, str_field,
    string_list_field, string_set_field, write_string_list,
};
use crate::error::SyncError;
use crate::model::{
    BoundedContext, CodeSize, FlowStageMarker, Group, NeedContextConnection, Person, Point,
    PositionSet, Project, Relationship, Repo, Team, TemporalKeyframe, TemporalModel, User,
    UserNeed, UserNeedConnection, ViewConfig,
};

// ============================================================================
// Value objects
// ============================================================================

pub(crate) fn write_point(map: &LoroMap, point: &Point) -> Result<(), SyncError> {
    map.insert("x", point.x)?;
    map.insert("y", point.y)?;
    Ok(())
}

/// Write an optional nested point under `key`, null sentinel when absent.
pub(crate) fn write_opt_point(
    parent: &LoroMap,
    key: &str,
    point: Option<&Point>,
) -> Result<(), SyncError> {
    match point {
        Some(p) => {
            let map = parent.get_or_create_container(key, LoroMap::new())?;
            write_point(&map, p)?;
        }
        None => parent.insert(key, LoroValue::Null)?,
    }
    Ok(())
}

pub(crate) fn extract_point(value: &LoroValue) -> Option<Point> {
    let map = match value {
        LoroValue::Map(m) => m,
        _ => return None,
    };
    Some(Point {
        x: f64_field(map, "x")?,
        y: f64_field(map, "y")?,
    })
}

fn write_positions(map: &LoroMap, positions: &PositionSet) -> Result<(), SyncError> {
    let nested = map.get_or_create_container("positions", LoroMap::new())?;
    write_opt_point(&nested, "canvas", positions.canvas.as_ref())?;
    write_opt_point(&nested, "flow", positions.flow.as_ref())?;
    Ok(())
}

fn extract_positions(value: &LoroValue) -> Option<PositionSet> {
    let map = match value {
        LoroValue::Map(m) => m,
        _ => return None,
    };
    Some(PositionSet {
        canvas: map.get("canvas").and_then(extract_point),
        flow: map.get("flow").and_then(extract_point),
    })
}

pub(crate) fn write_opt_code_size(
    parent: &LoroMap,
    code_size: Option<&CodeSize>,
) -> Result<(), SyncError> {
    match code_size {
        Some(cs) => {
            let map = parent.get_or_create_container("codeSize", LoroMap::new())?;
            insert_opt_i64(&map, "linesOfCode", cs.lines_of_code)?;
            insert_opt_i64(&map, "moduleCount", cs.module_count)?;
        }
        None => parent.insert("codeSize", LoroValue::Null)?,
    }
    Ok(())
}

fn extract_code_size(value: &LoroValue) -> Option<CodeSize> {
    let map = match value {
        LoroValue::Map(m) => m,
        _ => return None,
    };
    Some(CodeSize {
        lines_of_code: i64_field(map, "linesOfCode"),
        module_count: i64_field(map, "moduleCount"),
    })
}

// ============================================================================
// Entities
// ============================================================================

pub(crate) fn write_context(map: &LoroMap, context: &BoundedContext) -> Result<(), SyncError> {
    map.insert(keys::ID, context.id.as_str())?;
    map.insert(keys::NAME, context.name.as_str())?;
    insert_opt_str(map, "description", context.description.as_deref())?;
    insert_opt_str(map, "teamId", context.team_id.as_deref())?;
    write_positions(map, &context.positions)?;
    write_opt_code_size(map, context.code_size.as_ref())?;
    Ok(())
}

fn extract_context(map: &LoroMapValue) -> Option<BoundedContext> {
    Some(BoundedContext {
        id: str_field(map, keys::ID)?,
        name: str_field(map, keys::NAME)?,
        description: str_field(map, "description"),
        team_id: str_field(map, "teamId"),
        positions: map
            .get("positions")
            .and_then(extract_positions)
            .unwrap_or_default(),
        code_size: map.get("codeSize").and_then(extract_code_size),
    })
}

pub(crate) fn write_relationship(
    map: &LoroMap,
    relationship: &Relationship,
) -> Result<(), SyncError> {
    map.insert(keys::ID, relationship.id.as_str())?;
    map.insert("fromContextId", relationship.from_context_id.as_str())?;
    map.insert("toContextId", relationship.to_context_id.as_str())?;
    insert_opt_str(map, "kind", relationship.kind.as_deref())?;
    insert_opt_str(map, "upstreamPattern", relationship.upstream_pattern.as_deref())?;
    insert_opt_str(
        map,
        "downstreamPattern",
        relationship.downstream_pattern.as_deref(),
    )?;
    insert_opt_str(map, "label", relationship.label.as_deref())?;
    Ok(())
}

fn extract_relationship(map: &LoroMapValue) -> Option<Relationship> {
    Some(Relationship {
        id: str_field(map, keys::ID)?,
        from_context_id: str_field(map, "fromContextId")?,
        to_context_id: str_field(map, "toContextId")?,
        kind: str_field(map, "kind"),
        upstream_pattern: str_field(map, "upstreamPattern"),
        downstream_pattern: str_field(map, "downstreamPattern"),
        label: str_field(map, "label"),
    })
}

pub(crate) fn write_group(map: &LoroMap, group: &Group) -> Result<(), SyncError> {
    map.insert(keys::ID, group.id.as_str())?;
    insert_opt_str(map, keys::NAME, group.name.as_deref())?;
    insert_opt_str(map, "color", group.color.as_deref())?;
    write_string_list(map, "contextIds", &group.context_ids)?;
    Ok(())
}

fn extract_group(map: &LoroMapValue) -> Option<Group> {
    Some(Group {
        id: str_field(map, keys::ID)?,
        name: str_field(map, keys::NAME),
        color: str_field(map, "color"),
        context_ids: string_set_field(map, "contextIds"),
    })
}

pub(crate) fn write_repo(map: &LoroMap, repo: &Repo) -> Result<(), SyncError> {
    map.insert(keys::ID, repo.id.as_str())?;
    map.insert(keys::NAME, repo.name.as_str())?;
    insert_opt_str(map, "url", repo.url.as_deref())?;
    insert_opt_str(map, "contextId", repo.context_id.as_deref())?;
    write_string_list(map, "teamIds", &repo.team_ids)?;
    write_string_list(map, "contributors", &repo.contributors)?;
    Ok(())
}

fn extract_repo(map: &LoroMapValue) -> Option<Repo> {
    Some(Repo {
        id: str_field(map, keys::ID)?,
        name: str_field(map, keys::NAME)?,
        url: str_field(map, "url"),
        context_id: str_field(map, "contextId"),
        team_ids: string_list_field(map, "teamIds"),
        contributors: string_list_field(map, "contributors"),
    })
}

pub(crate) fn write_person(map: &LoroMap, person: &Person) -> Result<(), SyncError> {
    map.insert(keys::ID, person.id.as_str())?;
    map.insert(keys::NAME, person.name.as_str())?;
    insert_opt_str(map, "email", person.email.as_deref())?;
    write_string_list(map, "teamIds", &person.team_ids)?;
    Ok(())
}

fn extract_person(map: &LoroMapValue) -> Option<Person> {
    Some(Person {
        id: str_field(map, keys::ID)?,
        name: str_field(map, keys::NAME)?,
        email: str_field(map, "email"),
        team_ids: string_list_field(map, "teamIds"),
    })
}

pub(crate) fn write_team(map: &LoroMap, team: &Team) -> Result<(), SyncError> {
    map.insert(keys::ID, team.id.as_str())?;
    map.insert(keys::NAME, team.name.as_str())?;
    insert_opt_str(map, "color", team.color.as_deref())?;
    Ok(())
}

fn extract_team(map: &LoroMapValue) -> Option<Team> {
    Some(Team {
        id: str_field(map, keys::ID)?,
        name: str_field(map, keys::NAME)?,
        color: str_field(map, "color"),
    })
}

pub(crate) fn write_user(map: &LoroMap, user: &User) -> Result<(), SyncError> {
    map.insert(keys::ID, user.id.as_str())?;
    map.insert(keys::NAME, user.name.as_str())?;
    insert_opt_str(map, "role", user.role.as_deref())?;
    Ok(())
}

fn extract_user(map: &LoroMapValue) -> Option<User> {
    Some(User {
        id: str_field(map, keys::ID)?,
        name: str_field(map, keys::NAME)?,
        role: str_field(map, "role"),
    })
}

pub(crate) fn write_user_need(map: &LoroMap, need: &UserNeed) -> Result<(), SyncError> {
    map.insert(keys::ID, need.id.as_str())?;
    map.insert("description", need.description.as_str())?;
    insert_opt_i64(map, "priority", need.priority)?;
    Ok(())
}

fn extract_user_need(map: &LoroMapValue) -> Option<UserNeed> {
    Some(UserNeed {
        id: str_field(map, keys::ID)?,
        description: str_field(map, "description")?,
        priority: i64_field(map, "priority"),
    })
}

pub(crate) fn write_user_need_connection(
    map: &LoroMap,
    connection: &UserNeedConnection,
) -> Result<(), SyncError> {
    map.insert(keys::ID, connection.id.as_str())?;
    map.insert("userId", connection.user_id.as_str())?;
    map.insert("userNeedId", connection.user_need_id.as_str())?;
    insert_opt_str(map, "label", connection.label.as_deref())?;
    Ok(())
}

fn extract_user_need_connection(map: &LoroMapValue) -> Option<UserNeedConnection> {
    Some(UserNeedConnection {
        id: str_field(map, keys::ID)?,
        user_id: str_field(map, "userId")?,
        user_need_id: str_field(map, "userNeedId")?,
        label: str_field(map, "label"),
    })
}

pub(crate) fn write_need_context_connection(
    map: &LoroMap,
    connection: &NeedContextConnection,
) -> Result<(), SyncError> {
    map.insert(keys::ID, connection.id.as_str())?;
    map.insert("userNeedId", connection.user_need_id.as_str())?;
    map.insert("contextId", connection.context_id.as_str())?;
    insert_opt_str(map, "label", connection.label.as_deref())?;
    Ok(())
}

fn extract_need_context_connection(map: &LoroMapValue) -> Option<NeedContextConnection> {
    Some(NeedContextConnection {
        id: str_field(map, keys::ID)?,
        user_need_id: str_field(map, "userNeedId")?,
        context_id: str_field(map, "contextId")?,
        label: str_field(map, "label"),
    })
}

pub(crate) fn write_flow_stage(map: &LoroMap, stage: &FlowStageMarker) -> Result<(), SyncError> {
    map.insert(keys::NAME, stage.name.as_str())?;
    map.insert("x", stage.x)?;
    Ok(())
}

fn extract_flow_stage(map: &LoroMapValue) -> Option<FlowStageMarker> {
    Some(FlowStageMarker {
        name: str_field(map, keys::NAME)?,
        x: f64_field(map, "x")?,
    })
}

pub(crate) fn write_keyframe(map: &LoroMap, keyframe: &TemporalKeyframe) -> Result<(), SyncError> {
    map.insert(keys::ID, keyframe.id.as_str())?;
    insert_opt_str(map, "label", keyframe.label.as_deref())?;
    let positions = map.get_or_create_container("positions", LoroMap::new())?;
    for (context_id, point) in &keyframe.positions {
        let entry = positions.get_or_create_container(context_id, LoroMap::new())?;
        write_point(&entry, point)?;
    }
    write_string_list(map, "activeContextIds", &keyframe.active_context_ids)?;
    Ok(())
}

fn extract_keyframe(map: &LoroMapValue) -> Option<TemporalKeyframe> {
    let positions = match map.get("positions") {
        Some(LoroValue::Map(entries)) => entries
            .iter()
            .filter_map(|(context_id, value)| {
                extract_point(value).map(|p| (context_id.to_string(), p))
            })
            .collect(),
        _ => Default::default(),
    };
    Some(TemporalKeyframe {
        id: str_field(map, keys::ID)?,
        label: str_field(map, "label"),
        positions,
        active_context_ids: string_set_field(map, "activeContextIds"),
    })
}

pub(crate) fn write_temporal(parent: &LoroMap, temporal: &TemporalModel) -> Result<(), SyncError> {
    let map = parent.get_or_create_container(keys::TEMPORAL, LoroMap::new())?;
    map.insert("enabled", temporal.enabled)?;
    let keyframes = map.get_or_create_container(keys::KEYFRAMES, LoroList::new())?;
    for keyframe in &temporal.keyframes {
        let entry = keyframes.insert_container(keyframes.len(), LoroMap::new())?;
        write_keyframe(&entry, keyframe)?;
    }
    Ok(())
}

fn extract_temporal(value: &LoroValue) -> Option<TemporalModel> {
    let map = match value {
        LoroValue::Map(m) => m,
        _ => return None,
    };
    Some(TemporalModel {
        enabled: bool_field(map, "enabled").unwrap_or(false),
        keyframes: extract_collection(map, keys::KEYFRAMES, extract_keyframe),
    })
}

// ============================================================================
// Project
// ============================================================================

fn write_collection<T>(
    root: &LoroMap,
    key: &str,
    items: &[T],
    write: impl Fn(&LoroMap, &T) -> Result<(), SyncError>,
) -> Result<(), SyncError> {
    let list = root.get_or_create_container(key, LoroList::new())?;
    for item in items {
        let map = list.insert_container(list.len(), LoroMap::new())?;
        write(&map, item)?;
    }
    Ok(())
}

fn extract_collection<T>(
    map: &LoroMapValue,
    key: &str,
    extract: impl Fn(&LoroMapValue) -> Option<T>,
) -> Vec<T> {
    match map.get(key) {
        Some(LoroValue::List(items)) => items
            .iter()
            .filter_map(|value| match value {
                LoroValue::Map(m) => extract(m),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Populate the project map from a domain snapshot. The map is expected to
/// be empty; [`crate::store::ProjectStore`] clears it first on reset.
pub fn populate_project(root: &LoroMap, project: &Project) -> Result<(), SyncError> {
    root.insert(keys::ID, project.id.as_str())?;
    root.insert(keys::NAME, project.name.as_str())?;

    write_collection(root, keys::CONTEXTS, &project.contexts, write_context)?;
    write_collection(
        root,
        keys::RELATIONSHIPS,
        &project.relationships,
        write_relationship,
    )?;
    write_collection(root, keys::GROUPS, &project.groups, write_group)?;
    write_collection(root, keys::REPOS, &project.repos, write_repo)?;
    write_collection(root, keys::PEOPLE, &project.people, write_person)?;
    write_collection(root, keys::TEAMS, &project.teams, write_team)?;
    write_collection(root, keys::USERS, &project.users, write_user)?;
    write_collection(root, keys::USER_NEEDS, &project.user_needs, write_user_need)?;
    write_collection(
        root,
        keys::USER_NEED_CONNECTIONS,
        &project.user_need_connections,
        write_user_need_connection,
    )?;
    write_collection(
        root,
        keys::NEED_CONTEXT_CONNECTIONS,
        &project.need_context_connections,
        write_need_context_connection,
    )?;

    let view_config = root.get_or_create_container(keys::VIEW_CONFIG, LoroMap::new())?;
    write_collection(
        &view_config,
        keys::FLOW_STAGES,
        &project.view_config.flow_stages,
        write_flow_stage,
    )?;

    match &project.temporal {
        Some(temporal) => write_temporal(root, temporal)?,
        None => root.insert(keys::TEMPORAL, LoroValue::Null)?,
    }

    Ok(())
}

/// Decode a domain snapshot from the deep value of the project map.
///
/// Returns `None` while the document has not reached a materializable state
/// (top-level id and name present); the observer drops such notifications.
pub fn extract_project(value: &LoroValue) -> Option<Project> {
    let map = match value {
        LoroValue::Map(m) => m,
        _ => return None,
    };
    let id = str_field(map, keys::ID)?;
    let name = str_field(map, keys::NAME)?;

    let view_config = match map.get(keys::VIEW_CONFIG) {
        Some(LoroValue::Map(vc)) => ViewConfig {
            flow_stages: extract_collection(vc, keys::FLOW_STAGES, extract_flow_stage),
        },
        _ => ViewConfig::default(),
    };

    Some(Project {
        id,
        name,
        contexts: extract_collection(map, keys::CONTEXTS, extract_context),
        relationships: extract_collection(map, keys::RELATIONSHIPS, extract_relationship),
        groups: extract_collection(map, keys::GROUPS, extract_group),
        repos: extract_collection(map, keys::REPOS, extract_repo),
        people: extract_collection(map, keys::PEOPLE, extract_person),
        teams: extract_collection(map, keys::TEAMS, extract_team),
        users: extract_collection(map, keys::USERS, extract_user),
        user_needs: extract_collection(map, keys::USER_NEEDS, extract_user_need),
        user_need_connections: extract_collection(
            map,
            keys::USER_NEED_CONNECTIONS,
            extract_user_need_connection,
        ),
        need_context_connections: extract_collection(
            map,
            keys::NEED_CONTEXT_CONNECTIONS,
            extract_need_context_connection,
        ),
        view_config,
        temporal: map.get(keys::TEMPORAL).and_then(extract_temporal),
    })
}

/// Decode the current project snapshot from a live document.
pub fn decode_document(doc: &loro::LoroDoc) -> Option<Project> {
    let value = super::project_map(doc).get_deep_value();
    extract_project(&value)
}

/// Whether a flow-stages list container exists yet under `viewConfig`.
pub(crate) fn flow_stages_list(doc: &loro::LoroDoc) -> Option<LoroList> {
    let root = super::project_map(doc);
    let view_config = super::child_map(&root, keys::VIEW_CONFIG)?;
    child_list(&view_config, keys::FLOW_STAGES)
}
