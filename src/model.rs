//! Domain model for Atlas projects
//!
//! Plain entity records replicated through the shared document. Every
//! cross-entity link is an id string, never a structural pointer, so the
//! serialized form stays acyclic and trivially mergeable.
//!
//! Field names serialize in camelCase to match the external snapshot format
//! used for import/export and cross-replica comparison.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Generate a fresh entity id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ============================================================================
// Value objects
// ============================================================================

/// A 2D point on the map canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Per-layout positions of a bounded context.
///
/// Both slots are optional: a context that has never been placed in a layout
/// has no position there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionSet {
    pub canvas: Option<Point>,
    pub flow: Option<Point>,
}

/// Which layout a position update targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionLayout {
    Canvas,
    Flow,
}

impl PositionLayout {
    pub(crate) fn key(self) -> &'static str {
        match self {
            PositionLayout::Canvas => "canvas",
            PositionLayout::Flow => "flow",
        }
    }
}

/// Code-size metrics attached to a bounded context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSize {
    pub lines_of_code: Option<i64>,
    pub module_count: Option<i64>,
}

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundedContext {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub team_id: Option<String>,
    #[serde(default)]
    pub positions: PositionSet,
    pub code_size: Option<CodeSize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    pub from_context_id: String,
    pub to_context_id: String,
    pub kind: Option<String>,
    pub upstream_pattern: Option<String>,
    pub downstream_pattern: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: Option<String>,
    pub color: Option<String>,
    /// Ordered, deduplicated membership list.
    #[serde(default)]
    pub context_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repo {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    /// Back-reference to the owning bounded context, cleared (not removed)
    /// when that context is deleted.
    pub context_id: Option<String>,
    #[serde(default)]
    pub team_ids: Vec<String>,
    /// Person ids of contributors.
    #[serde(default)]
    pub contributors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    #[serde(default)]
    pub team_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNeed {
    pub id: String,
    pub description: String,
    pub priority: Option<i64>,
}

/// Links a [`User`] to a [`UserNeed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNeedConnection {
    pub id: String,
    pub user_id: String,
    pub user_need_id: String,
    pub label: Option<String>,
}

/// Links a [`UserNeed`] to a [`BoundedContext`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedContextConnection {
    pub id: String,
    pub user_need_id: String,
    pub context_id: String,
    pub label: Option<String>,
}

/// A flow-stage marker on the flow layout. Stages are positional: they are
/// addressed by index, not id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowStageMarker {
    pub name: String,
    pub x: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewConfig {
    #[serde(default)]
    pub flow_stages: Vec<FlowStageMarker>,
}

/// A named point in time with per-context positions and presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalKeyframe {
    pub id: String,
    pub label: Option<String>,
    /// Context id -> position at this keyframe.
    #[serde(default)]
    pub positions: BTreeMap<String, Point>,
    /// Context ids considered present at this keyframe.
    #[serde(default)]
    pub active_context_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalModel {
    pub enabled: bool,
    #[serde(default)]
    pub keyframes: Vec<TemporalKeyframe>,
}

/// The root aggregate: one collaboratively edited project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub contexts: Vec<BoundedContext>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub repos: Vec<Repo>,
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub user_needs: Vec<UserNeed>,
    #[serde(default)]
    pub user_need_connections: Vec<UserNeedConnection>,
    #[serde(default)]
    pub need_context_connections: Vec<NeedContextConnection>,
    #[serde(default)]
    pub view_config: ViewConfig,
    pub temporal: Option<TemporalModel>,
}

impl Project {
    /// An empty project with the given identity.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            contexts: Vec::new(),
            relationships: Vec::new(),
            groups: Vec::new(),
            repos: Vec::new(),
            people: Vec::new(),
            teams: Vec::new(),
            users: Vec::new(),
            user_needs: Vec::new(),
            user_need_connections: Vec::new(),
            need_context_connections: Vec::new(),
            view_config: ViewConfig::default(),
            temporal: None,
        }
    }
}

// ============================================================================
// Partial updates
// ============================================================================
//
// Update mutations carry typed patches. A required field uses `Option<T>`:
// `None` leaves it untouched. An optional field uses `Option<Option<T>>`:
// `None` leaves it untouched, `Some(None)` clears it explicitly,
// `Some(Some(v))` writes it.

#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ContextPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub team_id: Option<Option<String>>,
    pub code_size: Option<Option<CodeSize>>,
}

#[derive(Debug, Clone, Default)]
pub struct RelationshipPatch {
    pub from_context_id: Option<String>,
    pub to_context_id: Option<String>,
    pub kind: Option<Option<String>>,
    pub upstream_pattern: Option<Option<String>>,
    pub downstream_pattern: Option<Option<String>>,
    pub label: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct GroupPatch {
    pub name: Option<Option<String>>,
    pub color: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct RepoPatch {
    pub name: Option<String>,
    pub url: Option<Option<String>>,
    pub context_id: Option<Option<String>>,
    pub team_ids: Option<Vec<String>>,
    pub contributors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct PersonPatch {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub team_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct TeamPatch {
    pub name: Option<String>,
    pub color: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub role: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct UserNeedPatch {
    pub description: Option<String>,
    pub priority: Option<Option<i64>>,
}

#[derive(Debug, Clone, Default)]
pub struct UserNeedConnectionPatch {
    pub user_id: Option<String>,
    pub user_need_id: Option<String>,
    pub label: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct NeedContextConnectionPatch {
    pub user_need_id: Option<String>,
    pub context_id: Option<String>,
    pub label: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct FlowStagePatch {
    pub name: Option<String>,
    pub x: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct KeyframePatch {
    pub label: Option<Option<String>>,
}
