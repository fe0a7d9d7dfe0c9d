//! Cascading referential integrity
//!
//! Invoked from within the same transaction as the primary delete, so every
//! replica that applies the delete re-runs the identical cleanup and the
//! merged outcome carries no dangling references. These scans are the
//! document's only enforced integrity mechanism; nothing validates links at
//! write time.

use loro::{LoroDoc, LoroList, LoroValue};
use tracing::debug;

use crate::doc::{self, child_list, child_map, item_map, keys, live_str, remove_string_all};
use crate::error::SyncError;

fn collection(doc: &LoroDoc, key: &str) -> Option<LoroList> {
    child_list(&doc::project_map(doc), key)
}

/// Delete list elements whose `field` equals `id`, scanning back to front so
/// indices stay valid.
fn delete_where_field_eq(list: &LoroList, field: &str, id: &str) -> Result<usize, SyncError> {
    let mut removed = 0;
    for index in (0..list.len()).rev() {
        if let Some(map) = item_map(list, index) {
            if live_str(&map, field).as_deref() == Some(id) {
                list.delete(index, 1)?;
                removed += 1;
            }
        }
    }
    Ok(removed)
}

/// Cleanup after a bounded context is deleted:
/// relationships touching it are removed, repo back-references are cleared
/// (not removed), group memberships and need connections are removed, and
/// every temporal keyframe drops its position entry and presence marker.
pub fn on_context_deleted(doc: &LoroDoc, context_id: &str) -> Result<(), SyncError> {
    let mut relationships_removed = 0;
    if let Some(relationships) = collection(doc, keys::RELATIONSHIPS) {
        for index in (0..relationships.len()).rev() {
            if let Some(map) = item_map(&relationships, index) {
                let touches = live_str(&map, "fromContextId").as_deref() == Some(context_id)
                    || live_str(&map, "toContextId").as_deref() == Some(context_id);
                if touches {
                    relationships.delete(index, 1)?;
                    relationships_removed += 1;
                }
            }
        }
    }

    if let Some(repos) = collection(doc, keys::REPOS) {
        for index in 0..repos.len() {
            if let Some(map) = item_map(&repos, index) {
                if live_str(&map, "contextId").as_deref() == Some(context_id) {
                    map.insert("contextId", LoroValue::Null)?;
                }
            }
        }
    }

    if let Some(groups) = collection(doc, keys::GROUPS) {
        for index in 0..groups.len() {
            if let Some(map) = item_map(&groups, index) {
                if let Some(ids) = child_list(&map, "contextIds") {
                    remove_string_all(&ids, context_id)?;
                }
            }
        }
    }

    let mut connections_removed = 0;
    if let Some(connections) = collection(doc, keys::NEED_CONTEXT_CONNECTIONS) {
        connections_removed = delete_where_field_eq(&connections, "contextId", context_id)?;
    }

    if let Some(temporal) = child_map(&doc::project_map(doc), keys::TEMPORAL) {
        if let Some(keyframes) = child_list(&temporal, keys::KEYFRAMES) {
            for index in 0..keyframes.len() {
                if let Some(map) = item_map(&keyframes, index) {
                    if let Some(positions) = child_map(&map, "positions") {
                        if positions.get(context_id).is_some() {
                            positions.delete(context_id)?;
                        }
                    }
                    if let Some(active) = child_list(&map, "activeContextIds") {
                        remove_string_all(&active, context_id)?;
                    }
                }
            }
        }
    }

    debug!(
        context_id,
        relationships_removed, connections_removed, "context delete cascade complete"
    );
    Ok(())
}

/// Cleanup after a team is deleted: contexts that referenced it keep
/// existing with the reference cleared.
pub fn on_team_deleted(doc: &LoroDoc, team_id: &str) -> Result<(), SyncError> {
    if let Some(contexts) = collection(doc, keys::CONTEXTS) {
        for index in 0..contexts.len() {
            if let Some(map) = item_map(&contexts, index) {
                if live_str(&map, "teamId").as_deref() == Some(team_id) {
                    map.insert("teamId", LoroValue::Null)?;
                }
            }
        }
    }
    debug!(team_id, "team delete cascade complete");
    Ok(())
}

/// Cleanup after a person is deleted: removed from every repo's contributor
/// list.
pub fn on_person_deleted(doc: &LoroDoc, person_id: &str) -> Result<(), SyncError> {
    if let Some(repos) = collection(doc, keys::REPOS) {
        for index in 0..repos.len() {
            if let Some(map) = item_map(&repos, index) {
                if let Some(contributors) = child_list(&map, "contributors") {
                    remove_string_all(&contributors, person_id)?;
                }
            }
        }
    }
    debug!(person_id, "person delete cascade complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::codec::{decode_document, populate_project};
    use crate::model::*;
    use crate::ops;
    use loro::LoroDoc;
    use std::collections::BTreeMap;

    fn doc_with(project: &Project) -> LoroDoc {
        let doc = LoroDoc::new();
        let root = doc::project_map(&doc);
        populate_project(&root, project).unwrap();
        doc.commit();
        doc
    }

    fn context(id: &str) -> BoundedContext {
        BoundedContext {
            id: id.to_string(),
            name: id.to_string(),
            description: None,
            team_id: None,
            positions: Default::default(),
            code_size: None,
        }
    }

    /// Deleting a context referenced by a relationship whose other end never
    /// existed removes both the context and the relationship.
    #[test]
    fn context_delete_removes_dangling_relationship() {
        let mut project = Project::new("p-1", "Shop");
        project.contexts = vec![context("ctx-1")];
        project.relationships = vec![Relationship {
            id: "rel-1".to_string(),
            from_context_id: "ctx-1".to_string(),
            to_context_id: "ctx-2".to_string(),
            kind: None,
            upstream_pattern: None,
            downstream_pattern: None,
            label: None,
        }];
        let doc = doc_with(&project);

        ops::delete_context(&doc, "ctx-1").unwrap();
        doc.commit();

        let decoded = decode_document(&doc).unwrap();
        assert!(decoded.contexts.is_empty());
        assert!(decoded.relationships.is_empty());
    }

    /// Full cascade: relationships removed, repo reference cleared (repo
    /// kept), group membership removed, need connections removed, keyframe
    /// positions and presence markers dropped.
    #[test]
    fn context_delete_cascade_is_complete() {
        let mut positions = BTreeMap::new();
        positions.insert("ctx-1".to_string(), Point { x: 1.0, y: 2.0 });
        positions.insert("ctx-2".to_string(), Point { x: 3.0, y: 4.0 });

        let mut project = Project::new("p-1", "Shop");
        project.contexts = vec![context("ctx-1"), context("ctx-2")];
        project.relationships = vec![
            Relationship {
                id: "rel-1".to_string(),
                from_context_id: "ctx-1".to_string(),
                to_context_id: "ctx-2".to_string(),
                kind: None,
                upstream_pattern: None,
                downstream_pattern: None,
                label: None,
            },
            Relationship {
                id: "rel-2".to_string(),
                from_context_id: "ctx-2".to_string(),
                to_context_id: "ctx-1".to_string(),
                kind: None,
                upstream_pattern: None,
                downstream_pattern: None,
                label: None,
            },
        ];
        project.groups = vec![
            Group {
                id: "grp-1".to_string(),
                name: None,
                color: None,
                context_ids: vec!["ctx-1".to_string(), "ctx-2".to_string()],
            },
            Group {
                id: "grp-2".to_string(),
                name: None,
                color: None,
                context_ids: vec!["ctx-1".to_string()],
            },
        ];
        project.repos = vec![Repo {
            id: "repo-1".to_string(),
            name: "svc".to_string(),
            url: None,
            context_id: Some("ctx-1".to_string()),
            team_ids: vec![],
            contributors: vec![],
        }];
        project.need_context_connections = vec![NeedContextConnection {
            id: "ncc-1".to_string(),
            user_need_id: "need-1".to_string(),
            context_id: "ctx-1".to_string(),
            label: None,
        }];
        project.temporal = Some(TemporalModel {
            enabled: true,
            keyframes: vec![TemporalKeyframe {
                id: "kf-1".to_string(),
                label: None,
                positions,
                active_context_ids: vec!["ctx-1".to_string(), "ctx-2".to_string()],
            }],
        });
        let doc = doc_with(&project);

        ops::delete_context(&doc, "ctx-1").unwrap();
        doc.commit();

        let decoded = decode_document(&doc).unwrap();
        assert_eq!(decoded.contexts.len(), 1);
        assert_eq!(decoded.contexts[0].id, "ctx-2");
        assert!(decoded.relationships.is_empty());
        assert_eq!(decoded.groups[0].context_ids, ["ctx-2"]);
        assert!(decoded.groups[1].context_ids.is_empty());
        // repo survives with the back-reference cleared, not removed
        assert_eq!(decoded.repos.len(), 1);
        assert_eq!(decoded.repos[0].context_id, None);
        assert!(decoded.need_context_connections.is_empty());
        let keyframe = &decoded.temporal.unwrap().keyframes[0];
        assert!(!keyframe.positions.contains_key("ctx-1"));
        assert!(keyframe.positions.contains_key("ctx-2"));
        assert_eq!(keyframe.active_context_ids, ["ctx-2"]);
    }

    #[test]
    fn team_delete_clears_context_reference_without_deleting_context() {
        let mut project = Project::new("p-1", "Shop");
        let mut ctx = context("ctx-1");
        ctx.team_id = Some("team-1".to_string());
        project.contexts = vec![ctx];
        project.teams = vec![Team {
            id: "team-1".to_string(),
            name: "Checkout".to_string(),
            color: None,
        }];
        let doc = doc_with(&project);

        ops::delete_team(&doc, "team-1").unwrap();
        doc.commit();

        let decoded = decode_document(&doc).unwrap();
        assert!(decoded.teams.is_empty());
        assert_eq!(decoded.contexts.len(), 1);
        assert_eq!(decoded.contexts[0].team_id, None);
    }

    #[test]
    fn person_delete_removes_contributor_entries() {
        let mut project = Project::new("p-1", "Shop");
        project.people = vec![Person {
            id: "person-1".to_string(),
            name: "Sam".to_string(),
            email: None,
            team_ids: vec![],
        }];
        project.repos = vec![
            Repo {
                id: "repo-1".to_string(),
                name: "svc-a".to_string(),
                url: None,
                context_id: None,
                team_ids: vec![],
                contributors: vec!["person-1".to_string(), "person-2".to_string()],
            },
            Repo {
                id: "repo-2".to_string(),
                name: "svc-b".to_string(),
                url: None,
                context_id: None,
                team_ids: vec![],
                contributors: vec!["person-1".to_string()],
            },
        ];
        let doc = doc_with(&project);

        ops::delete_person(&doc, "person-1").unwrap();
        doc.commit();

        let decoded = decode_document(&doc).unwrap();
        assert!(decoded.people.is_empty());
        assert_eq!(decoded.repos[0].contributors, ["person-2"]);
        assert!(decoded.repos[1].contributors.is_empty());
    }
}
