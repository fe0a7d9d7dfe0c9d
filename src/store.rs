//! Project store facade
//!
//! Binds one replicated document to the codec, the mutation operations, the
//! change observer, and the undo history behind a single object. One store
//! owns write coordination for one document; running two stores over the
//! same document is unsupported.
//!
//! Every mutation method runs inside exactly one document transaction, so
//! the observer fires once per call and the undo history gains at most one
//! entry per call. The underlying document is never destroyed here: it may
//! be owned by a network layer that outlives the store.

use std::sync::Arc;

use loro::{CommitOptions, ExportMode, LoroDoc, VersionVector};
use tracing::{debug, info};

use crate::doc::{self, codec, keys};
use crate::error::SyncError;
use crate::model::{
    BoundedContext, ContextPatch, FlowStageMarker, FlowStagePatch, Group, GroupPatch,
    KeyframePatch, NeedContextConnection, NeedContextConnectionPatch, Person, PersonPatch, Point,
    PositionLayout, Project, ProjectPatch, Relationship, RelationshipPatch, Repo, RepoPatch, Team,
    TeamPatch, TemporalKeyframe, User, UserNeed, UserNeedConnection, UserNeedConnectionPatch,
    UserNeedPatch, UserPatch,
};
use crate::observer::{ChangeCallback, ChangeObserver};
use crate::ops;
use crate::undo::{HistoryManager, ORIGIN_UNTRACKED};

/// Configuration for a project store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of transactions kept in the undo stack.
    pub max_undo_steps: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_undo_steps: 100,
        }
    }
}

/// Facade over one collaboratively edited project document.
pub struct ProjectStore {
    doc: LoroDoc,
    observer: Option<ChangeObserver>,
    history: HistoryManager,
    callback: ChangeCallback,
    config: StoreConfig,
    destroyed: bool,
}

impl ProjectStore {
    /// Encode `project` into a fresh document and start observing it.
    ///
    /// The document is expected to be empty; to bind to a document that
    /// already carries project state (e.g. received from a peer), use
    /// [`ProjectStore::attach`].
    pub fn new(
        doc: LoroDoc,
        project: &Project,
        on_change: impl Fn(Project) + Send + Sync + 'static,
        config: StoreConfig,
    ) -> Result<Self, SyncError> {
        let callback: ChangeCallback = Arc::new(on_change);
        codec::populate_project(&doc::project_map(&doc), project)?;
        // initial population commits before the observer and history exist,
        // so it neither notifies nor becomes undoable
        doc.commit_with(CommitOptions::new().origin(ORIGIN_UNTRACKED));
        let observer = ChangeObserver::attach(&doc, callback.clone());
        let history = HistoryManager::new(&doc, config.max_undo_steps);
        info!(project_id = %project.id, "project store initialized");
        Ok(Self {
            doc,
            observer: Some(observer),
            history,
            callback,
            config,
            destroyed: false,
        })
    }

    /// Bind to a document that already carries project state.
    pub fn attach(
        doc: LoroDoc,
        on_change: impl Fn(Project) + Send + Sync + 'static,
        config: StoreConfig,
    ) -> Self {
        let callback: ChangeCallback = Arc::new(on_change);
        let observer = ChangeObserver::attach(&doc, callback.clone());
        let history = HistoryManager::new(&doc, config.max_undo_steps);
        Self {
            doc,
            observer: Some(observer),
            history,
            callback,
            config,
            destroyed: false,
        }
    }

    /// The underlying document handle.
    pub fn doc(&self) -> &LoroDoc {
        &self.doc
    }

    /// Decode the current project snapshot, if the document is
    /// materializable.
    pub fn snapshot(&self) -> Option<Project> {
        codec::decode_document(&self.doc)
    }

    /// Atomically replace document contents with a freshly encoded snapshot
    /// and rebuild the observer and undo history from scratch. Equivalent to
    /// starting a new collaboration session: old history is discarded.
    pub fn reset(&mut self, project: &Project) -> Result<(), SyncError> {
        if let Some(mut observer) = self.observer.take() {
            observer.destroy();
        }
        self.history.destroy();

        let root = doc::project_map(&self.doc);
        for key in keys::ALL_PROJECT_KEYS {
            if root.get(key).is_some() {
                root.delete(key)?;
            }
        }
        codec::populate_project(&root, project)?;
        self.doc
            .commit_with(CommitOptions::new().origin(ORIGIN_UNTRACKED));

        self.observer = Some(ChangeObserver::attach(&self.doc, self.callback.clone()));
        self.history = HistoryManager::new(&self.doc, self.config.max_undo_steps);
        self.destroyed = false;
        info!(project_id = %project.id, "project store reset");
        Ok(())
    }

    /// Tear down the observer and undo history. Idempotent. The underlying
    /// document is left untouched.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        if let Some(mut observer) = self.observer.take() {
            observer.destroy();
        }
        self.history.destroy();
        self.destroyed = true;
        info!("project store destroyed");
    }

    fn apply(
        &mut self,
        op: impl FnOnce(&LoroDoc) -> Result<(), SyncError>,
    ) -> Result<(), SyncError> {
        if self.destroyed {
            debug!("mutation on destroyed store, skipping");
            return Ok(());
        }
        op(&self.doc)?;
        self.doc
            .commit_with(CommitOptions::new().origin(self.history.commit_origin()));
        Ok(())
    }

    // ========================================================================
    // Observer controls
    // ========================================================================

    /// Suppress change callbacks without unsubscribing.
    pub fn pause_notifications(&self) {
        if let Some(observer) = &self.observer {
            observer.pause();
        }
    }

    pub fn resume_notifications(&self) {
        if let Some(observer) = &self.observer {
            observer.resume();
        }
    }

    // ========================================================================
    // Undo/redo
    // ========================================================================

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Undo the most recent tracked mutation. Returns whether anything was
    /// undone.
    pub fn undo(&mut self) -> Result<bool, SyncError> {
        self.history.undo()
    }

    /// Re-apply the most recently undone mutation. Returns whether anything
    /// was redone.
    pub fn redo(&mut self) -> Result<bool, SyncError> {
        self.history.redo()
    }

    /// Exclude subsequent mutations from undo history until
    /// [`ProjectStore::resume_capturing`].
    pub fn stop_capturing(&mut self) {
        self.history.stop_capturing();
    }

    pub fn resume_capturing(&mut self) {
        self.history.resume_capturing();
    }

    /// Empty both undo stacks without touching document content.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // ========================================================================
    // Update-log exchange (transport is external; bytes are opaque)
    // ========================================================================

    /// Full snapshot bytes of the document.
    pub fn export_snapshot_bytes(&self) -> Result<Vec<u8>, SyncError> {
        Ok(self.doc.export(ExportMode::Snapshot)?)
    }

    /// All update bytes known to this replica.
    pub fn export_all_updates(&self) -> Result<Vec<u8>, SyncError> {
        Ok(self.doc.export(ExportMode::all_updates())?)
    }

    /// Update bytes not yet covered by `since`.
    pub fn export_updates_since(&self, since: &VersionVector) -> Result<Vec<u8>, SyncError> {
        Ok(self.doc.export(ExportMode::updates(since))?)
    }

    /// This replica's current version vector.
    pub fn version(&self) -> VersionVector {
        self.doc.oplog_vv()
    }

    /// Apply update bytes received from a peer. Triggers the observer like
    /// any local transaction.
    pub fn import_updates(&self, bytes: &[u8]) -> Result<(), SyncError> {
        self.doc.import(bytes)?;
        Ok(())
    }

    // ========================================================================
    // Mutations: bounded contexts
    // ========================================================================

    pub fn add_context(&mut self, context: &BoundedContext) -> Result<(), SyncError> {
        self.apply(|doc| ops::add_context(doc, context))
    }

    pub fn update_context(&mut self, id: &str, patch: &ContextPatch) -> Result<(), SyncError> {
        self.apply(|doc| ops::update_context(doc, id, patch))
    }

    pub fn delete_context(&mut self, id: &str) -> Result<(), SyncError> {
        self.apply(|doc| ops::delete_context(doc, id))
    }

    pub fn update_context_position(
        &mut self,
        id: &str,
        layout: PositionLayout,
        point: Option<&Point>,
    ) -> Result<(), SyncError> {
        self.apply(|doc| ops::update_context_position(doc, id, layout, point))
    }

    // ========================================================================
    // Mutations: relationships
    // ========================================================================

    pub fn add_relationship(&mut self, relationship: &Relationship) -> Result<(), SyncError> {
        self.apply(|doc| ops::add_relationship(doc, relationship))
    }

    pub fn update_relationship(
        &mut self,
        id: &str,
        patch: &RelationshipPatch,
    ) -> Result<(), SyncError> {
        self.apply(|doc| ops::update_relationship(doc, id, patch))
    }

    pub fn delete_relationship(&mut self, id: &str) -> Result<(), SyncError> {
        self.apply(|doc| ops::delete_relationship(doc, id))
    }

    // ========================================================================
    // Mutations: groups
    // ========================================================================

    pub fn add_group(&mut self, group: &Group) -> Result<(), SyncError> {
        self.apply(|doc| ops::add_group(doc, group))
    }

    pub fn update_group(&mut self, id: &str, patch: &GroupPatch) -> Result<(), SyncError> {
        self.apply(|doc| ops::update_group(doc, id, patch))
    }

    pub fn delete_group(&mut self, id: &str) -> Result<(), SyncError> {
        self.apply(|doc| ops::delete_group(doc, id))
    }

    pub fn add_context_to_group(
        &mut self,
        group_id: &str,
        context_id: &str,
    ) -> Result<(), SyncError> {
        self.apply(|doc| ops::add_context_to_group(doc, group_id, context_id))
    }

    pub fn remove_context_from_group(
        &mut self,
        group_id: &str,
        context_id: &str,
    ) -> Result<(), SyncError> {
        self.apply(|doc| ops::remove_context_from_group(doc, group_id, context_id))
    }

    // ========================================================================
    // Mutations: repos, people, teams
    // ========================================================================

    pub fn add_repo(&mut self, repo: &Repo) -> Result<(), SyncError> {
        self.apply(|doc| ops::add_repo(doc, repo))
    }

    pub fn update_repo(&mut self, id: &str, patch: &RepoPatch) -> Result<(), SyncError> {
        self.apply(|doc| ops::update_repo(doc, id, patch))
    }

    pub fn delete_repo(&mut self, id: &str) -> Result<(), SyncError> {
        self.apply(|doc| ops::delete_repo(doc, id))
    }

    pub fn add_person(&mut self, person: &Person) -> Result<(), SyncError> {
        self.apply(|doc| ops::add_person(doc, person))
    }

    pub fn update_person(&mut self, id: &str, patch: &PersonPatch) -> Result<(), SyncError> {
        self.apply(|doc| ops::update_person(doc, id, patch))
    }

    pub fn delete_person(&mut self, id: &str) -> Result<(), SyncError> {
        self.apply(|doc| ops::delete_person(doc, id))
    }

    pub fn add_team(&mut self, team: &Team) -> Result<(), SyncError> {
        self.apply(|doc| ops::add_team(doc, team))
    }

    pub fn update_team(&mut self, id: &str, patch: &TeamPatch) -> Result<(), SyncError> {
        self.apply(|doc| ops::update_team(doc, id, patch))
    }

    pub fn delete_team(&mut self, id: &str) -> Result<(), SyncError> {
        self.apply(|doc| ops::delete_team(doc, id))
    }

    // ========================================================================
    // Mutations: users, user needs, connections
    // ========================================================================

    pub fn add_user(&mut self, user: &User) -> Result<(), SyncError> {
        self.apply(|doc| ops::add_user(doc, user))
    }

    pub fn update_user(&mut self, id: &str, patch: &UserPatch) -> Result<(), SyncError> {
        self.apply(|doc| ops::update_user(doc, id, patch))
    }

    pub fn delete_user(&mut self, id: &str) -> Result<(), SyncError> {
        self.apply(|doc| ops::delete_user(doc, id))
    }

    pub fn add_user_need(&mut self, need: &UserNeed) -> Result<(), SyncError> {
        self.apply(|doc| ops::add_user_need(doc, need))
    }

    pub fn update_user_need(&mut self, id: &str, patch: &UserNeedPatch) -> Result<(), SyncError> {
        self.apply(|doc| ops::update_user_need(doc, id, patch))
    }

    pub fn delete_user_need(&mut self, id: &str) -> Result<(), SyncError> {
        self.apply(|doc| ops::delete_user_need(doc, id))
    }

    pub fn add_user_need_connection(
        &mut self,
        connection: &UserNeedConnection,
    ) -> Result<(), SyncError> {
        self.apply(|doc| ops::add_user_need_connection(doc, connection))
    }

    pub fn update_user_need_connection(
        &mut self,
        id: &str,
        patch: &UserNeedConnectionPatch,
    ) -> Result<(), SyncError> {
        self.apply(|doc| ops::update_user_need_connection(doc, id, patch))
    }

    pub fn delete_user_need_connection(&mut self, id: &str) -> Result<(), SyncError> {
        self.apply(|doc| ops::delete_user_need_connection(doc, id))
    }

    pub fn add_need_context_connection(
        &mut self,
        connection: &NeedContextConnection,
    ) -> Result<(), SyncError> {
        self.apply(|doc| ops::add_need_context_connection(doc, connection))
    }

    pub fn update_need_context_connection(
        &mut self,
        id: &str,
        patch: &NeedContextConnectionPatch,
    ) -> Result<(), SyncError> {
        self.apply(|doc| ops::update_need_context_connection(doc, id, patch))
    }

    pub fn delete_need_context_connection(&mut self, id: &str) -> Result<(), SyncError> {
        self.apply(|doc| ops::delete_need_context_connection(doc, id))
    }

    // ========================================================================
    // Mutations: project, view config, temporal
    // ========================================================================

    pub fn update_project(&mut self, patch: &ProjectPatch) -> Result<(), SyncError> {
        self.apply(|doc| ops::update_project(doc, patch))
    }

    pub fn add_flow_stage(&mut self, stage: &FlowStageMarker) -> Result<(), SyncError> {
        self.apply(|doc| ops::add_flow_stage(doc, stage))
    }

    pub fn update_flow_stage(
        &mut self,
        index: usize,
        patch: &FlowStagePatch,
    ) -> Result<(), SyncError> {
        self.apply(|doc| ops::update_flow_stage(doc, index, patch))
    }

    pub fn remove_flow_stage(&mut self, index: usize) -> Result<(), SyncError> {
        self.apply(|doc| ops::remove_flow_stage(doc, index))
    }

    pub fn set_temporal_enabled(&mut self, enabled: bool) -> Result<(), SyncError> {
        self.apply(|doc| ops::set_temporal_enabled(doc, enabled))
    }

    pub fn add_keyframe(&mut self, keyframe: &TemporalKeyframe) -> Result<(), SyncError> {
        self.apply(|doc| ops::add_keyframe(doc, keyframe))
    }

    pub fn update_keyframe(&mut self, id: &str, patch: &KeyframePatch) -> Result<(), SyncError> {
        self.apply(|doc| ops::update_keyframe(doc, id, patch))
    }

    pub fn delete_keyframe(&mut self, id: &str) -> Result<(), SyncError> {
        self.apply(|doc| ops::delete_keyframe(doc, id))
    }

    pub fn set_keyframe_position(
        &mut self,
        keyframe_id: &str,
        context_id: &str,
        point: &Point,
    ) -> Result<(), SyncError> {
        self.apply(|doc| ops::set_keyframe_position(doc, keyframe_id, context_id, point))
    }

    pub fn clear_keyframe_position(
        &mut self,
        keyframe_id: &str,
        context_id: &str,
    ) -> Result<(), SyncError> {
        self.apply(|doc| ops::clear_keyframe_position(doc, keyframe_id, context_id))
    }

    pub fn add_active_context(
        &mut self,
        keyframe_id: &str,
        context_id: &str,
    ) -> Result<(), SyncError> {
        self.apply(|doc| ops::add_active_context(doc, keyframe_id, context_id))
    }

    pub fn remove_active_context(
        &mut self,
        keyframe_id: &str,
        context_id: &str,
    ) -> Result<(), SyncError> {
        self.apply(|doc| ops::remove_active_context(doc, keyframe_id, context_id))
    }
}

impl Drop for ProjectStore {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_store(project: &Project) -> (ProjectStore, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let hits = count.clone();
        let store = ProjectStore::new(
            LoroDoc::new(),
            project,
            move |_snapshot| {
                hits.fetch_add(1, Ordering::SeqCst);
            },
            StoreConfig::default(),
        )
        .unwrap();
        (store, count)
    }

    fn connection(id: &str, user_id: &str, need_id: &str) -> UserNeedConnection {
        UserNeedConnection {
            id: id.to_string(),
            user_id: user_id.to_string(),
            user_need_id: need_id.to_string(),
            label: None,
        }
    }

    #[test]
    fn initial_population_does_not_notify() {
        let (_store, count) = counting_store(&Project::new("p-1", "Shop"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn each_mutation_notifies_exactly_once() {
        let (mut store, count) = counting_store(&Project::new("p-1", "Shop"));

        store
            .add_context(&BoundedContext {
                id: "ctx-1".to_string(),
                name: "Ordering".to_string(),
                description: None,
                team_id: None,
                positions: Default::default(),
                code_size: None,
            })
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // several field writes, one transaction, one notification
        store
            .update_context(
                "ctx-1",
                &ContextPatch {
                    name: Some("Order Management".to_string()),
                    description: Some(Some("order lifecycle".to_string())),
                    team_id: Some(Some("team-1".to_string())),
                    code_size: Some(Some(Default::default())),
                },
            )
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn noop_mutation_does_not_notify() {
        let (mut store, count) = counting_store(&Project::new("p-1", "Shop"));
        store
            .update_context(
                "ctx-ghost",
                &ContextPatch {
                    name: Some("nope".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    /// Adding a connection, undoing it, and redoing it walks the collection
    /// length 2 -> 3 -> 2 -> 3 with the new id surviving the redo.
    #[test]
    fn connection_add_undo_redo() {
        let mut project = Project::new("p-1", "Shop");
        project.user_need_connections = vec![
            connection("unc-1", "user-1", "need-1"),
            connection("unc-2", "user-2", "need-2"),
        ];
        let (mut store, _count) = counting_store(&project);

        store
            .add_user_need_connection(&connection("unc-new", "user-2", "need-1"))
            .unwrap();
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.user_need_connections.len(), 3);
        assert_eq!(snapshot.user_need_connections[2].id, "unc-new");

        assert!(store.undo().unwrap());
        assert_eq!(store.snapshot().unwrap().user_need_connections.len(), 2);

        assert!(store.redo().unwrap());
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.user_need_connections.len(), 3);
        assert!(snapshot
            .user_need_connections
            .iter()
            .any(|c| c.id == "unc-new"));
    }

    #[test]
    fn undo_k_times_returns_to_initial_snapshot() {
        let mut project = Project::new("p-1", "Shop");
        project.teams = vec![Team {
            id: "team-1".to_string(),
            name: "Checkout".to_string(),
            color: None,
        }];
        let (mut store, _count) = counting_store(&project);
        let initial = store.snapshot().unwrap();

        store
            .add_context(&BoundedContext {
                id: "ctx-1".to_string(),
                name: "Ordering".to_string(),
                description: None,
                team_id: Some("team-1".to_string()),
                positions: Default::default(),
                code_size: None,
            })
            .unwrap();
        store
            .update_context(
                "ctx-1",
                &ContextPatch {
                    name: Some("Order Management".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        store
            .add_group(&Group {
                id: "grp-1".to_string(),
                name: Some("Core".to_string()),
                color: None,
                context_ids: vec![],
            })
            .unwrap();
        store.add_context_to_group("grp-1", "ctx-1").unwrap();
        store.delete_team("team-1").unwrap();
        let fin = store.snapshot().unwrap();

        for _ in 0..5 {
            assert!(store.undo().unwrap());
        }
        assert!(!store.can_undo());
        assert_eq!(store.snapshot().unwrap(), initial);

        for _ in 0..5 {
            assert!(store.redo().unwrap());
        }
        assert!(!store.can_redo());
        assert_eq!(store.snapshot().unwrap(), fin);
    }

    #[test]
    fn writes_while_capturing_stopped_are_not_undoable() {
        let (mut store, _count) = counting_store(&Project::new("p-1", "Shop"));

        store.stop_capturing();
        store
            .update_context_position(
                "ctx-missing",
                PositionLayout::Canvas,
                Some(&Point { x: 0.0, y: 0.0 }),
            )
            .unwrap();
        store
            .add_user(&User {
                id: "user-1".to_string(),
                name: "Shopper".to_string(),
                role: None,
            })
            .unwrap();
        store.resume_capturing();

        assert!(!store.can_undo());
        assert_eq!(store.snapshot().unwrap().users.len(), 1);
    }

    #[test]
    fn reset_discards_history_and_rebuilds_observer() {
        let (mut store, count) = counting_store(&Project::new("p-1", "Shop"));
        store
            .add_user(&User {
                id: "user-1".to_string(),
                name: "Shopper".to_string(),
                role: None,
            })
            .unwrap();
        assert!(store.can_undo());
        let notified_before_reset = count.load(Ordering::SeqCst);

        store.reset(&Project::new("p-2", "Marketplace")).unwrap();

        // reset itself does not notify and discards history
        assert_eq!(count.load(Ordering::SeqCst), notified_before_reset);
        assert!(!store.can_undo());
        assert!(!store.can_redo());
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.id, "p-2");
        assert!(snapshot.users.is_empty());

        // the rebuilt observer sees subsequent mutations
        store
            .add_user(&User {
                id: "user-2".to_string(),
                name: "Seller".to_string(),
                role: None,
            })
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), notified_before_reset + 1);
    }

    #[test]
    fn destroy_is_idempotent_and_keeps_document() {
        let (mut store, count) = counting_store(&Project::new("p-1", "Shop"));
        store
            .add_user(&User {
                id: "user-1".to_string(),
                name: "Shopper".to_string(),
                role: None,
            })
            .unwrap();

        store.destroy();
        store.destroy();

        // mutations after destroy are skipped, the document keeps its state
        store
            .add_user(&User {
                id: "user-2".to_string(),
                name: "Seller".to_string(),
                role: None,
            })
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(store.snapshot().unwrap().users.len(), 1);
        assert!(!store.can_undo());
    }

    #[test]
    fn pause_and_resume_notifications() {
        let (mut store, count) = counting_store(&Project::new("p-1", "Shop"));

        store.pause_notifications();
        store
            .add_user(&User {
                id: "user-1".to_string(),
                name: "Shopper".to_string(),
                role: None,
            })
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);

        store.resume_notifications();
        store
            .add_user(&User {
                id: "user-2".to_string(),
                name: "Seller".to_string(),
                role: None,
            })
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn project_rename_is_undoable() {
        let (mut store, _count) = counting_store(&Project::new("p-1", "Shop"));
        store
            .update_project(&ProjectPatch {
                name: Some("Marketplace".to_string()),
            })
            .unwrap();
        assert_eq!(store.snapshot().unwrap().name, "Marketplace");

        assert!(store.undo().unwrap());
        assert_eq!(store.snapshot().unwrap().name, "Shop");
    }

    #[test]
    fn clear_history_empties_stacks() {
        let (mut store, _count) = counting_store(&Project::new("p-1", "Shop"));
        store
            .add_user(&User {
                id: "user-1".to_string(),
                name: "Shopper".to_string(),
                role: None,
            })
            .unwrap();
        assert!(store.can_undo());

        store.clear_history();
        assert!(!store.can_undo());
        assert!(!store.can_redo());
        assert_eq!(store.snapshot().unwrap().users.len(), 1);
    }
}
