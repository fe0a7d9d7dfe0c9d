//! Undo/redo over the document's operation history
//!
//! Wraps the substrate's native undo manager. Only operations committed by
//! this process enter history, which is what collaborative undo needs: a
//! local undo never reverts another replica's work, and concurrent remote
//! edits are rebased around the inverted operations by the substrate.
//!
//! Capturing can be toggled off for derived writes that must not become
//! individually undoable; such transactions commit under an excluded origin
//! prefix and never enter the stacks.

use loro::{LoroDoc, UndoManager};

use crate::error::SyncError;

/// Commit origin for tracked mutation transactions.
pub(crate) const ORIGIN_TRACKED: &str = "atlas:op";
/// Commit origin prefix excluded from undo history.
pub(crate) const ORIGIN_UNTRACKED: &str = "atlas:nocapture";

/// Undo/redo manager scoped to one document's local operation history.
pub struct HistoryManager {
    doc: LoroDoc,
    inner: Option<UndoManager>,
    capturing: bool,
    max_steps: usize,
}

impl HistoryManager {
    /// Start tracking history from the document's current state. Earlier
    /// operations (initial population, imported remote history) are not
    /// undoable.
    pub fn new(doc: &LoroDoc, max_steps: usize) -> Self {
        let mut manager = Self {
            doc: doc.clone(),
            inner: None,
            capturing: true,
            max_steps,
        };
        manager.inner = Some(manager.build());
        manager
    }

    fn build(&self) -> UndoManager {
        let mut inner = UndoManager::new(&self.doc);
        inner.set_max_undo_steps(self.max_steps);
        // one commit = one history entry
        inner.set_merge_interval(0);
        inner.add_exclude_origin_prefix(ORIGIN_UNTRACKED);
        inner
    }

    pub fn can_undo(&self) -> bool {
        self.inner.as_ref().map(UndoManager::can_undo).unwrap_or(false)
    }

    pub fn can_redo(&self) -> bool {
        self.inner.as_ref().map(UndoManager::can_redo).unwrap_or(false)
    }

    /// Apply the inverse of the most recent tracked transaction. Returns
    /// whether anything was undone.
    pub fn undo(&mut self) -> Result<bool, SyncError> {
        match self.inner.as_mut() {
            Some(inner) => Ok(inner.undo()?),
            None => Ok(false),
        }
    }

    /// Re-apply the most recently undone transaction. Returns whether
    /// anything was redone.
    pub fn redo(&mut self) -> Result<bool, SyncError> {
        match self.inner.as_mut() {
            Some(inner) => Ok(inner.redo()?),
            None => Ok(false),
        }
    }

    /// Stop recording subsequent writes into history.
    pub fn stop_capturing(&mut self) {
        self.capturing = false;
    }

    pub fn resume_capturing(&mut self) {
        self.capturing = true;
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// The origin subsequent transactions should commit under.
    pub(crate) fn commit_origin(&self) -> &'static str {
        if self.capturing {
            ORIGIN_TRACKED
        } else {
            ORIGIN_UNTRACKED
        }
    }

    /// Empty both stacks without touching document content, by rebuilding
    /// the native manager in place.
    pub fn clear(&mut self) {
        if self.inner.is_some() {
            self.inner = Some(self.build());
        }
    }

    /// Release history tracking. Subsequent writes are untracked. Idempotent.
    pub fn destroy(&mut self) {
        self.inner = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{codec::decode_document, codec::populate_project, keys, project_map};
    use crate::model::Project;
    use loro::CommitOptions;

    fn tracked_rename(doc: &LoroDoc, name: &str) {
        project_map(doc).insert(keys::NAME, name).unwrap();
        doc.commit_with(CommitOptions::new().origin(ORIGIN_TRACKED));
    }

    fn history_doc() -> (LoroDoc, HistoryManager) {
        let doc = LoroDoc::new();
        populate_project(&doc.get_map(keys::PROJECT), &Project::new("p-1", "Shop")).unwrap();
        doc.commit();
        let history = HistoryManager::new(&doc, 100);
        (doc, history)
    }

    #[test]
    fn stacks_start_empty() {
        let (_doc, history) = history_doc();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_and_redo_walk_the_history() {
        let (doc, mut history) = history_doc();
        tracked_rename(&doc, "v1");
        tracked_rename(&doc, "v2");

        assert!(history.can_undo());
        assert!(history.undo().unwrap());
        assert_eq!(decode_document(&doc).unwrap().name, "v1");
        assert!(history.undo().unwrap());
        assert_eq!(decode_document(&doc).unwrap().name, "Shop");
        assert!(!history.can_undo());

        assert!(history.can_redo());
        assert!(history.redo().unwrap());
        assert!(history.redo().unwrap());
        assert_eq!(decode_document(&doc).unwrap().name, "v2");
        assert!(!history.can_redo());
    }

    #[test]
    fn new_tracked_write_clears_redo() {
        let (doc, mut history) = history_doc();
        tracked_rename(&doc, "v1");
        history.undo().unwrap();
        assert!(history.can_redo());

        tracked_rename(&doc, "fresh");
        assert!(!history.can_redo());
    }

    #[test]
    fn untracked_origin_is_excluded_from_history() {
        let (doc, mut history) = history_doc();
        history.stop_capturing();
        project_map(&doc).insert(keys::NAME, "derived").unwrap();
        doc.commit_with(CommitOptions::new().origin(history.commit_origin()));
        history.resume_capturing();

        assert!(!history.can_undo());
        // the derived write stays in place even though nothing is undoable
        assert_eq!(decode_document(&doc).unwrap().name, "derived");
        assert!(!history.undo().unwrap());
    }

    #[test]
    fn clear_empties_stacks_but_keeps_content() {
        let (doc, mut history) = history_doc();
        tracked_rename(&doc, "v1");
        history.undo().unwrap();
        tracked_rename(&doc, "v2");
        assert!(history.can_undo());

        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(decode_document(&doc).unwrap().name, "v2");
    }

    #[test]
    fn destroy_stops_tracking_and_is_idempotent() {
        let (doc, mut history) = history_doc();
        tracked_rename(&doc, "v1");
        history.destroy();
        history.destroy();

        assert!(!history.can_undo());
        assert!(!history.undo().unwrap());
        assert!(!history.redo().unwrap());

        tracked_rename(&doc, "v2");
        assert!(!history.can_undo());
        assert_eq!(decode_document(&doc).unwrap().name, "v2");
    }
}
