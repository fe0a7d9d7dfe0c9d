//! Change observation
//!
//! Subscribes to deep structural changes on the document and delivers one
//! decoded project snapshot per transaction: local commits and remote
//! imports both arrive through the same subscription, so downstream state
//! updates identically regardless of where an edit originated. Batching
//! comes from the substrate's transaction boundary, not from debouncing.
//!
//! Notifications that arrive while the document is not yet materializable
//! (top-level identity missing, e.g. mid-sync) are dropped; the next valid
//! notification repairs downstream state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use loro::{LoroDoc, Subscription};
use tracing::debug;

use crate::doc::codec;
use crate::model::Project;

/// Callback receiving the decoded snapshot after each transaction.
pub type ChangeCallback = Arc<dyn Fn(Project) + Send + Sync>;

struct ObserverState {
    doc: LoroDoc,
    callback: ChangeCallback,
    paused: AtomicBool,
    destroyed: AtomicBool,
}

impl ObserverState {
    fn notify(&self) {
        if self.destroyed.load(Ordering::SeqCst) || self.paused.load(Ordering::SeqCst) {
            return;
        }
        match codec::decode_document(&self.doc) {
            Some(project) => (self.callback)(project),
            None => debug!("change on unmaterialized document, dropping notification"),
        }
    }
}

/// Deep change observer bound to one document.
///
/// Attach only after the document's initial population has been committed;
/// the initial load then never fires the callback.
pub struct ChangeObserver {
    state: Arc<ObserverState>,
    subscription: Option<Subscription>,
}

impl ChangeObserver {
    pub fn attach(doc: &LoroDoc, callback: ChangeCallback) -> Self {
        let state = Arc::new(ObserverState {
            doc: doc.clone(),
            callback,
            paused: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
        });
        let hook = state.clone();
        let subscription = doc.subscribe_root(Arc::new(move |_diff| hook.notify()));
        Self {
            state,
            subscription: Some(subscription),
        }
    }

    /// Suppress callback delivery without unsubscribing.
    pub fn pause(&self) {
        self.state.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.state.paused.store(false, Ordering::SeqCst);
    }

    /// Permanently unsubscribe. Idempotent; no callback fires afterwards
    /// even if the document keeps mutating from other replicas.
    pub fn destroy(&mut self) {
        self.state.destroyed.store(true, Ordering::SeqCst);
        self.subscription.take();
    }
}

impl Drop for ChangeObserver {
    fn drop(&mut self) {
        self.destroy();
    }
}
