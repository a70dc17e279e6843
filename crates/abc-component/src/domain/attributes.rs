//! The transactional attribute environment.
//!
//! An [`AttributeStore`] is a string-keyed map with a tentative-mutation
//! overlay. Processes write into the overlay while deciding on a message or
//! composing a send; the Coordinator then either commits the overlay into the
//! committed map or rolls it back. Readers always see the overlay first.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// A component's attribute environment with commit/rollback semantics.
///
/// The store has exactly one owner, the component's Coordinator task, which
/// is the only caller of [`commit`](Self::commit) and
/// [`rollback`](Self::rollback). Processes reach it through an
/// [`AttributeView`] loaned to them for the duration of a message offer or a
/// send authorisation.
#[derive(Debug, Default)]
pub struct AttributeStore {
    committed: HashMap<String, String>,
    /// Lazily allocated overlay of tentative writes.
    pending: Option<HashMap<String, String>>,
}

impl AttributeStore {
    /// An empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An environment initialised from `initial`, all committed.
    #[must_use]
    pub fn from_map(initial: HashMap<String, String>) -> Self {
        Self {
            committed: initial,
            pending: None,
        }
    }

    /// Read an attribute: the tentative overlay first, then the committed map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        if let Some(pending) = &self.pending {
            if let Some(value) = pending.get(key) {
                return Some(value);
            }
        }
        self.committed.get(key).map(String::as_str)
    }

    /// Read an attribute, defaulting to the empty string.
    #[must_use]
    pub fn value(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    /// Whether the attribute is present (tentatively or committed).
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Write an attribute into the tentative overlay.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pending
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
    }

    /// Merge the overlay into the committed map, emptying it.
    ///
    /// Returns whether any key was written.
    pub fn commit(&mut self) -> bool {
        match self.pending.take() {
            Some(changes) if !changes.is_empty() => {
                self.committed.extend(changes);
                true
            }
            _ => false,
        }
    }

    /// Discard the overlay.
    pub fn rollback(&mut self) {
        self.pending = None;
    }
}

/// A cloneable read/write handle over a shared [`AttributeStore`].
///
/// The view is what the component loans to processes: it exposes reads and
/// tentative writes only, never commit or rollback. Exclusive use is enforced
/// by protocol, since serial dispatch and the clearance-to-send handshake
/// ensure at most one process holds a live loan. A view is valid for the
/// duration of the offer or grant that carried it and must be dropped with
/// it.
#[derive(Debug, Clone)]
pub struct AttributeView {
    inner: Arc<RwLock<AttributeStore>>,
}

impl AttributeView {
    pub(crate) fn new(inner: Arc<RwLock<AttributeStore>>) -> Self {
        Self { inner }
    }

    /// Read an attribute, overlay first.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.read().get(key).map(str::to_string)
    }

    /// Read an attribute, defaulting to the empty string.
    #[must_use]
    pub fn value(&self, key: &str) -> String {
        self.inner.read().value(key)
    }

    /// Whether the attribute is present.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.inner.read().has(key)
    }

    /// Write an attribute tentatively; it becomes visible to later reads
    /// through this view and durable only once the surrounding offer or send
    /// is accepted.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.write().set(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(key: &str, value: &str) -> AttributeStore {
        let mut initial = HashMap::new();
        initial.insert(key.to_string(), value.to_string());
        AttributeStore::from_map(initial)
    }

    #[test]
    fn test_overlay_shadows_committed() {
        let mut store = store_with("x", "1");
        store.set("x", "2");
        assert_eq!(store.get("x"), Some("2"));
    }

    #[test]
    fn test_rollback_restores_committed_value() {
        let mut store = store_with("x", "1");
        store.set("x", "2");
        store.set("y", "3");
        store.rollback();
        assert_eq!(store.get("x"), Some("1"));
        assert!(!store.has("y"));
    }

    #[test]
    fn test_rollback_is_idempotent() {
        let mut store = store_with("x", "1");
        store.set("x", "2");
        store.rollback();
        store.rollback();
        assert_eq!(store.get("x"), Some("1"));
    }

    #[test]
    fn test_commit_retains_across_rollback() {
        let mut store = AttributeStore::new();
        store.set("k", "v");
        assert!(store.commit());
        store.rollback();
        assert_eq!(store.get("k"), Some("v"));
        assert!(store.has("k"));
    }

    #[test]
    fn test_commit_reports_whether_anything_changed() {
        let mut store = AttributeStore::new();
        assert!(!store.commit());
        store.set("k", "v");
        assert!(store.commit());
        assert!(!store.commit());
    }

    #[test]
    fn test_value_defaults_to_empty() {
        let store = AttributeStore::new();
        assert_eq!(store.value("missing"), "");
    }

    #[test]
    fn test_view_reads_and_writes_through() {
        let shared = Arc::new(RwLock::new(store_with("x", "1")));
        let view = AttributeView::new(shared.clone());

        assert_eq!(view.get("x"), Some("1".to_string()));
        view.set("x", "2");
        assert_eq!(view.value("x"), "2");

        assert!(shared.write().commit());
        assert_eq!(shared.read().get("x"), Some("2"));
    }
}
