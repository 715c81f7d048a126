//! Undo/redo history over a store's primitive and writable atoms.
//!
//! A capture walks every atom the store has materialized so far, rather
//! than requiring atoms to be registered for tracking up front: history
//! is a property of the store's observed state, not something a caller
//! has to opt individual atoms into.
//!
//! Restoring a [`Snapshot`] never force-sets a computed atom's cached
//! value directly — only primitive/writable entries are written back
//! through `Store::set_intercepted_arc`; every computed atom reachable
//! from them is invalidated instead and left to recompute lazily on its
//! next read, since a derived cache is never itself a source of truth to
//! restore.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::store::Store;
use crate::types::{AtomId, AtomVariant};

const DEFAULT_CAPACITY: usize = 50;

/// One recorded state transition: every primitive/writable atom's value
/// at the moment it was captured, plus an optional human label.
#[derive(Clone)]
pub struct Snapshot {
    pub label: Option<String>,
    values: Vec<(AtomId, Arc<dyn Any + Send + Sync>, serde_json::Value)>,
}

impl Snapshot {
    pub fn atom_ids(&self) -> impl Iterator<Item = AtomId> + '_ {
        self.values.iter().map(|(id, _, _)| *id)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(id, _, json)| (id.to_string(), json.clone()))
                .collect(),
        )
    }
}

struct HistoryBuffer {
    capacity: usize,
    entries: VecDeque<Snapshot>,
    /// Index into `entries` of the snapshot currently applied. `None`
    /// when the buffer is empty.
    cursor: Option<usize>,
}

impl HistoryBuffer {
    fn new(capacity: usize) -> Self {
        HistoryBuffer { capacity: capacity.max(1), entries: VecDeque::new(), cursor: None }
    }

    /// Push a new entry, discarding any redo branch beyond the current
    /// cursor first. Returns `true` if this push evicted the oldest
    /// entry, so callers mirroring snapshot indices externally (e.g. the
    /// debug bridge's action/snapshot mapper) know to shift theirs down.
    fn push(&mut self, snapshot: Snapshot) -> bool {
        if let Some(cursor) = self.cursor {
            self.entries.truncate(cursor + 1);
        }
        let evicted = self.entries.len() == self.capacity;
        if evicted {
            self.entries.pop_front();
            if let Some(cursor) = self.cursor.as_mut() {
                *cursor = cursor.saturating_sub(1);
            }
        }
        self.entries.push_back(snapshot);
        self.cursor = Some(self.entries.len() - 1);
        evicted
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}

/// Tracks a bounded history of atom states for a store and lets callers
/// move the store backward/forward through it.
pub struct TimeTravel {
    store: Arc<Store>,
    history: Mutex<HistoryBuffer>,
}

impl TimeTravel {
    pub fn new(store: Arc<Store>) -> Arc<TimeTravel> {
        Self::with_capacity(store, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(store: Arc<Store>, capacity: usize) -> Arc<TimeTravel> {
        Arc::new(TimeTravel { store, history: Mutex::new(HistoryBuffer::new(capacity)) })
    }

    /// Capture the current value of every primitive/writable atom the
    /// store has materialized so far as a new history entry, discarding
    /// any redo entries beyond the current cursor. Computed atoms are
    /// skipped — their value is always re-derived, never captured.
    ///
    /// Returns `true` if this capture evicted the oldest history entry
    /// (the buffer was already at capacity); callers that mirror history
    /// indices externally should shift theirs down by one when that
    /// happens.
    pub fn capture(&self, label: Option<String>) -> bool {
        let mut values = Vec::new();
        for id in self.store.materialized_ids() {
            if self.store.atom_variant(id) == Some(AtomVariant::Computed) {
                continue;
            }
            if let (Some(raw), Some(json)) = (self.store.peek_raw(id), self.store.get_intercepted(id)) {
                values.push((id, raw, json));
            }
        }
        values.sort_by_key(|(id, _, _)| *id);
        self.history.lock().push(Snapshot { label, values })
    }

    fn restore(&self, snapshot: &Snapshot) {
        for (id, value, _) in &snapshot.values {
            if let Err(e) = self.store.set_intercepted_arc(*id, value.clone()) {
                log::warn!("time-travel restore of atom {id} failed: {e}");
            }
        }
        self.invalidate_derived();
    }

    fn invalidate_derived(&self) {
        for id in self.store.materialized_ids() {
            if self.store.atom_variant(id) == Some(AtomVariant::Computed) {
                self.store.invalidate(id);
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.history.lock().cursor, Some(c) if c > 0)
    }

    pub fn can_redo(&self) -> bool {
        let history = self.history.lock();
        matches!(history.cursor, Some(c) if c + 1 < history.entries.len())
    }

    pub fn undo(&self) -> bool {
        let mut history = self.history.lock();
        let Some(cursor) = history.cursor else { return false };
        if cursor == 0 {
            return false;
        }
        let new_cursor = cursor - 1;
        history.cursor = Some(new_cursor);
        let snapshot = history.entries[new_cursor].clone();
        drop(history);
        self.restore(&snapshot);
        true
    }

    pub fn redo(&self) -> bool {
        let mut history = self.history.lock();
        let Some(cursor) = history.cursor else { return false };
        if cursor + 1 >= history.entries.len() {
            return false;
        }
        let new_cursor = cursor + 1;
        history.cursor = Some(new_cursor);
        let snapshot = history.entries[new_cursor].clone();
        drop(history);
        self.restore(&snapshot);
        true
    }

    /// Jump directly to the entry at `index` (0-based, oldest first).
    pub fn jump_to(&self, index: usize) -> bool {
        let mut history = self.history.lock();
        if index >= history.entries.len() {
            return false;
        }
        history.cursor = Some(index);
        let snapshot = history.entries[index].clone();
        drop(history);
        self.restore(&snapshot);
        true
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    /// Snapshots oldest-first, for display or export.
    pub fn get_history(&self) -> Vec<Snapshot> {
        self.history.lock().entries.iter().cloned().collect()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.history.lock().cursor
    }

    /// Restore a snapshot supplied from outside the buffer (e.g. the
    /// debug bridge's `IMPORT_STATE`), pushing it as a fresh entry.
    pub fn import_state(&self, snapshot: Snapshot) {
        self.restore(&snapshot);
        self.history.lock().push(snapshot);
    }
}
