//! Process-wide atom registry: id → display name/metadata, plus store
//! attachment bookkeeping for the global/isolated ownership modes.
//!
//! `registry::global()` is the well-known shared instance every atom
//! factory registers into and every store resolves ops/names through,
//! regardless of which registry it was built with; `Registry::new()` is
//! for isolated/test instances, which only use their own `Registry` for
//! ownership bookkeeping (see `Store::atom_directory` in `store.rs`).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::atom::AtomOps;
use crate::error::{NexusError, Result};
use crate::store::Store;
use crate::types::{now_millis, AtomId, AtomVariant, StoreId};

/// How a store's atom usage is recorded by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryMode {
    /// Atoms the store touches stay in the shared region; any other
    /// global store can see and reach them the same way.
    Global,
    /// Atoms the store touches are recorded as owned by that store only.
    Isolated,
}

/// Who owns an atom from the registry's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomOwner {
    /// Owned by the shared global registry (no specific store).
    Global,
    Store(StoreId),
}

/// Display name, creation time, and variant tag for a registered atom.
#[derive(Debug, Clone)]
pub struct AtomMetadata {
    pub name: String,
    pub created_at_millis: u64,
    pub variant: AtomVariant,
}

struct Entry {
    ops: Arc<dyn AtomOps>,
    name: String,
    created_at_millis: u64,
}

struct StoreAttachment {
    mode: RegistryMode,
    store: Weak<Store>,
    owned: parking_lot::RwLock<std::collections::HashSet<AtomId>>,
}

/// The atom registry. See module docs for the global/isolated split.
pub struct Registry {
    entries: DashMap<AtomId, Entry>,
    owners: DashMap<AtomId, AtomOwner>,
    stores: DashMap<StoreId, StoreAttachment>,
    name_counter: AtomicU64,
}

static GLOBAL_REGISTRY: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::new()));

/// The well-known process-wide registry instance.
pub fn global() -> Arc<Registry> {
    GLOBAL_REGISTRY.clone()
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            entries: DashMap::new(),
            owners: DashMap::new(),
            stores: DashMap::new(),
            name_counter: AtomicU64::new(0),
        }
    }

    /// Register an atom, or update its name on re-registration. The
    /// creation timestamp is set once and preserved across renames.
    pub fn register(&self, ops: Arc<dyn AtomOps>, name: Option<String>) {
        let id = ops.id();
        if let Some(mut entry) = self.entries.get_mut(&id) {
            if let Some(name) = name {
                entry.name = name;
            }
            entry.ops = ops;
            return;
        }
        let name = name.unwrap_or_else(|| {
            let n = self.name_counter.fetch_add(1, Ordering::Relaxed);
            format!("atom-{n}")
        });
        self.entries.insert(
            id,
            Entry { ops, name, created_at_millis: now_millis() },
        );
        self.owners.entry(id).or_insert(AtomOwner::Global);
    }

    pub(crate) fn get_ops(&self, id: AtomId) -> Option<Arc<dyn AtomOps>> {
        self.entries.get(&id).map(|e| e.ops.clone())
    }

    pub fn get_name(&self, id: AtomId) -> Option<String> {
        self.entries.get(&id).map(|e| e.name.clone())
    }

    /// Reverse lookup: the first atom id registered under `name`, if any.
    pub fn find_by_name(&self, name: &str) -> Option<AtomId> {
        self.entries.iter().find(|e| e.name == name).map(|e| *e.key())
    }

    pub fn get_metadata(&self, id: AtomId) -> Option<AtomMetadata> {
        self.entries.get(&id).map(|e| AtomMetadata {
            name: e.name.clone(),
            created_at_millis: e.created_at_millis,
            variant: e.ops.variant(),
        })
    }

    pub fn get_all(&self) -> Vec<AtomId> {
        self.entries.iter().map(|e| *e.key()).collect()
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Clear every registration. Intended for tests.
    pub fn clear(&self) {
        self.entries.clear();
        self.owners.clear();
        self.stores.clear();
        self.name_counter.store(0, Ordering::Relaxed);
    }

    /// Record that `store` is attached in `mode`. Called once by
    /// `Store::new`/`create_enhanced_store`.
    pub(crate) fn attach_store(&self, store_id: StoreId, store: &Arc<Store>, mode: RegistryMode) {
        self.stores.insert(
            store_id,
            StoreAttachment { mode, store: Arc::downgrade(store), owned: Default::default() },
        );
    }

    /// First-touch ownership claim: called by the store the first time
    /// it materialises an atom's state. A no-op for stores attached in
    /// global mode, and a no-op if some store already claimed the atom.
    pub(crate) fn record_usage(&self, atom_id: AtomId, store_id: StoreId) {
        let Some(attachment) = self.stores.get(&store_id) else { return };
        if attachment.mode != RegistryMode::Isolated {
            return;
        }
        if matches!(self.owners.get(&atom_id).map(|o| *o), Some(AtomOwner::Global) | None) {
            self.owners.insert(atom_id, AtomOwner::Store(store_id));
        }
        attachment.owned.write().insert(atom_id);
    }

    pub fn get_store_for_atom(&self, id: AtomId) -> AtomOwner {
        self.owners.get(&id).map(|o| *o).unwrap_or(AtomOwner::Global)
    }

    pub fn get_atoms_for_store(&self, store_id: StoreId) -> Vec<AtomId> {
        self.stores
            .get(&store_id)
            .map(|a| a.owned.read().iter().copied().collect())
            .unwrap_or_default()
    }

    /// Resolve an atom's current value through its owning store and
    /// serialise it, for debugging/devtools use. `UnknownAtom` if the id
    /// was never registered, or if its owning store has been dropped.
    pub fn get_atom_value(&self, id: AtomId) -> Result<serde_json::Value> {
        let entry = self
            .entries
            .get(&id)
            .ok_or(NexusError::UnknownAtom { atom_id: id })?;
        let owner = self.get_store_for_atom(id);
        let store = match owner {
            AtomOwner::Store(store_id) => self
                .stores
                .get(&store_id)
                .and_then(|a| a.store.upgrade())
                .ok_or(NexusError::UnknownAtom { atom_id: id })?,
            AtomOwner::Global => self
                .stores
                .iter()
                .find_map(|a| (a.mode == RegistryMode::Global).then(|| a.store.upgrade()).flatten())
                .ok_or(NexusError::UnknownAtom { atom_id: id })?,
        };
        store.get_erased_json(&entry.ops)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::primitive_atom;

    #[test]
    fn test_register_is_idempotent_and_keeps_timestamp() {
        let registry = Registry::new();
        let a = primitive_atom(1);
        registry.register(crate::atom::atom_ops(&a), Some("first".into()));
        let created_first = registry.get_metadata(a.id()).unwrap().created_at_millis;

        registry.register(crate::atom::atom_ops(&a), Some("renamed".into()));
        let meta = registry.get_metadata(a.id()).unwrap();
        assert_eq!(meta.name, "renamed");
        assert_eq!(meta.created_at_millis, created_first);
    }

    #[test]
    fn test_fallback_name_is_atom_n() {
        let registry = Registry::new();
        let a = primitive_atom(1);
        registry.register(crate::atom::atom_ops(&a), None);
        assert!(registry.get_name(a.id()).unwrap().starts_with("atom-"));
    }

    #[test]
    fn test_clear_resets_registry() {
        let registry = Registry::new();
        let a = primitive_atom(1);
        registry.register(crate::atom::atom_ops(&a), None);
        assert_eq!(registry.size(), 1);
        registry.clear();
        assert_eq!(registry.size(), 0);
    }
}
