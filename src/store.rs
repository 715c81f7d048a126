//! The store: per-atom cached values, dependency edges, subscribers, and
//! the plugin list, plus the recomputation/notification engine that ties
//! them together.
//!
//! A `DashMap` of per-atom cells, lazily materialised on first `get`.
//! Only the cached *value* is type-erased (`Arc<dyn Any + Send + Sync>`)
//! behind the object-safe `AtomOps` vtable from `crate::atom`, so
//! `AtomCell` itself stays a plain, non-generic struct.

use std::any::Any;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use crate::atom::{self, Atom, AtomOps, AtomValue};
use crate::error::{NexusError, Result};
use crate::plugin::{self, MutationEvent, Plugin};
use crate::registry::{self, Registry, RegistryMode};
use crate::types::{AtomId, AtomVariant, EpochNumber, Listener, SetStateAction, StoreId, SubscriberId, Unsubscribe};

static STORE_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn next_store_id() -> StoreId {
    STORE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Per-atom bookkeeping: the cached value (type-erased), the dependency
/// edges discovered at the last recomputation, the reverse edges derived
/// from them, and any subscribers attached directly to this atom.
struct AtomCell {
    value: Option<Arc<dyn Any + Send + Sync>>,
    epoch: EpochNumber,
    dependencies: HashSet<AtomId>,
    dependents: HashSet<AtomId>,
    subscribers: Vec<(SubscriberId, Listener)>,
}

impl AtomCell {
    fn empty() -> Self {
        AtomCell {
            value: None,
            epoch: 0,
            dependencies: HashSet::new(),
            dependents: HashSet::new(),
            subscribers: Vec::new(),
        }
    }
}

/// The reactive engine: owns every atom's cached value reachable through
/// it, the dependency graph, and the plugin list mutations are dispatched
/// to. Always held behind an `Arc` — `subscribe` needs to clone it into
/// the returned disposer.
pub struct Store {
    id: StoreId,
    registry: Arc<Registry>,
    mode: RegistryMode,
    cells: DashMap<AtomId, RwLock<AtomCell>>,
    /// Atoms currently being evaluated, innermost last. A `recompute`
    /// that finds its own id already here is a cycle.
    eval_stack: Mutex<Vec<AtomId>>,
    /// Dependency sets being accumulated for atoms mid-evaluation, keyed
    /// by the evaluating atom's id. Populated just before `recompute` is
    /// called and drained by `take_recorded_dependencies`.
    recording: Mutex<HashMap<AtomId, HashSet<AtomId>>>,
    next_subscriber_id: AtomicU64,
    plugins: RwLock<Vec<Arc<dyn Plugin>>>,
}

impl Store {
    /// Build a store attached to the process-wide global registry.
    pub fn new() -> Arc<Store> {
        Store::with_registry(registry::global(), RegistryMode::Global)
    }

    /// Build a store attached to a specific registry: `Registry::new()`
    /// for isolated or test stores, or a shared registry for stores that
    /// should pool ownership bookkeeping without going through the
    /// process-wide default.
    pub fn with_registry(registry: Arc<Registry>, mode: RegistryMode) -> Arc<Store> {
        let store = Arc::new(Store {
            id: next_store_id(),
            registry: registry.clone(),
            mode,
            cells: DashMap::new(),
            eval_stack: Mutex::new(Vec::new()),
            recording: Mutex::new(HashMap::new()),
            next_subscriber_id: AtomicU64::new(0),
            plugins: RwLock::new(Vec::new()),
        });
        registry.attach_store(store.id, &store, mode);
        store
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    pub fn mode(&self) -> RegistryMode {
        self.mode
    }

    /// The atom directory consulted whenever the store needs to resolve
    /// an id's ops or display name: always the process-wide registry,
    /// never `self.registry`. Atom factories (`primitive_atom` and
    /// friends) always register into `registry::global()` because an
    /// atom is created independently of any store — at construction time
    /// there's no store yet to register into. A store built with its own
    /// `Registry::new()` (isolated mode) therefore has an `entries` table
    /// that never gets populated; consulting `self.registry` for ops/name
    /// lookups would silently fail for every atom. `self.registry` stays
    /// the right place for ownership bookkeeping only (`record_usage`,
    /// `attach_store`), which is genuinely per-store state.
    pub(crate) fn atom_directory(&self) -> Arc<Registry> {
        registry::global()
    }

    // ---- reads -----------------------------------------------------

    /// Read an atom's current value, materialising it (and, transitively,
    /// anything it depends on) if this is the first touch.
    pub fn get<T: AtomValue>(&self, atom: &Atom<T>) -> Result<T> {
        self.get_internal(atom, None)
    }

    /// Same as [`Store::get`], but records a dependency edge from `atom`
    /// to `dependent`. Called by [`crate::context::Get::get`] only.
    pub(crate) fn get_as_dependency<T: AtomValue>(&self, atom: &Atom<T>, dependent: AtomId) -> Result<T> {
        self.get_internal(atom, Some(dependent))
    }

    fn get_internal<T: AtomValue>(&self, atom: &Atom<T>, dependent: Option<AtomId>) -> Result<T> {
        let id = atom.id();
        if let Some(dependent) = dependent {
            self.record_dependency(dependent, id);
        }
        let needs_compute = match self.cells.get(&id) {
            Some(cell) => cell.read().value.is_none(),
            None => true,
        };
        if needs_compute {
            self.materialize(id, &atom::atom_ops(atom))?;
        }
        let cell = self.cells.get(&id).expect("materialized above");
        let guard = cell.read();
        let value_any = guard.value.as_ref().expect("materialized above");
        let value = value_any
            .downcast_ref::<T>()
            .cloned()
            .expect("atom value type mismatch (internal invariant violated)");
        drop(guard);
        drop(cell);
        self.dispatch_read(id);
        Ok(value)
    }

    fn record_dependency(&self, dependent: AtomId, dependency: AtomId) {
        if let Some(set) = self.recording.lock().get_mut(&dependent) {
            set.insert(dependency);
        }
    }

    fn ensure_cell(&self, id: AtomId) {
        self.cells.entry(id).or_insert_with(|| RwLock::new(AtomCell::empty()));
    }

    /// First materialisation (or forced recomputation) of `id`: pushes it
    /// on the eval stack for cycle detection, invokes the atom's
    /// `recompute`, then stores the result and updates dependency edges.
    fn materialize(&self, id: AtomId, ops: &Arc<dyn AtomOps>) -> Result<()> {
        {
            let mut stack = self.eval_stack.lock();
            if stack.contains(&id) {
                return Err(NexusError::CircularDependency { atom_id: id });
            }
            stack.push(id);
        }
        self.recording.lock().insert(id, HashSet::new());
        let outcome = ops.recompute(self);
        self.eval_stack.lock().pop();
        self.recording.lock().remove(&id);
        let recomputed = outcome?;

        self.ensure_cell(id);
        let old_deps = {
            let cell_ref = self.cells.get(&id).expect("just ensured");
            let mut cell = cell_ref.write();
            let old_deps = std::mem::replace(&mut cell.dependencies, recomputed.dependencies.clone());
            cell.value = Some(recomputed.value);
            cell.epoch += 1;
            old_deps
        };
        self.diff_dependency_edges(id, &old_deps, &recomputed.dependencies);
        self.registry.record_usage(id, self.id);
        Ok(())
    }

    pub(crate) fn take_recorded_dependencies(&self, id: AtomId) -> HashSet<AtomId> {
        self.recording.lock().remove(&id).unwrap_or_default()
    }

    fn diff_dependency_edges(&self, dependent: AtomId, old: &HashSet<AtomId>, new: &HashSet<AtomId>) {
        for dropped in old.difference(new) {
            if let Some(cell) = self.cells.get(dropped) {
                cell.write().dependents.remove(&dependent);
            }
        }
        for added in new.difference(old) {
            self.ensure_cell(*added);
            if let Some(cell) = self.cells.get(added) {
                cell.write().dependents.insert(dependent);
            }
        }
    }

    fn direct_dependents(&self, id: AtomId) -> HashSet<AtomId> {
        self.cells.get(&id).map(|c| c.read().dependents.clone()).unwrap_or_default()
    }

    fn direct_dependencies(&self, id: AtomId) -> HashSet<AtomId> {
        self.cells.get(&id).map(|c| c.read().dependencies.clone()).unwrap_or_default()
    }

    // ---- writes ------------------------------------------------------

    /// Write a new value (or apply an updater) to a primitive or writable
    /// atom. Errors for computed atoms.
    pub fn set<T: AtomValue>(&self, atom: &Atom<T>, value: impl Into<SetStateAction<T>>) -> Result<()> {
        self.set_with_metadata(atom, value, None)
    }

    /// Same as [`Store::set`], additionally labelling the resulting
    /// mutation event (surfaced by the debug bridge as the action name).
    pub fn set_with_metadata<T: AtomValue>(
        &self,
        atom: &Atom<T>,
        value: impl Into<SetStateAction<T>>,
        action_label: Option<String>,
    ) -> Result<()> {
        let action = value.into();
        match atom.variant() {
            AtomVariant::Computed => Err(NexusError::WriteToComputed { atom_id: atom.id() }),
            AtomVariant::Writable => self.set_writable(atom, action),
            AtomVariant::Primitive => self.set_primitive(atom, action, action_label),
        }
    }

    fn set_primitive<T: AtomValue>(
        &self,
        atom: &Atom<T>,
        action: SetStateAction<T>,
        action_label: Option<String>,
    ) -> Result<()> {
        let id = atom.id();
        let previous = self.get_internal(atom, None)?;
        let next = action.resolve(previous.clone());
        let changed = next != previous;

        self.ensure_cell(id);
        {
            let cell_ref = self.cells.get(&id).expect("just ensured");
            let mut cell = cell_ref.write();
            cell.value = Some(Arc::new(next.clone()) as Arc<dyn Any + Send + Sync>);
            cell.epoch += 1;
        }
        self.registry.record_usage(id, self.id);
        self.dispatch_mutation_typed(id, &previous, &next, action_label);

        if changed {
            self.notify_subscribers(id);
            self.propagate_from(id);
        }
        Ok(())
    }

    fn set_writable<T: AtomValue>(&self, atom: &Atom<T>, action: SetStateAction<T>) -> Result<()> {
        let value = match action {
            SetStateAction::Value(v) => v,
            SetStateAction::Updater(f) => {
                let previous = self.get_internal(atom, None)?;
                f(previous)
            }
        };
        let ops = atom::atom_ops(atom);
        ops.write_erased(self, Box::new(value))
    }

    fn dispatch_mutation_typed<T: AtomValue>(
        &self,
        id: AtomId,
        previous: &T,
        next: &T,
        action_label: Option<String>,
    ) {
        let plugins = self.plugins.read();
        if plugins.is_empty() {
            return;
        }
        let event = MutationEvent::set(
            id,
            self.atom_directory().get_name(id),
            serde_json::to_value(previous).unwrap_or(serde_json::Value::Null),
            serde_json::to_value(next).unwrap_or(serde_json::Value::Null),
            action_label,
        );
        plugin::dispatch_mutation(&plugins, &event);
    }

    fn dispatch_read(&self, id: AtomId) {
        let plugins = self.plugins.read();
        for p in plugins.iter() {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| p.on_read(id)));
            if outcome.is_err() {
                log::error!("plugin '{}' panicked handling a read of atom {id}", p.name());
            }
        }
    }

    /// Recompute every atom transitively dependent on `root` in
    /// topological order (dependencies before dependents), so a diamond
    /// (`d` depends on both `b` and `c`, which both depend on `a`) only
    /// recomputes `d` once, after both `b` and `c` are up to date. Each
    /// node's subscribers are only notified if its own recomputed value
    /// differs from its previous one — since recomputation is pure, an
    /// unchanged intermediate naturally yields unchanged descendants too,
    /// so this also reproduces the spec's "stop at the first unaffected
    /// dependent" behaviour without needing a separate short-circuit.
    fn propagate_from(&self, root: AtomId) {
        let mut candidates: HashSet<AtomId> = HashSet::new();
        let mut frontier: Vec<AtomId> = self.direct_dependents(root).into_iter().collect();
        while let Some(node) = frontier.pop() {
            if candidates.insert(node) {
                frontier.extend(self.direct_dependents(node));
            }
        }
        if candidates.is_empty() {
            return;
        }

        let universe: HashSet<AtomId> = candidates.iter().copied().chain(std::iter::once(root)).collect();
        let mut indegree: HashMap<AtomId, usize> = HashMap::new();
        for &c in &candidates {
            let count = self.direct_dependencies(c).iter().filter(|d| universe.contains(d)).count();
            indegree.insert(c, count);
        }

        let mut ready: Vec<AtomId> = candidates.iter().copied().filter(|c| indegree[c] == 0).collect();
        ready.sort_unstable();
        let mut queue: VecDeque<AtomId> = ready.into();
        let mut done: HashSet<AtomId> = HashSet::new();

        while let Some(node) = queue.pop_front() {
            if !done.insert(node) {
                continue;
            }
            self.recompute_dependent(node);
            let mut unblocked: Vec<AtomId> = Vec::new();
            for dependent in self.direct_dependents(node) {
                if let Some(deg) = indegree.get_mut(&dependent) {
                    *deg -= 1;
                    if *deg == 0 {
                        unblocked.push(dependent);
                    }
                }
            }
            unblocked.sort_unstable();
            queue.extend(unblocked);
        }
    }

    fn recompute_dependent(&self, id: AtomId) {
        let Some(ops) = self.atom_directory().get_ops(id) else { return };
        let old_value = self.cells.get(&id).and_then(|c| c.read().value.clone());
        match ops.recompute(self) {
            Ok(recomputed) => {
                let changed = match &old_value {
                    Some(old) => !ops.values_equal(old.as_ref(), recomputed.value.as_ref()),
                    None => true,
                };
                self.ensure_cell(id);
                let old_deps = {
                    let cell_ref = self.cells.get(&id).expect("just ensured");
                    let mut cell = cell_ref.write();
                    let old_deps = std::mem::replace(&mut cell.dependencies, recomputed.dependencies.clone());
                    cell.value = Some(recomputed.value);
                    cell.epoch += 1;
                    old_deps
                };
                self.diff_dependency_edges(id, &old_deps, &recomputed.dependencies);
                if changed {
                    self.notify_subscribers(id);
                }
            }
            Err(e) => {
                log::warn!("recomputation of atom {id} failed: {e}");
            }
        }
    }

    fn notify_subscribers(&self, id: AtomId) {
        let listeners: Vec<Listener> = match self.cells.get(&id) {
            Some(cell) => cell.read().subscribers.iter().map(|(_, l)| l.clone()).collect(),
            None => return,
        };
        for listener in listeners {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| listener()));
            if outcome.is_err() {
                log::error!("subscriber for atom {id} panicked");
            }
        }
    }

    // ---- subscriptions -------------------------------------------------

    /// Subscribe to an atom, materialising it first if it has never been
    /// read. The listener is invoked with no arguments; call `get` inside
    /// it to read the new value. Disposing more than once is a no-op.
    pub fn subscribe<T: AtomValue>(
        self: &Arc<Self>,
        atom: &Atom<T>,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> Unsubscribe {
        let id = atom.id();
        // A computed atom that fails on first read (e.g. a cycle) still
        // gets an inert subscription rather than a panic here; the error
        // already surfaced the first time something called `get` on it.
        let _ = self.get_internal(atom, None);
        let sub_id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        self.ensure_cell(id);
        {
            let cell_ref = self.cells.get(&id).expect("just ensured");
            cell_ref.write().subscribers.push((sub_id, Arc::new(listener)));
        }

        let store = Arc::clone(self);
        let mut disposed = false;
        Unsubscribe::new(move || {
            if disposed {
                return;
            }
            disposed = true;
            if let Some(cell) = store.cells.get(&id) {
                cell.write().subscribers.retain(|(sid, _)| *sid != sub_id);
            }
        })
    }

    // ---- snapshotting / interception -----------------------------------

    /// Read an atom's cached value without forcing materialisation.
    /// `None` if it has never been touched. Used by serialisation and
    /// devtools snapshotting, which must not have side effects.
    pub fn get_intercepted(&self, id: AtomId) -> Option<serde_json::Value> {
        let ops = self.atom_directory().get_ops(id)?;
        let cell = self.cells.get(&id)?;
        let value = cell.read().value.clone()?;
        Some(ops.to_json(value.as_ref()))
    }

    /// Force an atom's cached value directly from an already-erased
    /// `Arc`, bypassing its normal write path. Refused for `Computed`
    /// atoms. Used by time-travel restore, which only ever has back an
    /// `Arc` it captured earlier via `peek_raw` and no concrete `T` to
    /// build a `Box<dyn Any>` from; derived caches are never force-set
    /// this way, only invalidated (see `invalidate`) and left to
    /// recompute lazily against the restored primitives.
    pub(crate) fn set_intercepted_arc(&self, id: AtomId, value: Arc<dyn Any + Send + Sync>) -> Result<()> {
        let ops = self.atom_directory().get_ops(id).ok_or(NexusError::UnknownAtom { atom_id: id })?;
        if ops.variant() == AtomVariant::Computed {
            return Err(NexusError::WriteToComputed { atom_id: id });
        }
        self.ensure_cell(id);
        {
            let cell_ref = self.cells.get(&id).expect("just ensured");
            let mut cell = cell_ref.write();
            cell.value = Some(value);
            cell.epoch += 1;
        }
        self.notify_subscribers(id);
        self.propagate_from(id);
        Ok(())
    }

    /// Force an atom's cached value directly, bypassing its normal write
    /// path. Refused for `Computed` atoms. Used by devtools `IMPORT_STATE`
    /// (via `AtomOps::import_json`), which deserializes a concrete `T`
    /// before handing it here.
    pub fn set_intercepted(&self, id: AtomId, value: Box<dyn Any + Send + Sync>) -> Result<()> {
        self.set_intercepted_arc(id, Arc::from(value))
    }

    /// Drop an atom's cached value so the next `get` recomputes it from
    /// scratch. Used on computed/writable atoms after a time-travel jump.
    pub(crate) fn invalidate(&self, id: AtomId) {
        if let Some(cell) = self.cells.get(&id) {
            cell.write().value = None;
        }
    }

    /// Raw cached value, type-erased, with no JSON conversion and no
    /// materialisation. Used by the time-travel controller to capture
    /// an exact value it can later hand back to `set_intercepted`.
    pub(crate) fn peek_raw(&self, id: AtomId) -> Option<Arc<dyn Any + Send + Sync>> {
        self.cells.get(&id).and_then(|c| c.read().value.clone())
    }

    /// Every atom id this store has materialised at least once.
    pub(crate) fn materialized_ids(&self) -> Vec<AtomId> {
        self.cells.iter().map(|e| *e.key()).collect()
    }

    pub(crate) fn atom_variant(&self, id: AtomId) -> Option<AtomVariant> {
        self.atom_directory().get_ops(id).map(|ops| ops.variant())
    }

    pub(crate) fn get_erased_json(&self, ops: &Arc<dyn AtomOps>) -> Result<serde_json::Value> {
        let id = ops.id();
        let needs_compute = match self.cells.get(&id) {
            Some(cell) => cell.read().value.is_none(),
            None => true,
        };
        if needs_compute {
            self.materialize(id, ops)?;
        }
        let cell = self.cells.get(&id).ok_or(NexusError::UnknownAtom { atom_id: id })?;
        let value = cell.read().value.clone().ok_or(NexusError::UnknownAtom { atom_id: id })?;
        Ok(ops.to_json(value.as_ref()))
    }

    /// Every materialised atom as `{name: value}`. Atoms never read are
    /// omitted (nothing to dump); use `get`/`subscribe` first if a given
    /// atom must always appear.
    pub fn get_state(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        for entry in self.cells.iter() {
            let id = *entry.key();
            if let Some(json) = self.get_intercepted(id) {
                let name = self.atom_directory().get_name(id).unwrap_or_else(|| format!("atom-{id}"));
                map.insert(name, json);
            }
        }
        map
    }

    pub fn serialize_state(&self) -> serde_json::Value {
        serde_json::Value::Object(self.get_state())
    }

    // ---- plugins --------------------------------------------------------

    pub fn apply_plugin(&self, plugin: Arc<dyn Plugin>) {
        plugin.on_attach(self.id);
        self.plugins.write().push(plugin);
    }

    pub fn get_plugins(&self) -> Vec<Arc<dyn Plugin>> {
        self.plugins.read().clone()
    }
}

/// Build a plain store attached to the global registry, with `plugins`
/// already applied.
pub fn create_store(plugins: Vec<Arc<dyn Plugin>>) -> Arc<Store> {
    let store = Store::new();
    for plugin in plugins {
        store.apply_plugin(plugin);
    }
    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::{computed_atom, primitive_atom, writable_atom};
    use std::sync::atomic::AtomicUsize as Counter;

    #[test]
    fn test_get_materializes_primitive() {
        let store = Store::new();
        let a = primitive_atom(42);
        assert_eq!(store.get(&a).unwrap(), 42);
    }

    #[test]
    fn test_set_then_get_roundtrips() {
        let store = Store::new();
        let a = primitive_atom(1);
        store.set(&a, 7).unwrap();
        assert_eq!(store.get(&a).unwrap(), 7);
    }

    #[test]
    fn test_computed_atom_tracks_dependency() {
        let store = Store::new();
        let count = primitive_atom(2);
        let double = computed_atom(move |get| Ok(get.get(&count)? * 2));
        assert_eq!(store.get(&double).unwrap(), 4);
        store.set(&count, 10).unwrap();
        assert_eq!(store.get(&double).unwrap(), 20);
    }

    #[test]
    fn test_diamond_dependency_recomputes_sink_once() {
        let store = Store::new();
        let base = primitive_atom(1);
        let b = {
            let base = base.clone();
            computed_atom(move |get| Ok(get.get(&base)? + 1))
        };
        let c = {
            let base = base.clone();
            computed_atom(move |get| Ok(get.get(&base)? + 2))
        };
        let calls = Arc::new(Counter::new(0));
        let sum = {
            let (b, c, calls) = (b.clone(), c.clone(), calls.clone());
            computed_atom(move |get| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(get.get(&b)? + get.get(&c)?)
            })
        };
        assert_eq!(store.get(&sum).unwrap(), 1 + 1 + 1 + 2);
        calls.store(0, Ordering::SeqCst);
        store.set(&base, 10).unwrap();
        assert_eq!(store.get(&sum).unwrap(), 11 + 12);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_writable_atom_redirects_to_underlying() {
        let store = Store::new();
        let first = primitive_atom("Ada".to_string());
        let last = primitive_atom("Lovelace".to_string());
        let full_name = {
            let (first, last) = (first.clone(), last.clone());
            writable_atom(
                move |get| Ok(format!("{} {}", get.get(&first)?, get.get(&last)?)),
                move |get, set, value: String| {
                    if let Some((f, l)) = value.split_once(' ') {
                        set.set(&first, f.to_string())?;
                        set.set(&last, l.to_string())?;
                    }
                    let _ = get;
                    Ok(())
                },
            )
        };
        assert_eq!(store.get(&full_name).unwrap(), "Ada Lovelace");
        store.set(&full_name, "Grace Hopper".to_string()).unwrap();
        assert_eq!(store.get(&first).unwrap(), "Grace");
        assert_eq!(store.get(&last).unwrap(), "Hopper");
    }

    #[test]
    fn test_write_to_computed_errors() {
        let store = Store::new();
        let count = primitive_atom(1);
        let double = {
            let count = count.clone();
            computed_atom(move |get| Ok(get.get(&count)? * 2))
        };
        let err = store.set(&double, 99).unwrap_err();
        assert!(matches!(err, NexusError::WriteToComputed { .. }));
    }

    #[test]
    fn test_subscriber_fires_only_on_change() {
        let store = Store::new();
        let a = primitive_atom(1);
        let fired = Arc::new(Counter::new(0));
        let _unsub = store.subscribe(&a, {
            let fired = fired.clone();
            move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        });
        store.set(&a, 1).unwrap(); // unchanged
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        store.set(&a, 2).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let store = Store::new();
        let a = primitive_atom(1);
        let fired = Arc::new(Counter::new(0));
        let mut unsub = store.subscribe(&a, {
            let fired = fired.clone();
            move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        });
        unsub.call();
        store.set(&a, 2).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_serialize_state_includes_materialized_atoms() {
        let store = Store::new();
        let a = primitive_atom(5).with_label("a");
        store.get(&a).unwrap();
        let state = store.serialize_state();
        assert_eq!(state["a"], serde_json::json!(5));
    }

    #[test]
    fn test_isolated_registry_store_resolves_computed_cascade() {
        let store = Store::with_registry(Registry::new(), RegistryMode::Isolated);
        let base = primitive_atom(1);
        let double = {
            let base = base.clone();
            computed_atom(move |get| Ok(get.get(&base)? * 2))
        };
        assert_eq!(store.get(&double).unwrap(), 2);
        store.set(&base, 5).unwrap();
        // Exercises the cascade path (`propagate_from` -> `recompute_dependent`),
        // which used to resolve ops through this store's own (empty) isolated
        // registry rather than the global directory atoms actually register into.
        assert_eq!(store.get(&double).unwrap(), 10);
    }
}
