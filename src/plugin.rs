//! The plugin seam a [`crate::store::Store`] dispatches mutations through.
//!
//! A trait object list the store calls out to on every accepted write,
//! kept as its own seam rather than being specific to any one observer —
//! the time-travel controller and the devtools bridge are both ordinary
//! [`Plugin`]s attached this way.

use std::sync::Arc;

use crate::types::{now_millis, AtomId, StoreId};

/// One accepted write, handed to every attached plugin after the store
/// has already applied it (plugins observe, they don't get a veto).
#[derive(Debug, Clone)]
pub struct MutationEvent {
    pub atom_id: AtomId,
    pub atom_name: Option<String>,
    /// The kind of write that produced this event. Always `"SET"` today
    /// (the only mutation path the store dispatches through); broken out
    /// as its own field so naming strategies and other observers don't
    /// have to parse it back out of a label.
    pub operation: String,
    pub previous: serde_json::Value,
    pub next: serde_json::Value,
    /// Caller-supplied label from `Store::set_with_metadata`, or `None`
    /// for a plain `Store::set`.
    pub action_label: Option<String>,
    pub timestamp_millis: u64,
}

impl MutationEvent {
    pub(crate) fn set(atom_id: AtomId, atom_name: Option<String>, previous: serde_json::Value, next: serde_json::Value, action_label: Option<String>) -> Self {
        MutationEvent {
            atom_id,
            atom_name,
            operation: "SET".to_string(),
            previous,
            next,
            action_label,
            timestamp_millis: now_millis(),
        }
    }
}

/// An observer attached to a store via `Store::apply_plugin`.
///
/// Every hook has a default no-op body so a plugin only needs to
/// implement what it cares about. Panics inside a plugin callback are
/// caught at the call site and logged — one misbehaving plugin never
/// takes down a mutation for the rest of the store.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Called once, synchronously, when the plugin is attached.
    fn on_attach(&self, _store_id: StoreId) {}

    /// Called for every top-level, value-changing `set`/`set_with_metadata`
    /// call. Not called for the implicit recomputation of derived atoms.
    fn on_mutation(&self, _event: &MutationEvent) {}

    /// Called whenever an atom is read through the store. Default no-op;
    /// the stack tracer is the one plugin that overrides this.
    fn on_read(&self, _atom_id: AtomId) {}
}

pub(crate) fn dispatch_mutation(plugins: &[Arc<dyn Plugin>], event: &MutationEvent) {
    for plugin in plugins {
        let outcome =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| plugin.on_mutation(event)));
        if outcome.is_err() {
            log::error!(
                "plugin '{}' panicked handling mutation on atom {}",
                plugin.name(),
                event.atom_id
            );
        }
    }
}
