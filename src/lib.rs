//! # nexus-state
//!
//! A fine-grained reactive state engine built around atoms: small,
//! independently addressable units of state that track their own
//! dependents and dependencies so a write to one atom only recomputes
//! and notifies the parts of the graph that actually changed.
//!
//! ## Core concepts
//!
//! - **Atoms** ([`atom`]): primitive (a plain value), computed (derived,
//!   read-only), and writable (derived, with a custom write path).
//! - **Store** ([`store`]): the runtime container holding cached values,
//!   the dependency graph, subscribers, and attached plugins.
//! - **Registry** ([`registry`]): the process-wide atom directory behind
//!   `Atom::with_label`/debugging, with a global and an isolated mode.
//! - **Time-travel** ([`time_travel`]): an optional bounded undo/redo
//!   history layered on top of a store.
//! - **Debug bridge** ([`devtools`]): a Redux-DevTools-compatible plugin,
//!   swapped for a zero-overhead stub when the `devtools` feature is off.
//!
//! ## Example
//!
//! ```
//! use nexus_state::{create_store, primitive_atom, computed_atom};
//!
//! let store = create_store(Vec::new());
//! let count = primitive_atom(0);
//! let double = {
//!     let count = count.clone();
//!     computed_atom(move |get| Ok(get.get(&count)? * 2))
//! };
//!
//! assert_eq!(store.get(&count).unwrap(), 0);
//! store.set(&count, 5).unwrap();
//! assert_eq!(store.get(&double).unwrap(), 10);
//! ```

pub mod atom;
pub mod context;
pub mod enhanced;
pub mod error;
pub mod plugin;
pub mod registry;
pub mod store;
pub mod time_travel;
pub mod types;

pub mod devtools;

#[cfg(feature = "devtools")]
mod mapper;

pub use atom::{computed_atom, primitive_atom, writable_atom, Atom, AtomValue, ComputedAtom, PrimitiveAtom, WritableAtom};
pub use context::{Get, Set};
pub use enhanced::{create_enhanced_store, EnhancedStore, EnhancedStoreOptions};
pub use error::{NexusError, Result};
pub use plugin::{MutationEvent, Plugin};
pub use registry::{global as global_registry, AtomMetadata, AtomOwner, Registry, RegistryMode};
pub use store::{create_store, Store};
pub use time_travel::{Snapshot, TimeTravel};
pub use types::{AtomId, AtomVariant, EpochNumber, SetStateAction, StoreId, SubscriberId, Unsubscribe};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_import_and_store_construction() {
        let store = Store::new();
        let a = primitive_atom(1);
        assert_eq!(store.get(&a).unwrap(), 1);
    }
}
