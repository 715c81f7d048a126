//! Evaluation contexts passed to `read`/`write` closures.
//!
//! `Get`/`Set` are plain structs borrowing the store rather than trait
//! objects, since a `get<T>` method generic over the atom's value type
//! can't be made object-safe. The store owns the evaluation stack
//! explicitly ([`crate::store::Store`] field `eval_stack`) rather than
//! reaching for a thread-local.

use crate::atom::{Atom, AtomValue};
use crate::error::Result;
use crate::store::Store;
use crate::types::{AtomId, SetStateAction};

/// Passed to a computed/writable atom's `read` closure. Every call to
/// [`Get::get`] records a dependency edge from the read atom to the atom
/// currently being evaluated.
pub struct Get<'s> {
    pub(crate) store: &'s Store,
    pub(crate) current: AtomId,
}

impl<'s> Get<'s> {
    pub(crate) fn new(store: &'s Store, current: AtomId) -> Self {
        Get { store, current }
    }

    /// Read another atom's value, recording a dependency edge.
    pub fn get<T: AtomValue>(&self, atom: &Atom<T>) -> Result<T> {
        self.store.get_as_dependency(atom, self.current)
    }
}

/// Passed to a writable atom's `write` closure, redirecting writes to
/// underlying primitives through the owning store.
pub struct Set<'s> {
    pub(crate) store: &'s Store,
}

impl<'s> Set<'s> {
    pub(crate) fn new(store: &'s Store) -> Self {
        Set { store }
    }

    pub fn set<T: AtomValue>(&self, atom: &Atom<T>, value: impl Into<SetStateAction<T>>) -> Result<()> {
        self.store.set(atom, value)
    }
}
