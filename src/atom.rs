//! Atom identity, variants, and the factory functions that create them.
//!
//! One `Atom<T>` carries an `AtomKind<T>` tag distinguishing primitive,
//! computed, and writable atoms, plus the object-safe [`AtomOps`] vtable
//! that lets [`crate::store::Store`] and [`crate::registry::Registry`]
//! hold atoms of different `T` in the same collections.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::context::{Get, Set};
use crate::error::{NexusError, Result};
use crate::registry;
use crate::store::Store;
use crate::types::{AtomId, AtomVariant};

static ATOM_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn next_atom_id() -> AtomId {
    ATOM_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Bound every atom value type must satisfy so the store can cache,
/// compare, and (for the debug bridge) serialize it without static
/// dispatch at the registry/store layer. `Serialize`/`DeserializeOwned`
/// are required because the value is erased behind `Arc<dyn Any + Send
/// + Sync>` past this point, and the devtools bridge needs a way back to
/// JSON and forth again without knowing `T`.
pub trait AtomValue:
    Clone + Send + Sync + Serialize + serde::de::DeserializeOwned + fmt::Debug + PartialEq + 'static
{
}
impl<T> AtomValue for T where
    T: Clone + Send + Sync + Serialize + serde::de::DeserializeOwned + fmt::Debug + PartialEq + 'static
{
}

pub type ReadFn<T> = Arc<dyn Fn(&Get) -> Result<T> + Send + Sync>;
pub type WriteFn<T> = Arc<dyn Fn(&Get, &Set, T) -> Result<()> + Send + Sync>;

enum AtomKind<T: AtomValue> {
    Primitive { initial: T },
    Computed { read: ReadFn<T> },
    Writable { read: ReadFn<T>, write: WriteFn<T> },
}

impl<T: AtomValue> Clone for AtomKind<T> {
    fn clone(&self) -> Self {
        match self {
            AtomKind::Primitive { initial } => AtomKind::Primitive { initial: initial.clone() },
            AtomKind::Computed { read } => AtomKind::Computed { read: read.clone() },
            AtomKind::Writable { read, write } => {
                AtomKind::Writable { read: read.clone(), write: write.clone() }
            }
        }
    }
}

/// An addressable unit of state. Identity is the id, not the value:
/// two atoms created from the same initial value are distinct atoms.
pub struct Atom<T: AtomValue> {
    id: AtomId,
    kind: AtomKind<T>,
    debug_label: Option<String>,
    _marker: PhantomData<T>,
}

impl<T: AtomValue> Clone for Atom<T> {
    fn clone(&self) -> Self {
        Atom {
            id: self.id,
            kind: self.kind.clone(),
            debug_label: self.debug_label.clone(),
            _marker: PhantomData,
        }
    }
}

/// Three named constructors rather than one overloaded one dispatching
/// on argument shape. The aliases below just give call sites a more
/// specific name than the shared `Atom<T>` they all return.
pub type PrimitiveAtom<T> = Atom<T>;
pub type ComputedAtom<T> = Atom<T>;
pub type WritableAtom<T> = Atom<T>;

impl<T: AtomValue> Atom<T> {
    pub fn id(&self) -> AtomId {
        self.id
    }

    pub fn variant(&self) -> AtomVariant {
        match self.kind {
            AtomKind::Primitive { .. } => AtomVariant::Primitive,
            AtomKind::Computed { .. } => AtomVariant::Computed,
            AtomKind::Writable { .. } => AtomVariant::Writable,
        }
    }

    pub fn debug_label(&self) -> Option<&str> {
        self.debug_label.as_deref()
    }

    /// Attach (or rename) a debug label. Mirrors the registry entry's
    /// name, so the registration is refreshed immediately; renaming on
    /// re-registration preserves the atom's original creation timestamp.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.debug_label = Some(label.clone());
        registry::global().register(self.as_ops(), Some(label));
        self
    }

    pub fn to_string(&self) -> String {
        match self.debug_label.as_ref() {
            Some(label) => format!("atom{}:{}", self.id, label),
            None => format!("atom{}", self.id),
        }
    }

    fn as_ops(&self) -> Arc<dyn AtomOps> {
        Arc::new(AtomHandle::<T> { id: self.id, kind: self.kind.clone() })
    }
}

impl<T: AtomValue> fmt::Debug for Atom<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atom")
            .field("id", &self.id)
            .field("variant", &self.variant())
            .field("debug_label", &self.debug_label)
            .finish()
    }
}

impl<T: AtomValue> fmt::Display for Atom<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string())
    }
}

/// Outcome of (re)computing a computed/writable atom: the new value plus
/// the dependency set discovered while producing it.
pub(crate) struct Recomputed {
    pub value: Arc<dyn Any + Send + Sync>,
    pub dependencies: std::collections::HashSet<AtomId>,
}

/// Object-safe vtable letting the store and registry operate on atoms of
/// different `T` uniformly. One implementor, [`AtomHandle<T>`], per atom.
pub(crate) trait AtomOps: Send + Sync {
    fn id(&self) -> AtomId;
    fn variant(&self) -> AtomVariant;

    /// Materialise/recompute this atom's value. For primitive atoms this
    /// just clones the initial value (used for first-touch
    /// materialisation only; subsequent writes bypass this). For
    /// computed/writable atoms this invokes the user `read` closure.
    fn recompute(&self, store: &Store) -> Result<Recomputed>;

    /// Write a new value through a writable atom's `write` closure.
    /// Errors for computed atoms; primitive atoms are written directly
    /// by the store and never go through this path.
    fn write_erased(&self, store: &Store, value: Box<dyn Any + Send + Sync>) -> Result<()>;

    fn to_json(&self, value: &(dyn Any + Send + Sync)) -> serde_json::Value;
    fn values_equal(&self, a: &(dyn Any + Send + Sync), b: &(dyn Any + Send + Sync)) -> bool;

    /// Deserialize `value` as this atom's type and force it into the
    /// store via `set_intercepted`. A no-op for computed atoms (their
    /// cache is never a restore target, see `crate::time_travel`).
    fn import_json(&self, store: &Store, value: &serde_json::Value) -> Result<()>;
}

struct AtomHandle<T: AtomValue> {
    id: AtomId,
    kind: AtomKind<T>,
}

impl<T: AtomValue> AtomOps for AtomHandle<T> {
    fn id(&self) -> AtomId {
        self.id
    }

    fn variant(&self) -> AtomVariant {
        match self.kind {
            AtomKind::Primitive { .. } => AtomVariant::Primitive,
            AtomKind::Computed { .. } => AtomVariant::Computed,
            AtomKind::Writable { .. } => AtomVariant::Writable,
        }
    }

    fn recompute(&self, store: &Store) -> Result<Recomputed> {
        match &self.kind {
            AtomKind::Primitive { initial } => Ok(Recomputed {
                value: Arc::new(initial.clone()),
                dependencies: Default::default(),
            }),
            AtomKind::Computed { read } | AtomKind::Writable { read, .. } => {
                let get = Get::new(store, self.id);
                let value = (read)(&get)?;
                Ok(Recomputed {
                    dependencies: store.take_recorded_dependencies(self.id),
                    value: Arc::new(value),
                })
            }
        }
    }

    fn write_erased(&self, store: &Store, value: Box<dyn Any + Send + Sync>) -> Result<()> {
        match &self.kind {
            AtomKind::Primitive { .. } => {
                unreachable!("primitive writes are handled directly by the store")
            }
            AtomKind::Computed { .. } => Err(NexusError::WriteToComputed { atom_id: self.id }),
            AtomKind::Writable { write, .. } => {
                let value = *value
                    .downcast::<T>()
                    .expect("atom write type mismatch (internal invariant violated)");
                let get = Get::new(store, self.id);
                let set = Set::new(store);
                (write)(&get, &set, value)
            }
        }
    }

    fn to_json(&self, value: &(dyn Any + Send + Sync)) -> serde_json::Value {
        match value.downcast_ref::<T>() {
            Some(v) => serde_json::to_value(v)
                .unwrap_or_else(|e| serde_json::Value::String(format!("[unserializable: {e}]"))),
            None => serde_json::Value::String("[type mismatch]".to_string()),
        }
    }

    fn values_equal(&self, a: &(dyn Any + Send + Sync), b: &(dyn Any + Send + Sync)) -> bool {
        match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn import_json(&self, store: &Store, value: &serde_json::Value) -> Result<()> {
        if matches!(self.kind, AtomKind::Computed { .. }) {
            return Ok(());
        }
        let parsed: T = serde_json::from_value(value.clone())
            .map_err(|e| NexusError::MalformedDebugMessage { reason: e.to_string() })?;
        store.set_intercepted(self.id, Box::new(parsed))
    }
}

/// Create a primitive atom holding `initial`. Read and write go directly
/// through the store.
pub fn primitive_atom<T: AtomValue>(initial: T) -> PrimitiveAtom<T> {
    let atom = Atom {
        id: next_atom_id(),
        kind: AtomKind::Primitive { initial },
        debug_label: None,
        _marker: PhantomData,
    };
    registry::global().register(atom.as_ops(), None);
    atom
}

/// Create a read-only derived atom. `read` is invoked with a [`Get`]
/// that records a dependency edge for every atom it reads.
pub fn computed_atom<T, F>(read: F) -> ComputedAtom<T>
where
    T: AtomValue,
    F: Fn(&Get) -> Result<T> + Send + Sync + 'static,
{
    let atom = Atom {
        id: next_atom_id(),
        kind: AtomKind::Computed { read: Arc::new(read) },
        debug_label: None,
        _marker: PhantomData,
    };
    registry::global().register(atom.as_ops(), None);
    atom
}

/// Create a writable derived atom: `read` computes the value, `write`
/// decides how an incoming value propagates to underlying atoms.
pub fn writable_atom<T, R, W>(read: R, write: W) -> WritableAtom<T>
where
    T: AtomValue,
    R: Fn(&Get) -> Result<T> + Send + Sync + 'static,
    W: Fn(&Get, &Set, T) -> Result<()> + Send + Sync + 'static,
{
    let atom = Atom {
        id: next_atom_id(),
        kind: AtomKind::Writable { read: Arc::new(read), write: Arc::new(write) },
        debug_label: None,
        _marker: PhantomData,
    };
    registry::global().register(atom.as_ops(), None);
    atom
}

pub(crate) fn atom_ops<T: AtomValue>(atom: &Atom<T>) -> Arc<dyn AtomOps> {
    atom.as_ops()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_id_uniqueness() {
        let a1 = primitive_atom(1);
        let a2 = primitive_atom(1);
        assert_ne!(a1.id(), a2.id());
    }

    #[test]
    fn test_atom_variants() {
        let p = primitive_atom(1);
        assert_eq!(p.variant(), AtomVariant::Primitive);

        let c = computed_atom(move |get| get.get(&p));
        assert_eq!(c.variant(), AtomVariant::Computed);

        let w = writable_atom(
            move |get| get.get(&p),
            move |_get, set, v: i32| set.set(&p, v),
        );
        assert_eq!(w.variant(), AtomVariant::Writable);
    }

    #[test]
    fn test_with_label_formats_to_string() {
        let a = primitive_atom(1).with_label("count");
        assert_eq!(a.to_string(), format!("atom{}:count", a.id()));
        let b = primitive_atom(2);
        assert_eq!(b.to_string(), format!("atom{}", b.id()));
    }
}
