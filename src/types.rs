//! Core type aliases and small value types shared across the crate.
//!
//! The read/write contexts that used to live here as `Getter`/`Setter`
//! traits are concrete structs in [`crate::context`] instead — a trait
//! with a generic `get<T>` method can't be made into a trait object, so
//! this module sticks to plain aliases and small value types.

use std::sync::Arc;

pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Opaque, process-wide unique identifier for an atom.
///
/// Reference equality for atoms is realized as identity of this id:
/// two atoms created from the same initial value still get distinct ids.
pub type AtomId = usize;

/// Monotonically increasing identifier assigned to each store instance.
pub type StoreId = usize;

/// Version counter bumped every time an atom's cached value changes.
pub type EpochNumber = u64;

/// Identifier for an individual subscriber registration, used so
/// `unsubscribe` can remove exactly one listener even if two listeners
/// are otherwise indistinguishable.
pub type SubscriberId = u64;

/// Tag distinguishing the three atom variants: plain state, read-only
/// derivations, and derivations with a custom write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomVariant {
    Primitive,
    Computed,
    Writable,
}

impl AtomVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            AtomVariant::Primitive => "primitive",
            AtomVariant::Computed => "computed",
            AtomVariant::Writable => "writable",
        }
    }
}

impl std::fmt::Display for AtomVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value or a pure updater over the previous value, mirroring Jotai's
/// `SetStateAction<Value>`.
pub enum SetStateAction<T> {
    Value(T),
    Updater(Box<dyn FnOnce(T) -> T + Send>),
}

impl<T> SetStateAction<T> {
    pub fn resolve(self, previous: T) -> T {
        match self {
            SetStateAction::Value(v) => v,
            SetStateAction::Updater(f) => f(previous),
        }
    }
}

impl<T> From<T> for SetStateAction<T> {
    fn from(value: T) -> Self {
        SetStateAction::Value(value)
    }
}

/// Listener callback registered via `Store::subscribe`.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Disposer returned by `Store::subscribe`. Calling it more than once is
/// a no-op.
pub struct Unsubscribe {
    inner: Box<dyn FnMut() + Send>,
}

impl Unsubscribe {
    pub fn new(f: impl FnMut() + Send + 'static) -> Self {
        Unsubscribe { inner: Box::new(f) }
    }

    pub fn call(&mut self) {
        (self.inner)();
    }
}
