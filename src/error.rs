//! Error taxonomy for nexus-state: one `thiserror` enum plus a
//! crate-wide `Result` alias, covering atom construction, writes,
//! recomputation, registry lookups, and the debug protocol.

use thiserror::Error;

/// Error taxonomy for nexus-state.
#[derive(Error, Debug, Clone)]
pub enum NexusError {
    /// The atom factory was called with an argument shape matching none
    /// of `primitive_atom` / `computed_atom` / `writable_atom`.
    #[error("invalid atom definition: {reason}")]
    InvalidAtomDefinition { reason: String },

    /// `set` (or an intercepting variant) was called on a computed atom.
    #[error("atom {atom_id} is computed and cannot be written to")]
    WriteToComputed { atom_id: usize },

    /// A derivation re-entered itself during evaluation.
    #[error("circular dependency detected while evaluating atom {atom_id}")]
    CircularDependency { atom_id: usize },

    /// A registry lookup missed during restore or mapper bookkeeping.
    /// Non-fatal: always logged and skipped, never returned to a caller
    /// that cannot act on it.
    #[error("atom {atom_id} is not present in the registry")]
    UnknownAtom { atom_id: usize },

    /// An inbound debug-protocol message was missing required fields or
    /// carried invalid data (bad index, empty action name, missing
    /// state, failing checksum).
    #[error("malformed debug message: {reason}")]
    MalformedDebugMessage { reason: String },

    /// A plugin callback (including the debug bridge) panicked or
    /// returned an error during a mutation.
    #[error("plugin '{plugin}' failed: {reason}")]
    PluginFailure { plugin: String, reason: String },

    /// A subscriber callback panicked during notification.
    #[error("subscriber for atom {atom_id} failed: {reason}")]
    SubscriberFailure { atom_id: usize, reason: String },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, NexusError>;
