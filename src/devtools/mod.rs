//! Redux-DevTools-compatible debug bridge.
//!
//! Everything under this module except [`noop`] only exists when the
//! `devtools` Cargo feature is enabled (on by default). Disabling it
//! swaps the entire bridge for the zero-overhead stub at compile time.
//! With the feature on, [`env_guard`] additionally gates mutation
//! forwarding at runtime, so a shared build profile that leaves
//! `devtools` enabled still doesn't forward state off a production
//! deployment by default.

#[cfg(feature = "devtools")]
pub mod bridge;
#[cfg(feature = "devtools")]
pub mod env_guard;
#[cfg(feature = "devtools")]
pub mod naming;
#[cfg(feature = "devtools")]
pub mod protocol;
#[cfg(feature = "devtools")]
pub mod serializer;
#[cfg(feature = "devtools")]
pub mod stack_tracer;
#[cfg(feature = "devtools")]
pub mod transport;

#[cfg(not(feature = "devtools"))]
pub mod noop;

#[cfg(feature = "devtools")]
pub use bridge::{DebugBridge, DebugBridgeOptions};
#[cfg(not(feature = "devtools"))]
pub use noop::{DebugBridge, DebugBridgeOptions};
