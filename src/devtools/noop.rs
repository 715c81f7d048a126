//! Zero-overhead stand-in for [`crate::devtools::bridge::DebugBridge`],
//! compiled in instead of the real bridge when the `devtools` feature is
//! off. The real bridge also has a runtime development/production guard
//! (see `crate::devtools::env_guard`) for the feature-on case, but
//! disabling the feature entirely is the only way to remove the bridge's
//! code from the binary altogether.

use std::sync::Arc;

use crate::plugin::Plugin;
use crate::store::Store;

/// A plugin that does nothing. `Store::apply_plugin` still calls its
/// hooks, but every hook is an empty function the compiler inlines away.
pub struct DebugBridge;

pub struct DebugBridgeOptions;

impl Default for DebugBridgeOptions {
    fn default() -> Self {
        DebugBridgeOptions
    }
}

impl DebugBridge {
    pub fn attach(store: &Arc<Store>, _options: DebugBridgeOptions) -> Arc<DebugBridge> {
        let bridge = Arc::new(DebugBridge);
        store.apply_plugin(bridge.clone());
        bridge
    }
}

impl Plugin for DebugBridge {
    fn name(&self) -> &str {
        "devtools-bridge-noop"
    }
}
