//! `EnhancedStore`: a plain [`Store`] plus an optional time-travel
//! controller and an optional debug bridge. A plain `Store` (from
//! `create_store`) already exposes `apply_plugin`/`set_with_metadata`/
//! `serialize_state`/etc; what `EnhancedStore` adds on top is bundling
//! the time-travel controller and wiring the debug bridge to it.

use std::sync::Arc;

use crate::plugin::Plugin;
use crate::registry::{self, Registry, RegistryMode};
use crate::store::Store;
use crate::time_travel::TimeTravel;

pub struct EnhancedStoreOptions {
    pub registry: Option<Arc<Registry>>,
    pub mode: RegistryMode,
    /// `None` disables time-travel tracking entirely.
    pub time_travel_capacity: Option<usize>,
    #[cfg(feature = "devtools")]
    pub debug_transport: Option<Arc<dyn crate::devtools::transport::DevToolsTransport>>,
    #[cfg(feature = "devtools")]
    pub debug_options: crate::devtools::DebugBridgeOptions,
}

impl Default for EnhancedStoreOptions {
    fn default() -> Self {
        EnhancedStoreOptions {
            registry: None,
            mode: RegistryMode::Global,
            time_travel_capacity: Some(50),
            #[cfg(feature = "devtools")]
            debug_transport: None,
            #[cfg(feature = "devtools")]
            debug_options: crate::devtools::DebugBridgeOptions::default(),
        }
    }
}

pub struct EnhancedStore {
    store: Arc<Store>,
    time_travel: Option<Arc<TimeTravel>>,
    #[cfg(feature = "devtools")]
    debug_bridge: Option<Arc<crate::devtools::DebugBridge>>,
}

impl EnhancedStore {
    pub fn new(plugins: Vec<Arc<dyn Plugin>>, options: EnhancedStoreOptions) -> Arc<EnhancedStore> {
        let registry = options.registry.clone().unwrap_or_else(registry::global);
        let store = Store::with_registry(registry, options.mode);
        for plugin in plugins {
            store.apply_plugin(plugin);
        }

        let time_travel = options.time_travel_capacity.map(|cap| TimeTravel::with_capacity(store.clone(), cap));

        #[cfg(feature = "devtools")]
        let debug_bridge = match options.debug_transport {
            Some(transport) => {
                let mut debug_options = options.debug_options;
                debug_options.time_travel = time_travel.clone();
                Some(crate::devtools::DebugBridge::attach(&store, transport, debug_options))
            }
            None => None,
        };

        Arc::new(EnhancedStore {
            store,
            time_travel,
            #[cfg(feature = "devtools")]
            debug_bridge,
        })
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn time_travel(&self) -> Option<&Arc<TimeTravel>> {
        self.time_travel.as_ref()
    }

    #[cfg(feature = "devtools")]
    pub fn debug_bridge(&self) -> Option<&Arc<crate::devtools::DebugBridge>> {
        self.debug_bridge.as_ref()
    }
}

impl std::ops::Deref for EnhancedStore {
    type Target = Store;

    fn deref(&self) -> &Store {
        &self.store
    }
}

pub fn create_enhanced_store(plugins: Vec<Arc<dyn Plugin>>, options: EnhancedStoreOptions) -> Arc<EnhancedStore> {
    EnhancedStore::new(plugins, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::primitive_atom;

    #[test]
    fn test_enhanced_store_derefs_to_plain_store_operations() {
        let enhanced = create_enhanced_store(Vec::new(), EnhancedStoreOptions::default());
        let a = primitive_atom(1);
        enhanced.set(&a, 5).unwrap();
        assert_eq!(enhanced.get(&a).unwrap(), 5);
    }

    #[test]
    fn test_enhanced_store_undo_restores_materialized_atom() {
        let enhanced = create_enhanced_store(
            Vec::new(),
            EnhancedStoreOptions { time_travel_capacity: Some(10), ..EnhancedStoreOptions::default() },
        );
        let a = primitive_atom(1);
        let tt = enhanced.time_travel().unwrap();
        enhanced.get(&a).unwrap(); // materialize before the first capture
        tt.capture(None);
        enhanced.set(&a, 2).unwrap();
        tt.capture(None);
        assert!(tt.undo());
        assert_eq!(enhanced.get(&a).unwrap(), 1);
    }
}
