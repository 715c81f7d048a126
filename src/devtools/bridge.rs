//! The full debug-bridge plugin: batches mutations, names actions,
//! serializes state, and routes Redux-DevTools `DISPATCH` commands back
//! into a store's time-travel controller.
//!
//! Swapped out for [`crate::devtools::noop`] entirely at compile time
//! when the `devtools` feature is disabled — this module only exists in
//! the feature-enabled build. Even with the feature on, mutation
//! forwarding itself is gated at runtime by
//! [`crate::devtools::env_guard::is_development`], so a production
//! deployment built with `devtools` still on (e.g. a shared workspace
//! build profile) doesn't leak state over the transport.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::devtools::naming::{ActionNamer, CompositeNamer};
use crate::mapper::ActionSnapshotMapper;
use crate::devtools::protocol::{ActionPayload, BatchedAction, DispatchPayload, InboundMessage, OutboundMessage};
use crate::devtools::serializer::{self, SerializerConfig};
use crate::devtools::stack_tracer::StackTracer;
use crate::devtools::transport::DevToolsTransport;
use crate::plugin::{MutationEvent, Plugin};
use crate::store::Store;
use crate::time_travel::TimeTravel;
use crate::types::StoreId;

const DEFAULT_BATCH_WINDOW: Duration = Duration::from_millis(50);
const DEFAULT_BATCH_SIZE: usize = 32;

pub struct DebugBridgeOptions {
    pub namer: Box<dyn ActionNamer>,
    pub batch_window: Duration,
    pub batch_size: usize,
    pub serializer: SerializerConfig,
    pub trace_stacks: bool,
    pub time_travel: Option<Arc<TimeTravel>>,
}

impl Default for DebugBridgeOptions {
    fn default() -> Self {
        DebugBridgeOptions {
            namer: Box::new(CompositeNamer::default()),
            batch_window: DEFAULT_BATCH_WINDOW,
            batch_size: DEFAULT_BATCH_SIZE,
            serializer: SerializerConfig::default(),
            trace_stacks: false,
            time_travel: None,
        }
    }
}

struct BatchState {
    pending: Vec<ActionPayload>,
    last_flush: Instant,
}

/// A `Plugin` that mirrors a store's mutations to a connected devtools
/// panel and accepts `DISPATCH` commands back from it.
pub struct DebugBridge {
    store: Weak<Store>,
    transport: Arc<dyn DevToolsTransport>,
    namer: Box<dyn ActionNamer>,
    batch_window: Duration,
    batch_size: usize,
    serializer_config: SerializerConfig,
    stack_tracer: StackTracer,
    time_travel: Option<Arc<TimeTravel>>,
    mapper: Mutex<ActionSnapshotMapper>,
    next_action_id: AtomicU64,
    batch: Mutex<BatchState>,
    /// Stack of active `start_batch`/`end_batch` bracket ids, innermost
    /// last. While non-empty, mutations are grouped per-bracket instead
    /// of going through the regular size/time-windowed `batch`; nested
    /// brackets flush independently of the outer group when their own
    /// `end_batch` runs.
    brackets: Mutex<Vec<u64>>,
    bracket_pending: Mutex<HashMap<u64, Vec<ActionPayload>>>,
    enabled: AtomicBool,
}

impl DebugBridge {
    /// Build and attach a bridge to `store`, sending the initial `INIT`
    /// message immediately.
    pub fn attach(
        store: &Arc<Store>,
        transport: Arc<dyn DevToolsTransport>,
        options: DebugBridgeOptions,
    ) -> Arc<DebugBridge> {
        let bridge = Arc::new(DebugBridge {
            store: Arc::downgrade(store),
            transport,
            namer: options.namer,
            batch_window: options.batch_window,
            batch_size: options.batch_size,
            serializer_config: options.serializer,
            stack_tracer: StackTracer::new(options.trace_stacks),
            time_travel: options.time_travel,
            mapper: Mutex::new(ActionSnapshotMapper::new(64)),
            next_action_id: AtomicU64::new(0),
            batch: Mutex::new(BatchState { pending: Vec::new(), last_flush: Instant::now() }),
            brackets: Mutex::new(Vec::new()),
            bracket_pending: Mutex::new(HashMap::new()),
            enabled: AtomicBool::new(true),
        });
        bridge.send_init();
        store.apply_plugin(bridge.clone());
        bridge
    }

    fn send_init(&self) {
        if let Some(store) = self.store.upgrade() {
            let state = serializer::bound(&store.serialize_state(), &self.serializer_config);
            self.transport.send(OutboundMessage::Init { state });
        }
    }

    /// Drain any commands the devtools panel has queued and, if the
    /// batch window has elapsed since the last flush, emit the pending
    /// group. Cheap and non-blocking; call it as often as convenient —
    /// this plugin also calls it opportunistically from `on_mutation`,
    /// but a host that wants the window to fire even when mutations
    /// stop arriving should poll this from its own timer, since the
    /// core never spawns one itself.
    pub fn poll_commands(&self) {
        while let Some(message) = self.transport.try_recv() {
            self.handle_inbound(message);
        }
        self.flush_if_due();
    }

    fn handle_inbound(&self, message: InboundMessage) {
        match message {
            InboundMessage::Start => self.enabled.store(true, Ordering::Relaxed),
            InboundMessage::Stop => self.enabled.store(false, Ordering::Relaxed),
            InboundMessage::Dispatch { payload } => self.handle_dispatch(payload),
        }
    }

    fn handle_dispatch(&self, payload: DispatchPayload) {
        match payload {
            DispatchPayload::JumpToState { index } => {
                let Some(time_travel) = &self.time_travel else {
                    log::warn!("devtools JUMP_TO_STATE received but this bridge has no time-travel controller attached");
                    return;
                };
                time_travel.jump_to(index);
            }
            DispatchPayload::JumpToAction { action_id } => {
                let Some(time_travel) = &self.time_travel else {
                    log::warn!("devtools JUMP_TO_ACTION received but this bridge has no time-travel controller attached");
                    return;
                };
                if let Some(index) = self.mapper.lock().snapshot_for_action(action_id) {
                    time_travel.jump_to(index);
                    return;
                }
                // Fall back to a linear scan of snapshot labels by
                // action-label before giving up.
                let label = action_id.to_string();
                let history = time_travel.get_history();
                match history.iter().position(|s| s.label.as_deref() == Some(label.as_str())) {
                    Some(index) => {
                        time_travel.jump_to(index);
                    }
                    None => {
                        log::warn!("devtools JUMP_TO_ACTION referenced unknown action {action_id}");
                    }
                }
            }
            DispatchPayload::ImportState { state, checksum } => {
                self.import_state(&state, checksum.as_deref());
            }
            DispatchPayload::Commit => self.send_init(),
            DispatchPayload::Reset => {
                log::warn!("devtools RESET is not supported by this bridge");
            }
        }
    }

    fn import_state(&self, state: &serde_json::Value, checksum: Option<&str>) {
        if let Some(expected) = checksum {
            if !serializer::verify_checksum(state, expected) {
                log::warn!("devtools IMPORT_STATE failed checksum verification, ignoring");
                return;
            }
        }
        let Some(store) = self.store.upgrade() else { return };
        let Some(object) = state.as_object() else {
            log::warn!("devtools IMPORT_STATE payload was not a JSON object, ignoring");
            return;
        };
        let registry = store.atom_directory();
        for (name, value) in object {
            let Some(id) = registry.find_by_name(name) else { continue };
            let Some(ops) = registry.get_ops(id) else { continue };
            if let Err(e) = ops.import_json(&store, value) {
                log::warn!("devtools IMPORT_STATE for atom '{name}' failed: {e}");
            }
        }
    }

    /// Open an explicit batch bracket: mutations from here until the
    /// matching `end_batch(id)` are grouped into one outbound action
    /// instead of going through the regular batch window. Brackets may
    /// nest; each flushes independently when its own `end_batch` runs.
    pub fn start_batch(&self, id: u64) {
        self.brackets.lock().push(id);
        self.bracket_pending.lock().entry(id).or_default();
    }

    /// Close bracket `id` and flush everything accumulated under it as a
    /// single grouped action. Mismatched ids (an `end_batch` for a
    /// bracket that isn't the innermost open one) are logged and
    /// ignored rather than corrupting bracket order.
    pub fn end_batch(&self, id: u64) {
        {
            let mut brackets = self.brackets.lock();
            match brackets.last() {
                Some(top) if *top == id => {
                    brackets.pop();
                }
                _ => {
                    log::warn!("devtools end_batch({id}) did not match the innermost open bracket");
                    return;
                }
            }
        }
        let actions = self.bracket_pending.lock().remove(&id).unwrap_or_default();
        if actions.is_empty() {
            return;
        }
        let Some(store) = self.store.upgrade() else { return };
        let state = serializer::bound(&store.serialize_state(), &self.serializer_config);
        self.transport.send(OutboundMessage::Batch { action: BatchedAction { actions, state } });
    }

    fn flush_if_due(&self) {
        let Some(store) = self.store.upgrade() else { return };
        let mut batch = self.batch.lock();
        let due = batch.pending.len() >= self.batch_size || batch.last_flush.elapsed() >= self.batch_window;
        if !due || batch.pending.is_empty() {
            return;
        }
        let actions = std::mem::take(&mut batch.pending);
        batch.last_flush = Instant::now();
        drop(batch);

        let state = serializer::bound(&store.serialize_state(), &self.serializer_config);
        // Mutations within the latency window coalesce into at most one
        // outbound message, with each mutation's action metadata
        // preserved as a group — a single action when nothing else
        // landed in the window, a `Batch` otherwise.
        if let [single] = &actions[..] {
            self.transport.send(OutboundMessage::Action { action: single.clone(), state });
        } else {
            self.transport.send(OutboundMessage::Batch { action: BatchedAction { actions, state } });
        }
    }
}

impl Plugin for DebugBridge {
    fn name(&self) -> &str {
        "devtools-bridge"
    }

    fn on_attach(&self, _store_id: StoreId) {}

    fn on_mutation(&self, event: &MutationEvent) {
        self.poll_commands();
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        if !crate::devtools::env_guard::is_development() {
            return;
        }
        if let Some(stack) = self.stack_tracer.capture_if_enabled() {
            log::trace!("mutation of atom {} from:\n{}", event.atom_id, stack.frames.join("\n"));
        }

        // An explicit `action_label` from `set_with_metadata` always wins
        // over the configured naming strategy; it's a per-call override,
        // not itself a strategy in the chain.
        let name = match &event.action_label {
            Some(label) => label.clone(),
            None => self
                .namer
                .name_for(event)
                .unwrap_or_else(|_| format!("unnamed-action-{}", event.timestamp_millis)),
        };
        let action_id = self.next_action_id.fetch_add(1, Ordering::Relaxed);

        if let Some(time_travel) = &self.time_travel {
            let evicted = time_travel.capture(Some(name.clone()));
            if evicted {
                self.mapper.lock().shift_left();
            }
            if let Some(index) = time_travel.cursor() {
                self.mapper.lock().insert(action_id, index);
            }
        }

        let payload = ActionPayload { id: action_id, name, atom_id: Some(event.atom_id) };
        if let Some(&bracket) = self.brackets.lock().last() {
            self.bracket_pending.lock().entry(bracket).or_default().push(payload);
        } else {
            self.batch.lock().pending.push(payload);
            self.flush_if_due();
        }
    }
}
