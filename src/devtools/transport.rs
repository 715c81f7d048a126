//! The boundary between the debug bridge and whatever actually carries
//! messages to a DevTools panel. Nexus-state has no opinion on the
//! transport — a browser extension bridge, a local socket, a test
//! harness — so `DevToolsTransport` is the seam, with a simple
//! channel-backed implementation good enough for tests and for embedding
//! behind whatever the host application actually wires up.

use std::sync::mpsc::{Receiver, Sender};

use crate::devtools::protocol::{InboundMessage, OutboundMessage};

/// Sends serialized outbound messages somewhere, and offers a
/// non-blocking poll for inbound ones. Implementations must not block
/// `send` for long: it's called from inside `Store::set`.
pub trait DevToolsTransport: Send + Sync {
    fn send(&self, message: OutboundMessage);
    fn try_recv(&self) -> Option<InboundMessage>;
}

/// An in-process channel transport: `send` pushes JSON onto an mpsc
/// channel the embedding application drains, `try_recv` pulls whatever
/// the application has queued going the other way.
pub struct ChannelTransport {
    outbound: Sender<OutboundMessage>,
    inbound: parking_lot::Mutex<Receiver<InboundMessage>>,
}

impl ChannelTransport {
    /// Returns the transport plus the two channel ends the embedding
    /// application should hold: receive outbound messages, send inbound
    /// commands.
    pub fn pair() -> (ChannelTransport, Receiver<OutboundMessage>, Sender<InboundMessage>) {
        let (out_tx, out_rx) = std::sync::mpsc::channel();
        let (in_tx, in_rx) = std::sync::mpsc::channel();
        (ChannelTransport { outbound: out_tx, inbound: parking_lot::Mutex::new(in_rx) }, out_rx, in_tx)
    }
}

impl DevToolsTransport for ChannelTransport {
    fn send(&self, message: OutboundMessage) {
        // A disconnected receiver (embedder dropped its end) just means
        // nobody is listening; dropping the message is correct.
        let _ = self.outbound.send(message);
    }

    fn try_recv(&self) -> Option<InboundMessage> {
        self.inbound.lock().try_recv().ok()
    }
}
