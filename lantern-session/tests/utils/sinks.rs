use async_trait::async_trait;
use lantern_core::{ClientSignal, PeerId};
use lantern_relay::SignalRelay;
use lantern_session::session::SignalSink;
use std::sync::{Arc, Mutex};

/// Feeds a session manager's outbound signals straight into an in-process
/// relay, standing in for the WebSocket writer.
pub struct RelaySink {
    relay: SignalRelay,
    local: PeerId,
}

impl RelaySink {
    pub fn new(relay: &SignalRelay, local: &PeerId) -> Arc<Self> {
        Arc::new(Self {
            relay: relay.clone(),
            local: local.clone(),
        })
    }
}

#[async_trait]
impl SignalSink for RelaySink {
    async fn send(&self, signal: ClientSignal) {
        self.relay.handle(&self.local, signal);
    }
}

/// Captures outbound signals for manager tests that run without a relay.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<ClientSignal>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<ClientSignal> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SignalSink for RecordingSink {
    async fn send(&self, signal: ClientSignal) {
        self.sent.lock().unwrap().push(signal);
    }
}
