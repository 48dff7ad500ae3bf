use async_trait::async_trait;
use lantern_core::ClientSignal;

/// Outbound path from a session manager to the relay, implemented by the
/// connection layer (WebSocket writer in production, an in-process relay in
/// tests). Sends are fire-and-forget, matching the protocol's best-effort
/// delivery.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn send(&self, signal: ClientSignal);
}
