use async_trait::async_trait;
use lantern_core::{PeerId, StreamId};

/// Outbound notification hook, implemented by the surrounding application
/// (push notifications, activity feed). The relay calls it when a broadcast
/// ends without an explicit stop; delivery is best-effort and never awaited
/// on the signaling path.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn stream_ended_abnormally(&self, watcher: PeerId, stream: StreamId);
}

/// Default hook that drops every notification.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn stream_ended_abnormally(&self, _watcher: PeerId, _stream: StreamId) {}
}
