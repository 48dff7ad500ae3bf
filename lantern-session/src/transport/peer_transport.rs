use crate::media::LocalMedia;
use crate::transport::TransportEvent;
use anyhow::Result;
use async_trait::async_trait;
use lantern_core::PeerId;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Description exchange and candidate plumbing for one peer link. Calls are
/// long-running; session managers run them on spawned tasks and stay
/// responsive to unrelated envelopes.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Generates the local description and returns its SDP.
    async fn create_offer(&self) -> Result<String>;

    /// Applies the remote offer and returns the local answer SDP.
    async fn apply_remote_offer(&self, sdp: String) -> Result<String>;

    async fn apply_remote_answer(&self, sdp: String) -> Result<()>;

    async fn add_remote_candidate(&self, candidate: String) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Mints one transport per peer link. `media`, when present, is the shared
/// local source to attach; the factory must not take ownership of it away
/// from other links.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        peer: PeerId,
        events: mpsc::Sender<TransportEvent>,
        media: Option<LocalMedia>,
    ) -> Result<Arc<dyn PeerTransport>>;
}
