use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use lantern_core::PeerId;
use lantern_session::media::LocalMedia;
use lantern_session::transport::{PeerTransport, TransportEvent, TransportFactory};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// In-memory transport: descriptions are synthetic strings, connectivity is
/// driven manually via `establish`/`fail`.
pub struct MockTransport {
    pub remote: PeerId,
    events: mpsc::Sender<TransportEvent>,
    answer_delay: Duration,
    pub remote_offer: Mutex<Option<String>>,
    pub remote_answer: Mutex<Option<String>>,
    pub applied_candidates: Mutex<Vec<String>>,
    pub has_media: bool,
    closed: AtomicBool,
}

impl MockTransport {
    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn applied_candidates(&self) -> Vec<String> {
        self.applied_candidates.lock().unwrap().clone()
    }

    /// Simulates the underlying connection reaching connectivity.
    pub async fn establish(&self) {
        let _ = self
            .events
            .send(TransportEvent::Established(self.remote.clone()))
            .await;
    }

    /// Simulates a transport-reported connectivity failure.
    pub async fn fail(&self) {
        let _ = self
            .events
            .send(TransportEvent::Failed(self.remote.clone()))
            .await;
    }

    /// Simulates local ICE gathering producing a candidate.
    pub async fn emit_candidate(&self, candidate: &str) {
        let _ = self
            .events
            .send(TransportEvent::CandidateGenerated(
                self.remote.clone(),
                candidate.to_owned(),
            ))
            .await;
    }
}

#[async_trait]
impl PeerTransport for MockTransport {
    async fn create_offer(&self) -> Result<String> {
        Ok(format!("offer-for-{}", self.remote))
    }

    async fn apply_remote_offer(&self, sdp: String) -> Result<String> {
        if !self.answer_delay.is_zero() {
            tokio::time::sleep(self.answer_delay).await;
        }
        *self.remote_offer.lock().unwrap() = Some(sdp);
        Ok(format!("answer-for-{}", self.remote))
    }

    async fn apply_remote_answer(&self, sdp: String) -> Result<()> {
        *self.remote_answer.lock().unwrap() = Some(sdp);
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: String) -> Result<()> {
        self.applied_candidates.lock().unwrap().push(candidate);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out `MockTransport`s and keeps them reachable per remote peer so
/// tests can inspect and drive them.
pub struct MockTransportFactory {
    created: DashMap<PeerId, Arc<MockTransport>>,
    answer_delay: Duration,
}

impl MockTransportFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            created: DashMap::new(),
            answer_delay: Duration::ZERO,
        })
    }

    /// A factory whose transports take a while to produce an answer, so
    /// candidates sent right after the offer provably arrive first.
    pub fn with_answer_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            created: DashMap::new(),
            answer_delay: delay,
        })
    }

    pub fn transport_to(&self, remote: &PeerId) -> Option<Arc<MockTransport>> {
        self.created.get(remote).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl TransportFactory for MockTransportFactory {
    async fn create(
        &self,
        peer: PeerId,
        events: mpsc::Sender<TransportEvent>,
        media: Option<LocalMedia>,
    ) -> Result<Arc<dyn PeerTransport>> {
        let transport = Arc::new(MockTransport {
            remote: peer.clone(),
            events,
            answer_delay: self.answer_delay,
            remote_offer: Mutex::new(None),
            remote_answer: Mutex::new(None),
            applied_candidates: Mutex::new(Vec::new()),
            has_media: media.is_some(),
            closed: AtomicBool::new(false),
        });
        self.created.insert(peer, transport.clone());
        Ok(transport)
    }
}
