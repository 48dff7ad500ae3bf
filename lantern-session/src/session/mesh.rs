use crate::link::PeerLink;
use crate::media::LocalMedia;
use crate::presence::{PresenceEvent, PresenceTracker};
use crate::session::negotiation::NegotiationEvent;
use crate::session::session_config::SessionConfig;
use crate::session::session_event::SessionEvent;
use crate::session::signal_sink::SignalSink;
use crate::transport::{PeerTransport, TransportEvent, TransportFactory};
use dashmap::DashMap;
use lantern_core::{ClientSignal, LinkRole, NegotiationState, PeerId, RoomId, ServerSignal};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug)]
enum MeshCommand {
    Leave,
}

/// Caller-facing view of a running mesh session. Link states are published
/// by the manager's event loop; commands go the other way.
#[derive(Clone)]
pub struct MeshHandle {
    peer_id: PeerId,
    room: RoomId,
    link_view: Arc<DashMap<PeerId, (LinkRole, NegotiationState)>>,
    command_tx: mpsc::UnboundedSender<MeshCommand>,
}

impl MeshHandle {
    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn link_state(&self, peer: &PeerId) -> Option<(LinkRole, NegotiationState)> {
        self.link_view.get(peer).map(|entry| *entry.value())
    }

    pub fn links(&self) -> Vec<(PeerId, LinkRole, NegotiationState)> {
        self.link_view
            .iter()
            .map(|entry| {
                let (role, state) = *entry.value();
                (entry.key().clone(), role, state)
            })
            .collect()
    }

    pub fn link_count(&self) -> usize {
        self.link_view.len()
    }

    /// Asks the manager to close every link and leave the room.
    pub fn leave(&self) {
        let _ = self.command_tx.send(MeshCommand::Leave);
    }
}

/// Per-client mesh session: one peer link toward every other room member,
/// driven by relay signals. Initiation is glare-free: for any pair, the
/// lexicographically smaller peer id sends the offer.
pub struct PeerSessionManager {
    local: PeerId,
    room: RoomId,
    links: HashMap<PeerId, PeerLink>,
    link_view: Arc<DashMap<PeerId, (LinkRole, NegotiationState)>>,
    presence: PresenceTracker,
    sink: Arc<dyn SignalSink>,
    factory: Arc<dyn TransportFactory>,
    media: Option<LocalMedia>,
    config: SessionConfig,
    signal_rx: mpsc::UnboundedReceiver<ServerSignal>,
    command_rx: mpsc::UnboundedReceiver<MeshCommand>,
    negotiation_tx: mpsc::Sender<NegotiationEvent>,
    negotiation_rx: mpsc::Receiver<NegotiationEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl PeerSessionManager {
    /// Starts the session's event loop. `signal_rx` carries everything the
    /// relay sends this client; the returned receiver reports session events
    /// to the caller.
    pub fn spawn(
        local: PeerId,
        room: RoomId,
        signal_rx: mpsc::UnboundedReceiver<ServerSignal>,
        sink: Arc<dyn SignalSink>,
        factory: Arc<dyn TransportFactory>,
        media: Option<LocalMedia>,
        config: SessionConfig,
    ) -> (MeshHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (negotiation_tx, negotiation_rx) = mpsc::channel(64);
        let (transport_tx, transport_rx) = mpsc::channel(256);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let link_view = Arc::new(DashMap::new());

        let handle = MeshHandle {
            peer_id: local.clone(),
            room: room.clone(),
            link_view: link_view.clone(),
            command_tx,
        };

        let manager = Self {
            presence: PresenceTracker::new(room.clone(), local.clone()),
            local,
            room,
            links: HashMap::new(),
            link_view,
            sink,
            factory,
            media,
            config,
            signal_rx,
            command_rx,
            negotiation_tx,
            negotiation_rx,
            transport_tx,
            transport_rx,
            events: event_tx,
        };
        tokio::spawn(manager.run());

        (handle, event_rx)
    }

    async fn run(mut self) {
        info!(peer = %self.local, room = %self.room, "mesh session started");
        self.sink
            .send(ClientSignal::JoinRoom {
                room: self.room.clone(),
            })
            .await;

        let mut sweep = tokio::time::interval(self.config.sweep_interval);

        loop {
            tokio::select! {
                signal = self.signal_rx.recv() => match signal {
                    Some(signal) => self.handle_signal(signal).await,
                    None => {
                        info!(peer = %self.local, "signaling channel closed");
                        self.shutdown(false).await;
                        break;
                    }
                },
                Some(MeshCommand::Leave) = self.command_rx.recv() => {
                    self.shutdown(true).await;
                    break;
                },
                Some(event) = self.negotiation_rx.recv() => self.handle_negotiation(event).await,
                Some(event) = self.transport_rx.recv() => self.handle_transport(event).await,
                _ = sweep.tick() => self.sweep_stalled(),
            }
        }

        info!(peer = %self.local, room = %self.room, "mesh session stopped");
    }

    async fn handle_signal(&mut self, signal: ServerSignal) {
        for event in self.presence.observe(&signal) {
            match event {
                PresenceEvent::Joined(peer) => self.on_peer_joined(peer).await,
                PresenceEvent::Left(peer) => self.close_link(peer),
            }
        }

        match signal {
            ServerSignal::Offer { sender, sdp } => self.on_offer(sender, sdp).await,
            ServerSignal::Answer { sender, sdp } => self.on_answer(sender, sdp),
            ServerSignal::IceCandidate { sender, candidate } => {
                self.on_candidate(sender, candidate)
            }
            _ => {}
        }
    }

    /// Directional tie-break: initiate only toward peers that sort after us,
    /// so each pair has exactly one initiator and crossed offers cannot
    /// happen.
    async fn on_peer_joined(&mut self, peer: PeerId) {
        if peer <= self.local {
            debug!(peer = %self.local, remote = %peer, "waiting for remote offer");
            return;
        }
        if self.links.contains_key(&peer) {
            return;
        }

        let transport = match self
            .factory
            .create(peer.clone(), self.transport_tx.clone(), self.media.clone())
            .await
        {
            Ok(transport) => transport,
            Err(e) => {
                warn!(remote = %peer, "transport creation failed: {e:#}");
                return;
            }
        };

        let link = PeerLink::new(peer.clone(), LinkRole::Initiator, transport.clone());
        self.links.insert(peer.clone(), link);
        self.publish(&peer);
        self.spawn_offer(peer, transport);
    }

    async fn on_offer(&mut self, sender: PeerId, sdp: String) {
        if self.links.contains_key(&sender) {
            warn!(remote = %sender, "crossed offer ignored");
            return;
        }

        let transport = match self
            .factory
            .create(sender.clone(), self.transport_tx.clone(), self.media.clone())
            .await
        {
            Ok(transport) => transport,
            Err(e) => {
                warn!(remote = %sender, "transport creation failed: {e:#}");
                return;
            }
        };

        let mut link = PeerLink::new(sender.clone(), LinkRole::Responder, transport.clone());
        if let Err(e) = link.advance(NegotiationState::OfferReceived) {
            warn!(remote = %sender, "{e}");
            return;
        }
        self.links.insert(sender.clone(), link);
        self.publish(&sender);
        self.spawn_answer(sender, transport, sdp);
    }

    fn on_answer(&mut self, sender: PeerId, sdp: String) {
        let Some(link) = self.links.get_mut(&sender) else {
            debug!(remote = %sender, "answer for unknown link dropped");
            return;
        };
        if let Err(e) = link.advance(NegotiationState::AnswerReceived) {
            warn!(remote = %sender, "unexpected answer: {e}");
            return;
        }
        let transport = link.transport();
        self.publish(&sender);

        let tx = self.negotiation_tx.clone();
        tokio::spawn(async move {
            let event = match transport.apply_remote_answer(sdp).await {
                Ok(()) => NegotiationEvent::AnswerApplied { peer: sender },
                Err(e) => {
                    warn!("failed to apply answer: {e:#}");
                    NegotiationEvent::NegotiationFailed { peer: sender }
                }
            };
            let _ = tx.send(event).await;
        });
    }

    fn on_candidate(&mut self, sender: PeerId, candidate: String) {
        let Some(link) = self.links.get_mut(&sender) else {
            debug!(remote = %sender, "candidate for unknown link dropped");
            return;
        };

        // Buffered until the remote description lands, applied immediately
        // afterwards.
        if let Some(candidate) = link.accept_candidate(candidate) {
            Self::spawn_apply_candidates(sender, link.transport(), vec![candidate]);
        }
    }

    async fn handle_negotiation(&mut self, event: NegotiationEvent) {
        match event {
            NegotiationEvent::OfferReady { peer, sdp } => {
                let Some(link) = self.links.get_mut(&peer) else {
                    return;
                };
                self.sink
                    .send(ClientSignal::Offer {
                        target: peer.clone(),
                        sdp,
                    })
                    .await;
                if let Err(e) = link.advance(NegotiationState::OfferSent) {
                    warn!(remote = %peer, "{e}");
                }
                self.publish(&peer);
            }
            NegotiationEvent::AnswerReady { peer, sdp } => {
                let Some(link) = self.links.get_mut(&peer) else {
                    return;
                };
                // apply_remote_offer set the remote description, so the
                // early-candidate buffer drains now.
                let flushed = link.mark_remote_applied();
                Self::spawn_apply_candidates(peer.clone(), link.transport(), flushed);
                self.sink
                    .send(ClientSignal::Answer {
                        target: peer.clone(),
                        sdp,
                    })
                    .await;
                if let Err(e) = link.advance(NegotiationState::AnswerSent) {
                    warn!(remote = %peer, "{e}");
                }
                self.publish(&peer);
            }
            NegotiationEvent::AnswerApplied { peer } => {
                let Some(link) = self.links.get_mut(&peer) else {
                    return;
                };
                let flushed = link.mark_remote_applied();
                Self::spawn_apply_candidates(peer.clone(), link.transport(), flushed);
            }
            NegotiationEvent::NegotiationFailed { peer } => self.fail_link(peer),
        }
    }

    async fn handle_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Established(peer) => {
                let Some(link) = self.links.get_mut(&peer) else {
                    return;
                };
                if link.state() == NegotiationState::Connected {
                    return;
                }
                match link.advance(NegotiationState::Connected) {
                    Ok(()) => {
                        self.publish(&peer);
                        let _ = self.events.send(SessionEvent::PeerConnected(peer));
                    }
                    Err(e) => warn!(remote = %peer, "{e}"),
                }
            }
            TransportEvent::Failed(peer) => {
                if self.links.contains_key(&peer) {
                    self.fail_link(peer);
                }
            }
            TransportEvent::CandidateGenerated(peer, candidate) => {
                self.sink
                    .send(ClientSignal::IceCandidate {
                        target: peer,
                        candidate,
                    })
                    .await;
            }
        }
    }

    fn sweep_stalled(&mut self) {
        let stalled: Vec<PeerId> = self
            .links
            .iter()
            .filter(|(_, link)| link.stalled(self.config.negotiation_timeout))
            .map(|(peer, _)| peer.clone())
            .collect();

        for peer in stalled {
            warn!(remote = %peer, "negotiation timed out");
            self.fail_link(peer);
        }
    }

    fn close_link(&mut self, peer: PeerId) {
        let Some(mut link) = self.links.remove(&peer) else {
            return;
        };
        let _ = link.advance(NegotiationState::Closed);
        self.link_view.remove(&peer);

        let transport = link.transport();
        tokio::spawn(async move {
            let _ = transport.close().await;
        });
        let _ = self.events.send(SessionEvent::PeerLeft(peer));
    }

    fn fail_link(&mut self, peer: PeerId) {
        let Some(mut link) = self.links.remove(&peer) else {
            return;
        };
        let _ = link.advance(NegotiationState::Failed);
        self.link_view.remove(&peer);

        let transport = link.transport();
        tokio::spawn(async move {
            let _ = transport.close().await;
        });
        let _ = self.events.send(SessionEvent::PeerFailed(peer));
    }

    /// Closes every owned link before the loop exits; nothing outlives the
    /// manager.
    async fn shutdown(&mut self, announce_leave: bool) {
        for (_, mut link) in self.links.drain() {
            let _ = link.advance(NegotiationState::Closed);
            let _ = link.transport().close().await;
        }
        self.link_view.clear();

        if announce_leave {
            self.sink
                .send(ClientSignal::LeaveRoom {
                    room: self.room.clone(),
                })
                .await;
        }
    }

    fn spawn_offer(&self, peer: PeerId, transport: Arc<dyn PeerTransport>) {
        let tx = self.negotiation_tx.clone();
        tokio::spawn(async move {
            let event = match transport.create_offer().await {
                Ok(sdp) => NegotiationEvent::OfferReady { peer, sdp },
                Err(e) => {
                    warn!("failed to create offer: {e:#}");
                    NegotiationEvent::NegotiationFailed { peer }
                }
            };
            let _ = tx.send(event).await;
        });
    }

    fn spawn_answer(&self, peer: PeerId, transport: Arc<dyn PeerTransport>, sdp: String) {
        let tx = self.negotiation_tx.clone();
        tokio::spawn(async move {
            let event = match transport.apply_remote_offer(sdp).await {
                Ok(sdp) => NegotiationEvent::AnswerReady { peer, sdp },
                Err(e) => {
                    warn!("failed to answer offer: {e:#}");
                    NegotiationEvent::NegotiationFailed { peer }
                }
            };
            let _ = tx.send(event).await;
        });
    }

    fn spawn_apply_candidates(
        peer: PeerId,
        transport: Arc<dyn PeerTransport>,
        candidates: Vec<String>,
    ) {
        if candidates.is_empty() {
            return;
        }
        tokio::spawn(async move {
            for candidate in candidates {
                if let Err(e) = transport.add_remote_candidate(candidate).await {
                    warn!(remote = %peer, "failed to add ICE candidate: {e:#}");
                }
            }
        });
    }

    fn publish(&self, peer: &PeerId) {
        if let Some(link) = self.links.get(peer) {
            self.link_view
                .insert(peer.clone(), (link.role(), link.state()));
        }
    }
}
