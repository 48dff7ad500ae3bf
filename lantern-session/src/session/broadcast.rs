use crate::link::PeerLink;
use crate::media::{LocalMedia, MediaCapture, MediaError};
use crate::session::negotiation::NegotiationEvent;
use crate::session::session_config::SessionConfig;
use crate::session::session_event::SessionEvent;
use crate::session::signal_sink::SignalSink;
use crate::transport::{PeerTransport, TransportEvent, TransportFactory};
use dashmap::DashMap;
use lantern_core::{ClientSignal, LinkRole, NegotiationState, PeerId, ServerSignal, StreamId};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug)]
enum BroadcastCommand {
    Stop,
}

enum Role {
    /// Owns one link per watcher; the shared local source is attached to
    /// each of them.
    Broadcaster { media: LocalMedia },
    /// Owns exactly one link, toward the broadcaster.
    Watcher,
}

/// Caller-facing view of a running broadcast session.
#[derive(Clone)]
pub struct BroadcastHandle {
    stream: StreamId,
    link_view: Arc<DashMap<PeerId, (LinkRole, NegotiationState)>>,
    viewer_count: Arc<AtomicUsize>,
    live: Arc<AtomicBool>,
    command_tx: mpsc::UnboundedSender<BroadcastCommand>,
}

impl BroadcastHandle {
    pub fn stream(&self) -> &StreamId {
        &self.stream
    }

    pub fn viewer_count(&self) -> usize {
        self.viewer_count.load(Ordering::SeqCst)
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn link_state(&self, peer: &PeerId) -> Option<(LinkRole, NegotiationState)> {
        self.link_view.get(peer).map(|entry| *entry.value())
    }

    pub fn link_count(&self) -> usize {
        self.link_view.len()
    }

    /// Broadcaster: stop the stream and tear down every watcher link.
    /// Watcher: leave the stream.
    pub fn stop(&self) {
        let _ = self.command_tx.send(BroadcastCommand::Stop);
    }
}

/// One-to-many broadcast session. The broadcaster and its watchers share one
/// signaling protocol; the relay pairs them per stream id.
pub struct BroadcastSessionManager {
    local: PeerId,
    stream: StreamId,
    role: Role,
    links: HashMap<PeerId, PeerLink>,
    link_view: Arc<DashMap<PeerId, (LinkRole, NegotiationState)>>,
    viewer_count: Arc<AtomicUsize>,
    live: Arc<AtomicBool>,
    sink: Arc<dyn SignalSink>,
    factory: Arc<dyn TransportFactory>,
    config: SessionConfig,
    signal_rx: mpsc::UnboundedReceiver<ServerSignal>,
    command_rx: mpsc::UnboundedReceiver<BroadcastCommand>,
    negotiation_tx: mpsc::Sender<NegotiationEvent>,
    negotiation_rx: mpsc::Receiver<NegotiationEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    events: mpsc::UnboundedSender<SessionEvent>,
    ended: bool,
}

impl BroadcastSessionManager {
    /// Goes live. Media acquisition happens first: a refused permission is a
    /// startup failure and nothing is announced to the relay.
    pub async fn broadcast(
        local: PeerId,
        stream: StreamId,
        capture: Arc<dyn MediaCapture>,
        signal_rx: mpsc::UnboundedReceiver<ServerSignal>,
        sink: Arc<dyn SignalSink>,
        factory: Arc<dyn TransportFactory>,
        config: SessionConfig,
    ) -> Result<(BroadcastHandle, mpsc::UnboundedReceiver<SessionEvent>), MediaError> {
        let media = capture.acquire().await?;
        Ok(Self::spawn(
            local,
            stream,
            Role::Broadcaster { media },
            signal_rx,
            sink,
            factory,
            config,
        ))
    }

    /// Joins an existing stream as a watcher.
    pub fn watch(
        local: PeerId,
        stream: StreamId,
        signal_rx: mpsc::UnboundedReceiver<ServerSignal>,
        sink: Arc<dyn SignalSink>,
        factory: Arc<dyn TransportFactory>,
        config: SessionConfig,
    ) -> (BroadcastHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        Self::spawn(local, stream, Role::Watcher, signal_rx, sink, factory, config)
    }

    fn spawn(
        local: PeerId,
        stream: StreamId,
        role: Role,
        signal_rx: mpsc::UnboundedReceiver<ServerSignal>,
        sink: Arc<dyn SignalSink>,
        factory: Arc<dyn TransportFactory>,
        config: SessionConfig,
    ) -> (BroadcastHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (negotiation_tx, negotiation_rx) = mpsc::channel(64);
        let (transport_tx, transport_rx) = mpsc::channel(256);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let link_view = Arc::new(DashMap::new());
        let viewer_count = Arc::new(AtomicUsize::new(0));
        let live = Arc::new(AtomicBool::new(false));

        let handle = BroadcastHandle {
            stream: stream.clone(),
            link_view: link_view.clone(),
            viewer_count: viewer_count.clone(),
            live: live.clone(),
            command_tx,
        };

        let manager = Self {
            local,
            stream,
            role,
            links: HashMap::new(),
            link_view,
            viewer_count,
            live,
            sink,
            factory,
            config,
            signal_rx,
            command_rx,
            negotiation_tx,
            negotiation_rx,
            transport_tx,
            transport_rx,
            events: event_tx,
            ended: false,
        };
        tokio::spawn(manager.run());

        (handle, event_rx)
    }

    async fn run(mut self) {
        match self.role {
            Role::Broadcaster { .. } => {
                info!(peer = %self.local, stream = %self.stream, "broadcast started");
                self.live.store(true, Ordering::SeqCst);
                self.sink
                    .send(ClientSignal::StartStream {
                        stream: self.stream.clone(),
                    })
                    .await;
            }
            Role::Watcher => {
                info!(peer = %self.local, stream = %self.stream, "watching stream");
                self.sink
                    .send(ClientSignal::WatchStream {
                        stream: self.stream.clone(),
                    })
                    .await;
            }
        }

        let mut sweep = tokio::time::interval(self.config.sweep_interval);

        while !self.ended {
            tokio::select! {
                signal = self.signal_rx.recv() => match signal {
                    Some(signal) => self.handle_signal(signal).await,
                    None => {
                        info!(peer = %self.local, "signaling channel closed");
                        self.shutdown(false).await;
                        break;
                    }
                },
                Some(BroadcastCommand::Stop) = self.command_rx.recv() => {
                    self.shutdown(true).await;
                    break;
                },
                Some(event) = self.negotiation_rx.recv() => self.handle_negotiation(event).await,
                Some(event) = self.transport_rx.recv() => self.handle_transport(event).await,
                _ = sweep.tick() => self.sweep_stalled(),
            }
        }

        info!(peer = %self.local, stream = %self.stream, "broadcast session stopped");
    }

    async fn handle_signal(&mut self, signal: ServerSignal) {
        match signal {
            ServerSignal::WatcherJoined { watcher } => self.on_watcher_joined(watcher).await,
            ServerSignal::WatcherLeft { watcher } => {
                self.teardown_watcher(&watcher, SessionEvent::PeerLeft(watcher.clone()));
            }
            ServerSignal::Offer { sender, sdp } => self.on_offer(sender, sdp).await,
            ServerSignal::Answer { sender, sdp } => self.on_answer(sender, sdp),
            ServerSignal::IceCandidate { sender, candidate } => {
                self.on_candidate(sender, candidate)
            }
            ServerSignal::StreamEnded { stream } => self.on_stream_ended(stream),
            _ => {}
        }
    }

    /// Broadcaster side: one initiator link per watcher, with the shared
    /// local source attached.
    async fn on_watcher_joined(&mut self, watcher: PeerId) {
        let Role::Broadcaster { media } = &self.role else {
            debug!(peer = %self.local, "watcher notification ignored outside broadcaster role");
            return;
        };
        if self.links.contains_key(&watcher) {
            warn!(%watcher, "duplicate watcher notification ignored");
            return;
        }

        let transport = match self
            .factory
            .create(
                watcher.clone(),
                self.transport_tx.clone(),
                Some(media.clone()),
            )
            .await
        {
            Ok(transport) => transport,
            Err(e) => {
                warn!(%watcher, "transport creation failed: {e:#}");
                return;
            }
        };

        let link = PeerLink::new(watcher.clone(), LinkRole::Initiator, transport.clone());
        self.links.insert(watcher.clone(), link);
        self.publish(&watcher);

        // Exactly one increment per created watcher link.
        let count = self.viewer_count.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.events.send(SessionEvent::ViewerCountChanged(count));

        self.spawn_offer(watcher, transport);
    }

    /// Watcher side: the broadcaster's offer creates the single responder
    /// link; its sender is how the watcher learns the broadcaster's id.
    async fn on_offer(&mut self, sender: PeerId, sdp: String) {
        if !matches!(self.role, Role::Watcher) {
            debug!(peer = %self.local, "offer ignored outside watcher role");
            return;
        }
        if !self.links.is_empty() {
            warn!(remote = %sender, "watcher already linked, offer ignored");
            return;
        }

        let transport = match self
            .factory
            .create(sender.clone(), self.transport_tx.clone(), None)
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
        if let Some(candidate) = link.accept_candidate(candidate) {
            Self::spawn_apply_candidates(sender, link.transport(), vec![candidate]);
        }
    }

    fn on_stream_ended(&mut self, stream: StreamId) {
        if stream != self.stream {
            return;
        }
        info!(peer = %self.local, %stream, "stream ended by broadcaster");

        let peers: Vec<PeerId> = self.links.keys().cloned().collect();
        for peer in peers {
            self.retire_link(&peer, NegotiationState::Closed);
        }
        self.live.store(false, Ordering::SeqCst);
        let _ = self.events.send(SessionEvent::StreamEnded(stream));
        self.ended = true;
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
            NegotiationEvent::NegotiationFailed { peer } => self.fail_peer(peer),
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
                        if matches!(self.role, Role::Watcher) {
                            self.live.store(true, Ordering::SeqCst);
                        }
                        let _ = self.events.send(SessionEvent::PeerConnected(peer));
                    }
                    Err(e) => warn!(remote = %peer, "{e}"),
                }
            }
            TransportEvent::Failed(peer) => {
                if self.links.contains_key(&peer) {
                    self.fail_peer(peer);
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
            self.fail_peer(peer);
        }
    }

    fn fail_peer(&mut self, peer: PeerId) {
        match self.role {
            Role::Broadcaster { .. } => {
                self.teardown_watcher(&peer, SessionEvent::PeerFailed(peer.clone()));
            }
            Role::Watcher => {
                if self.retire_link(&peer, NegotiationState::Failed) {
                    self.live.store(false, Ordering::SeqCst);
                    let _ = self.events.send(SessionEvent::PeerFailed(peer));
                }
            }
        }
    }

    /// Removes one watcher link. The viewer count decrements exactly once
    /// per watcher, whatever the teardown path was.
    fn teardown_watcher(&mut self, watcher: &PeerId, event: SessionEvent) {
        if !self.retire_link(watcher, NegotiationState::Closed) {
            return;
        }
        let count = self.viewer_count.fetch_sub(1, Ordering::SeqCst) - 1;
        let _ = self.events.send(SessionEvent::ViewerCountChanged(count));
        let _ = self.events.send(event);
    }

    fn retire_link(&mut self, peer: &PeerId, terminal: NegotiationState) -> bool {
        let Some(mut link) = self.links.remove(peer) else {
            return false;
        };
        let _ = link.advance(terminal);
        self.link_view.remove(peer);

        let transport = link.transport();
        tokio::spawn(async move {
            let _ = transport.close().await;
        });
        true
    }

    /// Stop / leave: every owned link is closed before the loop exits.
    async fn shutdown(&mut self, announce: bool) {
        let is_broadcaster = matches!(self.role, Role::Broadcaster { .. });

        let peers: Vec<PeerId> = self.links.keys().cloned().collect();
        for peer in peers {
            if is_broadcaster {
                self.teardown_watcher(&peer, SessionEvent::PeerLeft(peer.clone()));
            } else {
                self.retire_link(&peer, NegotiationState::Closed);
            }
        }
        self.live.store(false, Ordering::SeqCst);

        if announce {
            let signal = if is_broadcaster {
                ClientSignal::StopStream {
                    stream: self.stream.clone(),
                }
            } else {
                ClientSignal::LeaveStream {
                    stream: self.stream.clone(),
                }
            };
            self.sink.send(signal).await;
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
