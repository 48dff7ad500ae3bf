use crate::collab::{NoopNotifier, Notifier};
use crate::registry::JoinOutcome;
use crate::relay::store::RelayStore;
use dashmap::DashMap;
use lantern_core::{ClientSignal, PeerId, RoomId, ServerSignal, StreamId};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct RelayInner {
    /// Outbound delivery channels, one per registered connection.
    peers: DashMap<PeerId, mpsc::UnboundedSender<ServerSignal>>,
    /// Room and stream membership; every mutation goes through `handle`,
    /// `register` or `disconnect`.
    store: Mutex<RelayStore>,
    notifier: Arc<dyn Notifier>,
}

/// Stateless-per-message rendezvous service. Tracks which rooms and streams
/// each connection belongs to and forwards signaling envelopes; no media and
/// no payload inspection.
#[derive(Clone)]
pub struct SignalRelay {
    inner: Arc<RelayInner>,
}

impl SignalRelay {
    pub fn new() -> Self {
        Self::with_notifier(Arc::new(NoopNotifier))
    }

    pub fn with_notifier(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                peers: DashMap::new(),
                store: Mutex::new(RelayStore::new()),
                notifier,
            }),
        }
    }

    /// Registers a connection's outbound channel. Must precede any `handle`
    /// call for this peer.
    pub fn register(&self, peer: PeerId, tx: mpsc::UnboundedSender<ServerSignal>) {
        self.inner.peers.insert(peer, tx);
    }

    /// Single dispatch entry for everything a client sends.
    pub fn handle(&self, sender: &PeerId, signal: ClientSignal) {
        match signal {
            ClientSignal::JoinRoom { room } => self.join_room(sender, &room),
            ClientSignal::LeaveRoom { room } => self.leave_room(sender, &room),
            ClientSignal::Offer { target, sdp } => self.relay_unicast(
                sender,
                &target,
                ServerSignal::Offer {
                    sender: sender.clone(),
                    sdp,
                },
            ),
            ClientSignal::Answer { target, sdp } => self.relay_unicast(
                sender,
                &target,
                ServerSignal::Answer {
                    sender: sender.clone(),
                    sdp,
                },
            ),
            ClientSignal::IceCandidate { target, candidate } => self.relay_unicast(
                sender,
                &target,
                ServerSignal::IceCandidate {
                    sender: sender.clone(),
                    candidate,
                },
            ),
            ClientSignal::StartStream { stream } => self.start_stream(sender, &stream),
            ClientSignal::StopStream { stream } => self.stop_stream(sender, &stream),
            ClientSignal::WatchStream { stream } => self.watch_stream(sender, &stream),
            ClientSignal::LeaveStream { stream } => self.leave_stream(sender, &stream),
        }
    }

    /// Implicit leave of every room and stream this connection touched.
    /// Cascades exactly like explicit leave/stop and never fails.
    pub fn disconnect(&self, peer: &PeerId) {
        let (rooms, owned, watched) = {
            let store = self.store();
            (
                store.rooms.rooms_of(peer),
                store.streams.streams_owned_by(peer),
                store.streams.streams_watched_by(peer),
            )
        };

        for room in rooms {
            self.leave_room(peer, &room);
        }
        for stream in owned {
            self.end_stream(peer, &stream, true);
        }
        for (stream, _broadcaster) in watched {
            self.leave_stream(peer, &stream);
        }

        self.inner.peers.remove(peer);
        info!(%peer, "connection closed");
    }

    pub fn is_registered(&self, peer: &PeerId) -> bool {
        self.inner.peers.contains_key(peer)
    }

    fn store(&self) -> MutexGuard<'_, RelayStore> {
        // A poisoning panic inside the relay would already have taken the
        // process down; recover the guard rather than cascade.
        self.inner
            .store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn send(&self, peer: &PeerId, signal: ServerSignal) {
        match self.inner.peers.get(peer) {
            Some(tx) => {
                if tx.send(signal).is_err() {
                    warn!(%peer, "outbound channel closed before disconnect");
                }
            }
            // The target raced a disconnect; best-effort semantics say drop.
            None => debug!(%peer, "dropping signal for unregistered peer"),
        }
    }

    fn join_room(&self, sender: &PeerId, room: &RoomId) {
        let outcome = {
            let mut store = self.store();
            store.rooms.join(room, sender)
        };

        match outcome {
            JoinOutcome::Joined { existing } => {
                info!(peer = %sender, %room, members = existing.len(), "peer joined room");
                for member in &existing {
                    self.send(
                        member,
                        ServerSignal::PresenceJoined {
                            room: room.clone(),
                            peer: sender.clone(),
                        },
                    );
                }
                self.send(
                    sender,
                    ServerSignal::RoomJoined {
                        room: room.clone(),
                        members: existing,
                    },
                );
            }
            JoinOutcome::AlreadyMember => {
                debug!(peer = %sender, %room, "re-join ignored");
            }
        }
    }

    fn leave_room(&self, sender: &PeerId, room: &RoomId) {
        let remaining = {
            let mut store = self.store();
            store.rooms.leave(room, sender)
        };

        for member in remaining {
            self.send(
                &member,
                ServerSignal::PresenceLeft {
                    room: room.clone(),
                    peer: sender.clone(),
                },
            );
        }
    }

    /// Forwards a unicast envelope iff sender and target currently share a
    /// room or a broadcast session. Misses are dropped, never queued.
    fn relay_unicast(&self, sender: &PeerId, target: &PeerId, signal: ServerSignal) {
        let routable = {
            let store = self.store();
            store.share_scope(sender, target)
        };

        if !routable {
            debug!(%sender, %target, "dropping unicast outside shared scope");
            return;
        }
        self.send(target, signal);
    }

    fn start_stream(&self, sender: &PeerId, stream: &StreamId) {
        let started = {
            let mut store = self.store();
            store.streams.start(stream, sender)
        };

        if started {
            info!(broadcaster = %sender, %stream, "stream live");
        } else {
            debug!(broadcaster = %sender, %stream, "start ignored, stream id taken");
        }
    }

    fn stop_stream(&self, sender: &PeerId, stream: &StreamId) {
        self.end_stream(sender, stream, false);
    }

    fn end_stream(&self, broadcaster: &PeerId, stream: &StreamId, abnormal: bool) {
        let watchers = {
            let mut store = self.store();
            store.streams.stop(stream, broadcaster)
        };

        let Some(watchers) = watchers else {
            debug!(%broadcaster, %stream, "stop ignored, not the owner of a live stream");
            return;
        };

        info!(%broadcaster, %stream, watchers = watchers.len(), abnormal, "stream ended");
        for watcher in watchers {
            self.send(
                &watcher,
                ServerSignal::StreamEnded {
                    stream: stream.clone(),
                },
            );
            if abnormal {
                let notifier = self.inner.notifier.clone();
                let stream = stream.clone();
                tokio::spawn(async move {
                    notifier.stream_ended_abnormally(watcher, stream).await;
                });
            }
        }
    }

    fn watch_stream(&self, sender: &PeerId, stream: &StreamId) {
        let broadcaster = {
            let mut store = self.store();
            store.streams.watch(stream, sender)
        };

        match broadcaster {
            Some(broadcaster) => {
                debug!(watcher = %sender, %stream, "watcher registered");
                self.send(
                    &broadcaster,
                    ServerSignal::WatcherJoined {
                        watcher: sender.clone(),
                    },
                );
            }
            None => debug!(watcher = %sender, %stream, "dropping watch of dead stream"),
        }
    }

    fn leave_stream(&self, sender: &PeerId, stream: &StreamId) {
        let broadcaster = {
            let mut store = self.store();
            store.streams.leave(stream, sender)
        };

        if let Some(broadcaster) = broadcaster {
            self.send(
                &broadcaster,
                ServerSignal::WatcherLeft {
                    watcher: sender.clone(),
                },
            );
        }
    }
}

impl Default for SignalRelay {
    fn default() -> Self {
        Self::new()
    }
}
