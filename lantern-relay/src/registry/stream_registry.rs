use lantern_core::{PeerId, StreamId};
use std::collections::{HashMap, HashSet};

#[derive(Debug)]
struct BroadcastEntry {
    broadcaster: PeerId,
    watchers: HashSet<PeerId>,
}

/// stream id -> broadcaster + watcher set. A stream is live exactly while its
/// entry exists; stop and broadcaster disconnect both remove it.
#[derive(Debug, Default)]
pub struct StreamRegistry {
    streams: HashMap<StreamId, BroadcastEntry>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a live stream. Returns false if the stream id is already
    /// taken (a restart by the same broadcaster is also a no-op).
    pub fn start(&mut self, stream: &StreamId, broadcaster: &PeerId) -> bool {
        if self.streams.contains_key(stream) {
            return false;
        }
        self.streams.insert(
            stream.clone(),
            BroadcastEntry {
                broadcaster: broadcaster.clone(),
                watchers: HashSet::new(),
            },
        );
        true
    }

    /// Tears the stream down and returns its watchers so the relay can notify
    /// them. Only the owning broadcaster may stop a stream.
    pub fn stop(&mut self, stream: &StreamId, broadcaster: &PeerId) -> Option<Vec<PeerId>> {
        match self.streams.get(stream) {
            Some(entry) if &entry.broadcaster == broadcaster => self
                .streams
                .remove(stream)
                .map(|entry| entry.watchers.into_iter().collect()),
            _ => None,
        }
    }

    /// Adds a watcher to a live stream and returns the broadcaster to notify.
    /// Watching twice does not register twice.
    pub fn watch(&mut self, stream: &StreamId, watcher: &PeerId) -> Option<PeerId> {
        let entry = self.streams.get_mut(stream)?;
        if &entry.broadcaster == watcher || !entry.watchers.insert(watcher.clone()) {
            return None;
        }
        Some(entry.broadcaster.clone())
    }

    /// Removes a watcher and returns the broadcaster to notify.
    pub fn leave(&mut self, stream: &StreamId, watcher: &PeerId) -> Option<PeerId> {
        let entry = self.streams.get_mut(stream)?;
        if !entry.watchers.remove(watcher) {
            return None;
        }
        Some(entry.broadcaster.clone())
    }

    pub fn streams_owned_by(&self, peer: &PeerId) -> Vec<StreamId> {
        self.streams
            .iter()
            .filter(|(_, entry)| &entry.broadcaster == peer)
            .map(|(stream, _)| stream.clone())
            .collect()
    }

    /// Streams the peer currently watches, with their broadcasters.
    pub fn streams_watched_by(&self, peer: &PeerId) -> Vec<(StreamId, PeerId)> {
        self.streams
            .iter()
            .filter(|(_, entry)| entry.watchers.contains(peer))
            .map(|(stream, entry)| (stream.clone(), entry.broadcaster.clone()))
            .collect()
    }

    pub fn watchers(&self, stream: &StreamId) -> Vec<PeerId> {
        self.streams
            .get(stream)
            .map(|entry| entry.watchers.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Broadcaster and watcher of the same live stream may exchange unicast
    /// signaling, in either direction.
    pub fn share_session(&self, a: &PeerId, b: &PeerId) -> bool {
        self.streams.values().any(|entry| {
            (&entry.broadcaster == a && entry.watchers.contains(b))
                || (&entry.broadcaster == b && entry.watchers.contains(a))
        })
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }
}
