use crate::registry::{RoomRegistry, StreamRegistry};
use lantern_core::PeerId;

/// All mutable signaling state of one relay instance. Owned by `SignalRelay`
/// behind its mutex and never reachable any other way, so several relays can
/// coexist in one process.
#[derive(Debug, Default)]
pub struct RelayStore {
    pub rooms: RoomRegistry,
    pub streams: StreamRegistry,
}

impl RelayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether two peers currently share a routing scope: a room, or a
    /// broadcaster/watcher pairing on a live stream.
    pub fn share_scope(&self, a: &PeerId, b: &PeerId) -> bool {
        self.rooms.share_room(a, b) || self.streams.share_session(a, b)
    }
}
