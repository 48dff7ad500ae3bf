use lantern_core::{PeerId, RoomId, ServerSignal};
use std::collections::HashSet;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PresenceEvent {
    Joined(PeerId),
    Left(PeerId),
}

/// Turns relay-level signals for one room into deduplicated join/leave
/// events: seeds from the member list, ignores the local peer, suppresses
/// duplicate joins and leaves for peers it never saw.
#[derive(Debug)]
pub struct PresenceTracker {
    room: RoomId,
    local: PeerId,
    members: HashSet<PeerId>,
}

impl PresenceTracker {
    pub fn new(room: RoomId, local: PeerId) -> Self {
        Self {
            room,
            local,
            members: HashSet::new(),
        }
    }

    pub fn observe(&mut self, signal: &ServerSignal) -> Vec<PresenceEvent> {
        match signal {
            ServerSignal::RoomJoined { room, members } if room == &self.room => members
                .iter()
                .filter(|peer| *peer != &self.local && self.members.insert((*peer).clone()))
                .map(|peer| PresenceEvent::Joined(peer.clone()))
                .collect(),
            ServerSignal::PresenceJoined { room, peer } if room == &self.room => {
                if peer == &self.local || !self.members.insert(peer.clone()) {
                    return Vec::new();
                }
                vec![PresenceEvent::Joined(peer.clone())]
            }
            ServerSignal::PresenceLeft { room, peer } if room == &self.room => {
                if !self.members.remove(peer) {
                    return Vec::new();
                }
                vec![PresenceEvent::Left(peer.clone())]
            }
            _ => Vec::new(),
        }
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.members.contains(peer)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}
