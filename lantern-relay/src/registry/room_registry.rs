use lantern_core::{PeerId, RoomId};
use std::collections::{HashMap, HashSet};

/// room id -> member set. Mutated only through `SignalRelay` operations.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, HashSet<PeerId>>,
}

#[derive(Debug, Eq, PartialEq)]
pub enum JoinOutcome {
    /// First join: the members that were already present.
    Joined { existing: Vec<PeerId> },
    /// Re-join with the same peer id: membership unchanged.
    AlreadyMember,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, room: &RoomId, peer: &PeerId) -> JoinOutcome {
        let members = self.rooms.entry(room.clone()).or_default();
        if members.contains(peer) {
            return JoinOutcome::AlreadyMember;
        }

        let existing = members.iter().cloned().collect();
        members.insert(peer.clone());
        JoinOutcome::Joined { existing }
    }

    /// Removes the peer and returns the remaining members. Empty rooms are
    /// dropped immediately so a later join starts from a clean slate.
    pub fn leave(&mut self, room: &RoomId, peer: &PeerId) -> Vec<PeerId> {
        let Some(members) = self.rooms.get_mut(room) else {
            return Vec::new();
        };
        if !members.remove(peer) {
            return Vec::new();
        }

        let remaining: Vec<PeerId> = members.iter().cloned().collect();
        if remaining.is_empty() {
            self.rooms.remove(room);
        }
        remaining
    }

    pub fn members(&self, room: &RoomId) -> Vec<PeerId> {
        self.rooms
            .get(room)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn rooms_of(&self, peer: &PeerId) -> Vec<RoomId> {
        self.rooms
            .iter()
            .filter(|(_, members)| members.contains(peer))
            .map(|(room, _)| room.clone())
            .collect()
    }

    pub fn share_room(&self, a: &PeerId, b: &PeerId) -> bool {
        self.rooms
            .values()
            .any(|members| members.contains(a) && members.contains(b))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
