use lantern_core::{PeerId, StreamId};

/// What a session manager reports to its caller; the UI layer turns these
/// into user-visible state ("participant disconnected", viewer badges).
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SessionEvent {
    PeerConnected(PeerId),
    PeerLeft(PeerId),
    PeerFailed(PeerId),
    ViewerCountChanged(usize),
    StreamEnded(StreamId),
}
