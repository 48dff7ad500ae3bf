use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use crate::model::stream::StreamId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// Envelopes travelling client -> relay.
///
/// Deserialization enforces the required fields per kind: an `Offer` without
/// a `target` is rejected at the relay boundary before any routing happens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d")]
pub enum ClientSignal {
    JoinRoom {
        room: RoomId,
    },
    LeaveRoom {
        room: RoomId,
    },
    Offer {
        target: PeerId,
        sdp: String,
    },
    Answer {
        target: PeerId,
        sdp: String,
    },
    IceCandidate {
        target: PeerId,
        candidate: String,
    },
    StartStream {
        stream: StreamId,
    },
    StopStream {
        stream: StreamId,
    },
    WatchStream {
        stream: StreamId,
    },
    LeaveStream {
        stream: StreamId,
    },
}

/// Envelopes travelling relay -> client. Unicast payloads are forwarded
/// verbatim with the sender id attached; the relay never looks inside `sdp`
/// or `candidate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d")]
pub enum ServerSignal {
    /// Reply to a first-time `JoinRoom`: the members already present, so the
    /// joiner knows whom to negotiate with.
    RoomJoined {
        room: RoomId,
        members: Vec<PeerId>,
    },
    PresenceJoined {
        room: RoomId,
        peer: PeerId,
    },
    PresenceLeft {
        room: RoomId,
        peer: PeerId,
    },
    Offer {
        sender: PeerId,
        sdp: String,
    },
    Answer {
        sender: PeerId,
        sdp: String,
    },
    IceCandidate {
        sender: PeerId,
        candidate: String,
    },
    /// To the broadcaster: a watcher announced intent to watch its stream.
    WatcherJoined {
        watcher: PeerId,
    },
    /// To the broadcaster: a watcher left or its connection dropped.
    WatcherLeft {
        watcher: PeerId,
    },
    StreamEnded {
        stream: StreamId,
    },
}
