pub mod link;
pub mod media;
pub mod presence;
pub mod session;
pub mod transport;

pub use link::PeerLink;
pub use media::{LocalMedia, MediaCapture, MediaError};
pub use presence::{PresenceEvent, PresenceTracker};
pub use session::{
    BroadcastHandle, BroadcastSessionManager, MeshHandle, PeerSessionManager, SessionConfig,
    SessionEvent, SignalSink,
};
pub use transport::{
    PeerTransport, RtcTransport, RtcTransportFactory, TransportConfig, TransportEvent,
    TransportFactory,
};
