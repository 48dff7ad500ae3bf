mod broadcast;
mod mesh;
mod negotiation;
mod session_config;
mod session_event;
mod signal_sink;

pub use broadcast::{BroadcastHandle, BroadcastSessionManager};
pub use mesh::{MeshHandle, PeerSessionManager};
pub use session_config::SessionConfig;
pub use session_event::SessionEvent;
pub use signal_sink::SignalSink;
