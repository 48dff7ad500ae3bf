mod link;
mod peer;
mod room;
mod signaling;
mod stream;

pub use link::{InvalidTransition, LinkRole, NegotiationState};
pub use peer::PeerId;
pub use room::RoomId;
pub use signaling::{ClientSignal, IceServerConfig, ServerSignal};
pub use stream::StreamId;
