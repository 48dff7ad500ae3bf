pub mod model;

pub use model::{
    ClientSignal, IceServerConfig, InvalidTransition, LinkRole, NegotiationState, PeerId, RoomId,
    ServerSignal, StreamId,
};
