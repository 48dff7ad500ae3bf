mod room_registry;
mod stream_registry;

pub use room_registry::{JoinOutcome, RoomRegistry};
pub use stream_registry::StreamRegistry;
