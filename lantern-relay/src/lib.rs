mod collab;
mod registry;
mod relay;
mod server;
mod ws;

pub use collab::{NoopNotifier, Notifier};
pub use registry::{JoinOutcome, RoomRegistry, StreamRegistry};
pub use relay::{RelayStore, SignalRelay};
pub use server::router;
pub use ws::ws_handler;
