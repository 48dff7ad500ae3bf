mod peer_transport;
mod rtc_transport;
mod transport_config;
mod transport_event;

pub use peer_transport::{PeerTransport, TransportFactory};
pub use rtc_transport::{RtcTransport, RtcTransportFactory};
pub use transport_config::TransportConfig;
pub use transport_event::TransportEvent;
