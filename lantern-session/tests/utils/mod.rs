mod mock_capture;
mod mock_transport;
mod sinks;

pub use harness::{MeshPeer, StreamPeer, join_mesh, start_broadcast, wait_until, watch_stream};
pub use mock_capture::{DeniedCapture, GrantedCapture};
pub use mock_transport::{MockTransport, MockTransportFactory};
pub use sinks::{RecordingSink, RelaySink};
