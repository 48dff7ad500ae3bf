use lantern_core::{ClientSignal, PeerId, RoomId};

use crate::integration::create_relay;
use crate::utils::TestPeer;

#[tokio::test]
async fn test_unknown_target_is_dropped() {
    let relay = create_relay();

    let mut a = TestPeer::connect(&relay);
    a.send(ClientSignal::JoinRoom {
        room: RoomId::from("r1"),
    });
    a.drain();

    a.send(ClientSignal::Offer {
        target: PeerId::new(),
        sdp: "v=0".into(),
    });

    a.expect_silence().await;
}
