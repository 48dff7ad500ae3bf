use lantern_core::{ClientSignal, RoomId, ServerSignal};

use crate::integration::create_relay;
use crate::utils::TestPeer;

#[tokio::test]
async fn test_offer_forwarded_with_sender() {
    let relay = create_relay();
    let room = RoomId::from("r1");

    let mut a = TestPeer::connect(&relay);
    let mut b = TestPeer::connect(&relay);
    a.send(ClientSignal::JoinRoom { room: room.clone() });
    b.send(ClientSignal::JoinRoom { room: room.clone() });
    a.drain();
    b.drain();

    a.send(ClientSignal::Offer {
        target: b.peer_id.clone(),
        sdp: "v=0 offer".into(),
    });

    let ServerSignal::Offer { sender, sdp } = b.recv().await else {
        panic!("offer should reach the target");
    };
    assert_eq!(sender, a.peer_id);
    assert_eq!(sdp, "v=0 offer");

    b.send(ClientSignal::Answer {
        target: a.peer_id.clone(),
        sdp: "v=0 answer".into(),
    });

    let ServerSignal::Answer { sender, sdp } = a.recv().await else {
        panic!("answer should reach the initiator");
    };
    assert_eq!(sender, b.peer_id);
    assert_eq!(sdp, "v=0 answer");

    b.send(ClientSignal::IceCandidate {
        target: a.peer_id.clone(),
        candidate: "candidate:0 1 udp".into(),
    });
    assert!(matches!(a.recv().await, ServerSignal::IceCandidate { .. }));
}
