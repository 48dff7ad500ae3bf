use lantern_core::{ClientSignal, RoomId, ServerSignal};

use crate::integration::create_relay;
use crate::utils::TestPeer;

#[tokio::test]
async fn test_presence_emitted_to_existing_members() {
    let relay = create_relay();
    let room = RoomId::from("r1");

    let mut a = TestPeer::connect(&relay);
    let mut b = TestPeer::connect(&relay);

    a.send(ClientSignal::JoinRoom { room: room.clone() });
    a.recv().await; // RoomJoined

    b.send(ClientSignal::JoinRoom { room: room.clone() });

    let ServerSignal::PresenceJoined { room: in_room, peer } = a.recv().await else {
        panic!("existing member should see the new joiner");
    };
    assert_eq!(in_room, room);
    assert_eq!(peer, b.peer_id);

    // The joiner itself gets the member list, not its own presence echo.
    assert!(matches!(b.recv().await, ServerSignal::RoomJoined { .. }));
    b.expect_silence().await;
}
