use lantern_core::{ClientSignal, RoomId, ServerSignal};

use crate::integration::create_relay;
use crate::utils::TestPeer;

#[tokio::test]
async fn test_join_returns_member_list() {
    let relay = create_relay();
    let room = RoomId::from("r1");

    let mut first = TestPeer::connect(&relay);
    first.send(ClientSignal::JoinRoom { room: room.clone() });

    let ServerSignal::RoomJoined { members, .. } = first.recv().await else {
        panic!("first joiner should receive RoomJoined");
    };
    assert!(members.is_empty(), "first joiner sees an empty room");

    let mut second = TestPeer::connect(&relay);
    second.send(ClientSignal::JoinRoom { room: room.clone() });

    let ServerSignal::RoomJoined { room: joined, members } = second.recv().await else {
        panic!("second joiner should receive RoomJoined");
    };
    assert_eq!(joined, room);
    assert_eq!(members, vec![first.peer_id.clone()]);
}
