use lantern_core::{ClientSignal, RoomId, ServerSignal};

use crate::integration::create_relay;
use crate::utils::TestPeer;

#[tokio::test]
async fn test_disconnect_cleans_every_room() {
    let relay = create_relay();
    let lounge = RoomId::from("lounge");
    let games = RoomId::from("games");

    let mut wanderer = TestPeer::connect(&relay);
    let mut lounge_peer = TestPeer::connect(&relay);
    let mut games_peer = TestPeer::connect(&relay);

    wanderer.send(ClientSignal::JoinRoom { room: lounge.clone() });
    wanderer.send(ClientSignal::JoinRoom { room: games.clone() });
    lounge_peer.send(ClientSignal::JoinRoom { room: lounge.clone() });
    games_peer.send(ClientSignal::JoinRoom { room: games.clone() });

    lounge_peer.drain();
    games_peer.drain();
    wanderer.drain();

    wanderer.disconnect();

    let ServerSignal::PresenceLeft { room, peer } = lounge_peer.recv().await else {
        panic!("lounge member should see the departure");
    };
    assert_eq!(room, lounge);
    assert_eq!(peer, wanderer.peer_id);

    let ServerSignal::PresenceLeft { room, peer } = games_peer.recv().await else {
        panic!("games member should see the departure");
    };
    assert_eq!(room, games);
    assert_eq!(peer, wanderer.peer_id);

    assert!(!relay.is_registered(&wanderer.peer_id));
    assert!(relay.is_registered(&lounge_peer.peer_id));
}
