use lantern_core::{LinkRole, NegotiationState, RoomId};
use lantern_session::session::SessionEvent;

use crate::integration::create_relay;
use crate::utils::{join_mesh, wait_until};

/// Two clients join a room; the tie-break picks one initiator; offer and
/// answer are relayed; both links reach Connected. When the responder's
/// connection dies, the initiator is left with zero links.
#[tokio::test]
async fn test_two_peers_full_negotiation() {
    let relay = create_relay();
    let room = RoomId::from("r1");

    let a = join_mesh(&relay, &room);
    let b = join_mesh(&relay, &room);

    let (mut initiator, mut responder) = if a.peer_id < b.peer_id { (a, b) } else { (b, a) };

    // The smaller id initiates; the larger answers.
    assert!(
        wait_until(
            || {
                initiator.handle.link_state(&responder.peer_id)
                    == Some((LinkRole::Initiator, NegotiationState::AnswerReceived))
            },
            2000,
        )
        .await,
        "initiator should apply the answer"
    );
    assert!(
        wait_until(
            || {
                responder.handle.link_state(&initiator.peer_id)
                    == Some((LinkRole::Responder, NegotiationState::AnswerSent))
            },
            2000,
        )
        .await,
        "responder should send an answer"
    );

    // The mock descriptions made it across the relay verbatim.
    let initiator_transport = initiator
        .factory
        .transport_to(&responder.peer_id)
        .expect("initiator created a transport");
    let responder_transport = responder
        .factory
        .transport_to(&initiator.peer_id)
        .expect("responder created a transport");
    assert_eq!(
        responder_transport.remote_offer.lock().unwrap().as_deref(),
        Some(format!("offer-for-{}", responder.peer_id).as_str())
    );
    assert_eq!(
        initiator_transport.remote_answer.lock().unwrap().as_deref(),
        Some(format!("answer-for-{}", initiator.peer_id).as_str())
    );

    // Transport-level connectivity promotes both links to Connected.
    initiator_transport.establish().await;
    responder_transport.establish().await;

    for (peer, other) in [
        (&initiator.handle, &responder.peer_id),
        (&responder.handle, &initiator.peer_id),
    ] {
        let handle = peer.clone();
        let other = other.clone();
        assert!(
            wait_until(
                move || {
                    handle
                        .link_state(&other)
                        .is_some_and(|(_, state)| state == NegotiationState::Connected)
                },
                2000,
            )
            .await,
            "link should reach Connected"
        );
    }

    // Responder drops off the relay; the initiator tears its link down.
    relay.disconnect(&responder.peer_id);

    let handle = initiator.handle.clone();
    assert!(
        wait_until(move || handle.link_count() == 0, 2000).await,
        "initiator should hold zero links after the peer left"
    );
    let events = initiator.drain_events();
    assert!(events.contains(&SessionEvent::PeerConnected(responder.peer_id.clone())));
    assert!(events.contains(&SessionEvent::PeerLeft(responder.peer_id.clone())));

    let _ = responder.drain_events();
}
