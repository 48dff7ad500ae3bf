use lantern_core::{ClientSignal, ServerSignal, StreamId};

use crate::integration::create_relay;
use crate::utils::TestPeer;

#[tokio::test]
async fn test_watcher_leave_notifies_broadcaster() {
    let relay = create_relay();
    let stream = StreamId::from("live-1");

    let mut broadcaster = TestPeer::connect(&relay);
    broadcaster.send(ClientSignal::StartStream {
        stream: stream.clone(),
    });

    let polite = TestPeer::connect(&relay);
    let abrupt = TestPeer::connect(&relay);
    for watcher in [&polite, &abrupt] {
        watcher.send(ClientSignal::WatchStream {
            stream: stream.clone(),
        });
        broadcaster.recv().await; // WatcherJoined
    }

    polite.send(ClientSignal::LeaveStream {
        stream: stream.clone(),
    });
    let ServerSignal::WatcherLeft { watcher } = broadcaster.recv().await else {
        panic!("broadcaster should learn about the explicit leave");
    };
    assert_eq!(watcher, polite.peer_id);

    // A dropped connection reports the same way.
    abrupt.disconnect();
    let ServerSignal::WatcherLeft { watcher } = broadcaster.recv().await else {
        panic!("broadcaster should learn about the dropped watcher");
    };
    assert_eq!(watcher, abrupt.peer_id);

    broadcaster.expect_silence().await;
}
