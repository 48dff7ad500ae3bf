use lantern_core::StreamId;

use crate::integration::create_relay;
use crate::utils::{start_broadcast, wait_until, watch_stream};

/// For N watcher joins and M teardowns, the viewer count is N - M at
/// quiescence, whatever mix of leave paths produced the M.
#[tokio::test]
async fn test_viewer_count_consistency() {
    let relay = create_relay();
    let stream = StreamId::from("live-1");

    let broadcaster = start_broadcast(&relay, &stream).await;
    assert_eq!(broadcaster.handle.stream(), &stream);
    assert!(broadcaster.handle.is_live());

    let polite = watch_stream(&relay, &stream);
    let abrupt = watch_stream(&relay, &stream);
    let loyal = watch_stream(&relay, &stream);

    let handle = broadcaster.handle.clone();
    assert!(
        wait_until(move || handle.viewer_count() == 3, 3000).await,
        "three watchers should be counted once each"
    );
    assert_eq!(broadcaster.handle.link_count(), 3);

    // Explicit leave.
    polite.handle.stop();
    let handle = broadcaster.handle.clone();
    assert!(wait_until(move || handle.viewer_count() == 2, 2000).await);

    // Relay-detected disconnect.
    relay.disconnect(&abrupt.peer_id);
    let handle = broadcaster.handle.clone();
    assert!(wait_until(move || handle.viewer_count() == 1, 2000).await);

    // The surviving watcher is still linked and still counted.
    assert!(broadcaster.handle.link_state(&loyal.peer_id).is_some());
    assert_eq!(broadcaster.handle.link_count(), 1);
    assert!(broadcaster.handle.is_live());
}
