use lantern_core::StreamId;
use lantern_session::session::SessionEvent;

use crate::integration::create_relay;
use crate::utils::{start_broadcast, wait_until, watch_stream};

#[tokio::test]
async fn test_stop_stream_tears_down() {
    let relay = create_relay();
    let stream = StreamId::from("live-1");

    let mut broadcaster = start_broadcast(&relay, &stream).await;
    let mut first = watch_stream(&relay, &stream);
    let mut second = watch_stream(&relay, &stream);

    let handle = broadcaster.handle.clone();
    assert!(wait_until(move || handle.viewer_count() == 2, 3000).await);

    broadcaster.handle.stop();

    // Broadcaster side: every watcher link closed, count back to zero.
    let handle = broadcaster.handle.clone();
    assert!(wait_until(move || handle.link_count() == 0, 2000).await);
    let handle = broadcaster.handle.clone();
    assert!(wait_until(move || handle.viewer_count() == 0, 2000).await);
    assert!(!broadcaster.handle.is_live());

    for watcher in [&first, &second] {
        let transport = broadcaster
            .factory
            .transport_to(&watcher.peer_id)
            .expect("broadcaster transport existed");
        let transport_for_wait = transport.clone();
        assert!(
            wait_until(move || transport_for_wait.closed(), 2000).await,
            "stop must close every watcher transport"
        );
    }

    // Watcher side: StreamEnded arrived and everything is torn down.
    for watcher in [&mut first, &mut second] {
        let handle = watcher.handle.clone();
        assert!(wait_until(move || handle.link_count() == 0, 2000).await);
        assert!(!watcher.handle.is_live());
        assert!(
            watcher
                .drain_events()
                .contains(&SessionEvent::StreamEnded(stream.clone()))
        );
    }

    let _ = broadcaster.drain_events();
}
