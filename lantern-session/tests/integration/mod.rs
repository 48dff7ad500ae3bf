
use lantern_relay::SignalRelay;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_relay() -> SignalRelay {
    init_tracing();
    SignalRelay::new()
}
