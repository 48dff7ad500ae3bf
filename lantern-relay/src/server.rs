use crate::relay::SignalRelay;
use crate::ws::ws_handler;
use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};

/// Builds the relay's HTTP surface: one WebSocket route, fully open CORS.
/// Signaling identities are whatever the connection layer provides; there is
/// no further authentication here.
pub fn router(relay: SignalRelay) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws/{peer_id}", get(ws_handler))
        .layer(cors)
        .with_state(relay)
}
