use crate::relay::SignalRelay;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use lantern_core::{ClientSignal, PeerId};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(peer_id): Path<String>,
    State(relay): State<SignalRelay>,
) -> Response {
    let Ok(peer_id) = peer_id.parse::<PeerId>() else {
        return (StatusCode::BAD_REQUEST, "invalid peer id").into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, peer_id, relay))
        .into_response()
}

async fn handle_socket(socket: WebSocket, peer_id: PeerId, relay: SignalRelay) {
    info!(peer = %peer_id, "new signaling connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    relay.register(peer_id.clone(), tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(signal) = rx.recv().await {
            match serde_json::to_string(&signal) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("failed to serialize signal: {e}"),
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let relay = relay.clone();
        let peer_id = peer_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientSignal>(&text) {
                        Ok(signal) => relay.handle(&peer_id, signal),
                        // Malformed envelope: log and keep the connection.
                        Err(e) => warn!(peer = %peer_id, "invalid signal: {e}"),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    relay.disconnect(&peer_id);
}
