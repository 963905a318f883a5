//! WebSocket upgrade and per-connection handler. Each viewer gets its own push loop.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::Ordering;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::proto::{ServerEvent, ViewerRequest};
use crate::sensors::SensorSource;
use crate::state::AppState;

// Small: a viewer that stops reading only stalls its own loop.
const EVENT_QUEUE: usize = 16;

pub async fn ws_handler<S: SensorSource>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<S>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn encode(ev: &ServerEvent) -> Result<Message, TransportError> {
    Ok(Message::Text(ev.to_json()?))
}

async fn handle_socket<S: SensorSource>(socket: WebSocket, state: AppState<S>) {
    let now = state.viewers.fetch_add(1, Ordering::Relaxed) + 1;
    info!("viewer connected ({now} active)");

    // Ensure we decrement on disconnect (drop).
    struct ViewerGuard<S>(AppState<S>);
    impl<S> Drop for ViewerGuard<S> {
        fn drop(&mut self) {
            let left = self.0.viewers.fetch_sub(1, Ordering::Relaxed) - 1;
            info!("viewer disconnected ({left} active)");
        }
    }
    let _guard = ViewerGuard(state.clone());

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(EVENT_QUEUE);
    let session = state.broadcaster.spawn_viewer(tx);

    let writer = tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            let msg = match encode(&ev) {
                Ok(m) => m,
                Err(e) => {
                    warn!("dropping event: {e}");
                    continue;
                }
            };
            if sink.send(msg).await.is_err() {
                // dropping rx closes the push loop's channel
                break;
            }
        }
    });

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => match ViewerRequest::parse(&text) {
                Some(ViewerRequest::StartTracking) => {
                    info!("viewer started a tracking capture")
                }
                None => debug!("ignoring viewer message: {text:?}"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("viewer socket error: {e}");
                break;
            }
        }
    }

    drop(session);
    writer.abort();
}
