//! `WebSocket` handler for incremental movie search.
//!
//! Clients connect to `GET /movie?session=<token>` and send text frames
//! of the form `{"query": "...", "nextPage": false}`. Each non-empty
//! result batch is pushed back as one text frame holding a JSON array of
//! movies. Errors are pushed as plain-text frames and never close the
//! connection, except for an invalid session, which is reported and
//! then closed.
//!
//! Each connection owns its own [`SearchBridge`]; it is dropped (and the
//! search worker with it) as soon as the client goes away.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use marquee_content::MovieContent;
use marquee_types::Movie;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::bridge::{ResultsCallback, SearchBridge};
use crate::handlers::{SessionQuery, resolve_session};
use crate::state::AppState;

/// Upgrade an HTTP request to a search `WebSocket`.
///
/// # Route
///
/// `GET /movie?session=<token>`
pub async fn ws_movie(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    query: Result<Query<SessionQuery>, QueryRejection>,
) -> impl IntoResponse {
    let resolved = resolve_session(&state, query).await;
    let page_size = state.search_page_size;
    ws.on_upgrade(move |socket| async move {
        match resolved {
            Ok(content) => handle_ws(socket, content, page_size).await,
            Err(e) => reject(socket, &e.to_string()).await,
        }
    })
}

/// Tell the client why it cannot search, then close.
async fn reject(mut socket: WebSocket, reason: &str) {
    debug!(reason, "Rejecting search socket");
    if socket.send(Message::Text(reason.to_owned().into())).await.is_ok() {
        let _ = socket.send(Message::Close(None)).await;
    }
}

/// Forwards relayed batches into the connection's outbound queue.
struct SocketCallback {
    outbound: mpsc::UnboundedSender<String>,
}

impl ResultsCallback for SocketCallback {
    fn on_results(&mut self, movies: &[Movie]) {
        let frame = serde_json::to_string(movies)
            .unwrap_or_else(|e| format!("Couldn't serialize result JSON! Error: {e}"));
        if self.outbound.send(frame).is_err() {
            debug!("Search socket closed before results were delivered");
        }
    }

    fn on_error(&mut self, message: &str) {
        if self.outbound.send(message.to_owned()).is_err() {
            debug!("Search socket closed before error was delivered");
        }
    }
}

/// Handle the `WebSocket` lifecycle: route client frames into the bridge
/// and push relayed batches back out.
async fn handle_ws(mut socket: WebSocket, content: MovieContent, page_size: u32) {
    debug!(backend = content.backend_name(), "Search socket connected");

    let (outbound, mut frames) = mpsc::unbounded_channel();
    let bridge = SearchBridge::new(content, page_size, SocketCallback { outbound });

    loop {
        tokio::select! {
            // Push a relayed result batch or error to the client.
            frame = frames.recv() => {
                let Some(text) = frame else {
                    debug!("Search relay stopped, closing socket");
                    return;
                };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    debug!("Search socket disconnected (send failed)");
                    return;
                }
            }
            // Handle a frame from the client.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = bridge.submit(text.as_str()) {
                            warn!(error = %e, "Rejected search message");
                            if socket.send(Message::Text(e.to_string().into())).await.is_err() {
                                debug!("Search socket disconnected (send failed)");
                                return;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Search socket disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("Search socket disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("Search socket error: {e}");
                        return;
                    }
                    _ => {
                        // Binary and pong frames carry nothing for search.
                    }
                }
            }
        }
    }
}
