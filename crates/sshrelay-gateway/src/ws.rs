//! WS channel plumbing: upgrade, per-channel inbound loop, single outbound
//! writer task, and deterministic teardown on every exit path.

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use sshrelay_core::config::{MAX_PAYLOAD_BYTES, OUTBOUND_QUEUE};
use sshrelay_protocol::{ActionMessage, Outbound};
use sshrelay_shell::PtyRequest;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::app::AppState;
use crate::session::{Session, SessionState};

/// Axum handler — upgrades HTTP to WebSocket at GET /ssh-stream.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| run_channel(socket, state))
}

/// Per-channel event loop — lives for the entire session.
async fn run_channel(socket: WebSocket, state: Arc<AppState>) {
    let session_id = state.registry.insert();
    info!(session_id = %session_id, "channel accepted");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Outbound>(OUTBOUND_QUEUE);

    // Single writer task: everything outbound (session responses and pump
    // output) funnels through here, one JSON object per frame. It ends when
    // the last sender is dropped and hands the sink back for the close frame.
    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let json = serde_json::to_string(&message).unwrap_or_default();
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        sink
    });

    let pty = PtyRequest {
        term: state.config.ssh.term.clone(),
        cols: state.config.ssh.cols,
        rows: state.config.ssh.rows,
    };
    let mut session = Session::new(session_id.clone(), Arc::clone(&state.connector), pty, tx);

    // Set when a protocol violation makes the channel unusable.
    let mut fatal: Option<(u16, &'static str)> = None;

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if text.len() > MAX_PAYLOAD_BYTES {
                    warn!(session_id = %session_id, size = text.len(), "payload too large");
                    fatal = Some((1009, "payload too large"));
                    break;
                }
                match serde_json::from_str::<ActionMessage>(&text) {
                    Ok(message) => {
                        session.dispatch(message).await;
                        if session.state() == SessionState::Connected {
                            state.registry.mark_connected(&session_id);
                        }
                    }
                    Err(e) => {
                        warn!(session_id = %session_id, error = %e, "malformed message");
                        fatal = Some((1003, "malformed message"));
                        break;
                    }
                }
            }
            Ok(Message::Close(_)) => break,
            // ping/pong are answered by the protocol layer; binary is ignored
            Ok(_) => {}
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "channel error");
                break;
            }
        }
    }

    // Teardown order matters: pump first, then the shell handle, then the
    // socket, then the registry entry — exactly once on every exit path.
    session.teardown().await;
    drop(session);

    if let Ok(mut sink) = writer.await {
        let (code, reason) = fatal.unwrap_or((1000, "session closed"));
        let _ = sink
            .send(Message::Close(Some(CloseFrame {
                code,
                reason: reason.into(),
            })))
            .await;
    }

    state.registry.remove(&session_id);
    info!(session_id = %session_id, "channel closed");
}
