//! Session gate: awaits the first frame after the upgrade, validates it,
//! and wires decoder → resolver → bridge.
//!
//! Every rejection closes the session silently — nothing protocol-shaped is
//! ever written in response to an unauthenticated or malformed request, so a
//! rejected handshake looks like an idle connection from the outside.

use crate::bridge;
use crate::error::{ServerError, ServerResult};
use crate::server::AppState;
use axum::extract::ws::{Message, WebSocket};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;
use veil_proto::decode;

/// Default wait for the first (header) frame.
pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Drive one upgraded session to completion. Outcomes are logged, never
/// surfaced to the peer.
pub async fn accept(ws: WebSocket, state: AppState) {
    match session(ws, &state).await {
        Ok(()) => debug!("session closed"),
        Err(e) => debug!(error = %e, "session rejected"),
    }
}

async fn session(mut ws: WebSocket, state: &AppState) -> ServerResult<()> {
    let first = timeout(state.first_frame_timeout, ws.recv())
        .await
        .map_err(|_| ServerError::HandshakeRejected("timed out awaiting header frame"))?;

    let frame = match first {
        Some(Ok(Message::Binary(frame))) => frame,
        Some(Ok(_)) => {
            return Err(ServerError::HandshakeRejected("first frame was not binary"))
        }
        Some(Err(_)) | None => {
            return Err(ServerError::HandshakeRejected("closed before header frame"))
        }
    };

    let descriptor = decode(&frame, &state.config.client_id)?;
    let trailing = &frame[descriptor.payload_offset..];

    debug!(host = %descriptor.host(), port = descriptor.port, "header accepted");
    bridge::run(ws, &descriptor, trailing, &state.resolver).await
}
