//! Connection bridge: owns the outbound TCP socket and the two forwarding
//! directions between it and the WebSocket session.
//!
//! The two pumps run as futures under one `select!`, so whichever side ends
//! first tears down the whole session — there is no half-open drain state.

use crate::error::{ServerError, ServerResult};
use crate::resolver::Resolver;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, trace};
use veil_proto::{DestinationDescriptor, HANDSHAKE_ACK};

/// Chunk size for upstream reads; each chunk becomes one binary frame.
const READ_CHUNK: usize = 4096;

/// Run a bridged session to completion.
///
/// Sends the two-byte acknowledgment before any destination-connect latency
/// can be observed, connects to the resolved destination, forwards the
/// trailing bytes of the header frame, then pumps both directions until
/// either side ends.
pub async fn run(
    ws: WebSocket,
    descriptor: &DestinationDescriptor,
    trailing_payload: &[u8],
    resolver: &Resolver,
) -> ServerResult<()> {
    let (mut ws_tx, ws_rx) = ws.split();

    // Handshake accepted: ack first, resolve and connect after.
    ws_tx
        .send(Message::Binary(HANDSHAKE_ACK.to_vec()))
        .await
        .map_err(|e| ServerError::Forwarding(format!("ack send failed: {e}")))?;

    let host = resolver.resolve(&descriptor.host()).await;
    let stream = TcpStream::connect((host.as_str(), descriptor.port))
        .await
        .map_err(ServerError::UpstreamConnect)?;
    let _ = stream.set_nodelay(true);
    let (tcp_rd, mut tcp_wr) = stream.into_split();

    debug!(host = %host, port = descriptor.port, "upstream connected");

    if !trailing_payload.is_empty() {
        tcp_wr
            .write_all(trailing_payload)
            .await
            .map_err(|e| ServerError::Forwarding(format!("first payload write failed: {e}")))?;
    }

    // Either direction ending cancels the other; dropping the halves on
    // return closes both handles.
    tokio::select! {
        () = client_to_upstream(ws_rx, tcp_wr) => {
            debug!("client side ended, session closed");
        }
        () = upstream_to_client(tcp_rd, ws_tx) => {
            debug!("upstream side ended, session closed");
        }
    }

    Ok(())
}

/// Inbound direction: binary frames from the session are written to the
/// upstream socket in arrival order. Non-binary frames are ignored.
async fn client_to_upstream(mut ws_rx: SplitStream<WebSocket>, mut tcp_wr: OwnedWriteHalf) {
    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Binary(data)) => {
                if let Err(e) = tcp_wr.write_all(&data).await {
                    debug!(error = %e, "upstream write failed");
                    break;
                }
                trace!(bytes = data.len(), "forwarded to upstream");
            }
            Ok(Message::Close(_)) => break,
            // Text and ping/pong carry no tunnel payload.
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "session receive failed");
                break;
            }
        }
    }
    let _ = tcp_wr.shutdown().await;
}

/// Outbound direction: bounded upstream reads, each chunk wrapped as one
/// binary frame. Ends on EOF or error on either handle.
async fn upstream_to_client(mut tcp_rd: OwnedReadHalf, mut ws_tx: SplitSink<WebSocket, Message>) {
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match tcp_rd.read(&mut buf).await {
            Ok(0) => {
                debug!("upstream closed");
                break;
            }
            Ok(n) => {
                if let Err(e) = ws_tx.send(Message::Binary(buf[..n].to_vec())).await {
                    debug!(error = %e, "session send failed");
                    break;
                }
                trace!(bytes = n, "forwarded to client");
            }
            Err(e) => {
                debug!(error = %e, "upstream read failed");
                break;
            }
        }
    }
}
