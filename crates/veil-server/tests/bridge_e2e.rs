//! End-to-end session tests: an in-process server, a local TCP destination,
//! and tokio-tungstenite as the client side of the tunnel.

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use veil_proto::ClientId;
use veil_server::config::ServerConfig;
use veil_server::resolver::Resolver;
use veil_server::server::{router, AppState};

const UUID: &str = "7bd180e8-1142-4387-93f5-03e8d750a896";
const WS_PATH: &str = "tunnel";

fn client_id() -> ClientId {
    UUID.parse().unwrap()
}

/// Spawn the server on an ephemeral port; returns the bound port.
async fn spawn_server() -> u16 {
    spawn_server_with_timeout(veil_server::gate::FIRST_FRAME_TIMEOUT).await
}

async fn spawn_server_with_timeout(first_frame_timeout: Duration) -> u16 {
    let config = ServerConfig {
        client_id: client_id(),
        domain: "test.invalid".into(),
        node_name: "test".into(),
        sub_path: "sub".into(),
        ws_path: WS_PATH.into(),
        port: 0,
    };
    let state = AppState {
        config: Arc::new(config),
        resolver: Resolver::new(),
        first_frame_timeout,
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    port
}

/// Well-formed IPv4 header frame targeting 127.0.0.1:`port`.
fn header_frame(id: &ClientId, port: u16, trailing: &[u8]) -> Vec<u8> {
    let mut f = vec![0u8];
    f.extend_from_slice(id.as_bytes());
    f.push(0); // no addons
    f.extend_from_slice(&port.to_be_bytes());
    f.push(1); // IPv4
    f.extend_from_slice(&[127, 0, 0, 1]);
    f.extend_from_slice(trailing);
    f
}

async fn connect(port: u16, path: &str) -> tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
> {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://127.0.0.1:{port}/{path}"))
        .await
        .unwrap();
    ws
}

#[tokio::test]
async fn bridges_bytes_in_both_directions() {
    let server_port = spawn_server().await;

    // Destination that checks the first payload and then speaks a scripted
    // exchange.
    let upstream = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream_port = upstream.local_addr().unwrap().port();
    let upstream_task = tokio::spawn(async move {
        let (mut sock, _) = upstream.accept().await.unwrap();
        let mut first = [0u8; 5];
        sock.read_exact(&mut first).await.unwrap();
        assert_eq!(&first, b"GET /", "trailing payload must arrive first");
        sock.write_all(b"ACK01").await.unwrap();

        let mut second = [0u8; 5];
        sock.read_exact(&mut second).await.unwrap();
        assert_eq!(&second, b"hello");
        sock.write_all(b"resp!").await.unwrap();
    });

    let mut ws = connect(server_port, WS_PATH).await;
    ws.send(Message::Binary(header_frame(&client_id(), upstream_port, b"GET /")))
        .await
        .unwrap();

    // The two-byte acknowledgment must be the server's first frame.
    let ack = timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("ack in time")
        .expect("stream open")
        .unwrap();
    assert_eq!(ack, Message::Binary(vec![0, 0]));

    let reply = timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("reply in time")
        .expect("stream open")
        .unwrap();
    assert_eq!(reply, Message::Binary(b"ACK01".to_vec()));

    ws.send(Message::Binary(b"hello".to_vec())).await.unwrap();
    let reply = timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("reply in time")
        .expect("stream open")
        .unwrap();
    assert_eq!(reply, Message::Binary(b"resp!".to_vec()));

    upstream_task.await.unwrap();
}

#[tokio::test]
async fn wrong_path_never_upgrades() {
    let server_port = spawn_server().await;
    let err = tokio_tungstenite::connect_async(format!(
        "ws://127.0.0.1:{server_port}/not-the-path"
    ))
    .await
    .expect_err("upgrade must be refused");
    match err {
        tokio_tungstenite::tungstenite::Error::Http(resp) => {
            assert_eq!(resp.status(), 404);
        }
        other => panic!("expected HTTP rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn wrong_identity_closes_without_ack() {
    let server_port = spawn_server().await;
    let mut ws = connect(server_port, WS_PATH).await;

    let mut frame = header_frame(&client_id(), 80, &[]);
    frame[5] ^= 0x40; // corrupt one identifier byte
    ws.send(Message::Binary(frame)).await.unwrap();

    assert_session_ends_silently(&mut ws).await;
}

#[tokio::test]
async fn non_binary_first_frame_closes_without_ack() {
    let server_port = spawn_server().await;
    let mut ws = connect(server_port, WS_PATH).await;

    ws.send(Message::Text("hello".into())).await.unwrap();

    assert_session_ends_silently(&mut ws).await;
}

#[tokio::test]
async fn silent_client_times_out_without_ack() {
    // Shrunk gate timeout; the client connects and sends nothing.
    let server_port = spawn_server_with_timeout(Duration::from_millis(100)).await;
    let mut ws = connect(server_port, WS_PATH).await;

    assert_session_ends_silently(&mut ws).await;
}

#[tokio::test]
async fn short_frame_closes_without_outbound_connect() {
    let server_port = spawn_server().await;
    let mut ws = connect(server_port, WS_PATH).await;

    ws.send(Message::Binary(vec![0u8; 17])).await.unwrap();

    assert_session_ends_silently(&mut ws).await;
}

/// The session must end without the server ever sending a data frame —
/// no acknowledgment, no diagnostic.
async fn assert_session_ends_silently(
    ws: &mut tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
) {
    loop {
        let next = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("session should end promptly");
        match next {
            Some(Ok(Message::Binary(data))) => panic!("unexpected frame: {data:?}"),
            Some(Ok(Message::Text(text))) => panic!("unexpected frame: {text:?}"),
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => continue,
            Some(Err(_)) => break, // abrupt close is also silent
        }
    }
}
