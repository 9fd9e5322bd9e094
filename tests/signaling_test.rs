//! End-to-end tests driving a real server instance over WebSocket.
//!
//! Each test runs the server in-process on its own port and talks to it
//! with plain `tokio-tungstenite` clients, the same way a browser client
//! would over the wire.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};

use rtc_roulette_rs::server::run_server;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Spawn the server on the given port and wait until it accepts connections.
async fn start_server(port: u16) {
    tokio::spawn(run_server("127.0.0.1".to_string(), port));
    for _ in 0..50 {
        if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            return;
        }
        sleep(Duration::from_millis(100)).await;
    }
    panic!("server did not start on port {port}");
}

/// Connect one client and return the socket plus its server-assigned id.
async fn connect_client(port: u16) -> (WsClient, String) {
    let url = format!("ws://127.0.0.1:{port}/ws");
    let (mut ws, _response) = connect_async(&url).await.expect("failed to connect");
    let connected = recv_event(&mut ws, "connected").await;
    let client_id = connected["clientId"]
        .as_str()
        .expect("connected event without clientId")
        .to_string();
    (ws, client_id)
}

async fn send_event(ws: &mut WsClient, event: Value) {
    ws.send(Message::Text(event.to_string().into()))
        .await
        .expect("failed to send");
}

/// Read events until one of the given type arrives, skipping the
/// debug/debugInfo noise the server interleaves.
async fn recv_event(ws: &mut WsClient, event_type: &str) -> Value {
    timeout(RECV_TIMEOUT, async {
        while let Some(msg) = ws.next().await {
            let msg = msg.expect("websocket error");
            if let Message::Text(text) = msg {
                let value: Value = serde_json::from_str(&text).expect("invalid JSON from server");
                if value["type"] == event_type {
                    return value;
                }
            }
        }
        panic!("connection closed while waiting for '{event_type}'");
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for '{event_type}'"))
}

#[tokio::test]
async fn test_random_match_relay_and_end_chat() {
    // テスト項目: ランダムマッチ -> signal リレー -> endChat の一連の流れ
    // given (前提条件):
    let port = 19901;
    start_server(port).await;
    let (mut alice, alice_id) = connect_client(port).await;
    let (mut bob, bob_id) = connect_client(port).await;

    // when (操作): 両者が findPartner を送る
    send_event(&mut alice, json!({"type": "findPartner"})).await;
    recv_event(&mut alice, "waiting").await;
    send_event(&mut bob, json!({"type": "findPartner"})).await;

    // then (期待する結果): 同一ルームの chatStart、先着の alice が先頭
    let start_alice = recv_event(&mut alice, "chatStart").await;
    let start_bob = recv_event(&mut bob, "chatStart").await;
    assert_eq!(start_alice["roomId"], start_bob["roomId"]);
    assert_eq!(start_alice["users"][0], Value::String(alice_id.clone()));
    assert_eq!(start_alice["users"][1], Value::String(bob_id.clone()));

    // when (操作): alice が opaque な signal を送る
    let room_id = start_alice["roomId"].as_str().unwrap().to_string();
    send_event(
        &mut alice,
        json!({"type": "signal", "roomId": room_id, "signal": {"sdp": "v=0", "kind": "offer"}}),
    )
    .await;

    // then (期待する結果): bob にそのまま届き、from が付与されている
    let relayed = recv_event(&mut bob, "signal").await;
    assert_eq!(relayed["from"], Value::String(alice_id.clone()));
    assert_eq!(relayed["signal"]["sdp"], "v=0");
    assert_eq!(relayed["signal"]["kind"], "offer");

    // when (操作): bob が endChat する
    send_event(&mut bob, json!({"type": "endChat"})).await;

    // then (期待する結果): alice に chatEnded が届く
    recv_event(&mut alice, "chatEnded").await;
}

#[tokio::test]
async fn test_named_room_round_trip() {
    // テスト項目: 指定ルームの作成 / 参加 / 満員拒否
    // given (前提条件):
    let port = 19902;
    start_server(port).await;
    let (mut alice, alice_id) = connect_client(port).await;
    let (mut bob, bob_id) = connect_client(port).await;
    let (mut carol, _carol_id) = connect_client(port).await;

    // when (操作): alice がルームを作り bob が参加する
    send_event(&mut alice, json!({"type": "joinSpecificRoom", "roomId": "e2e-room"})).await;
    let waiting = recv_event(&mut alice, "waitingInRoom").await;
    assert_eq!(waiting["roomId"], "e2e-room");
    send_event(&mut bob, json!({"type": "joinSpecificRoom", "roomId": "e2e-room"})).await;

    // then (期待する結果): 両者に参加順の chatStart
    let start_alice = recv_event(&mut alice, "chatStart").await;
    let start_bob = recv_event(&mut bob, "chatStart").await;
    for start in [&start_alice, &start_bob] {
        assert_eq!(start["roomId"], "e2e-room");
        assert_eq!(start["users"][0], Value::String(alice_id.clone()));
        assert_eq!(start["users"][1], Value::String(bob_id.clone()));
    }

    // when (操作): 3人目が同じルームに参加を試みる
    send_event(&mut carol, json!({"type": "joinSpecificRoom", "roomId": "e2e-room"})).await;

    // then (期待する結果): roomFull で拒否される
    let full = recv_event(&mut carol, "roomFull").await;
    assert_eq!(full["roomId"], "e2e-room");
}

#[tokio::test]
async fn test_disconnect_notifies_partner() {
    // テスト項目: 切断が endChat と同様に相手へ通知される
    // given (前提条件):
    let port = 19903;
    start_server(port).await;
    let (mut alice, _alice_id) = connect_client(port).await;
    let (mut bob, _bob_id) = connect_client(port).await;
    send_event(&mut alice, json!({"type": "findPartner"})).await;
    send_event(&mut bob, json!({"type": "findPartner"})).await;
    recv_event(&mut alice, "chatStart").await;
    recv_event(&mut bob, "chatStart").await;

    // when (操作): alice が接続を閉じる
    alice.close(None).await.expect("failed to close");
    drop(alice);

    // then (期待する結果): bob に chatEnded が届く
    recv_event(&mut bob, "chatEnded").await;
}

#[tokio::test]
async fn test_http_observability_endpoints() {
    // テスト項目: ヘルスチェックとルーム一覧の HTTP エンドポイント
    // given (前提条件):
    let port = 19904;
    start_server(port).await;

    // when (操作) / then (期待する結果): ヘルスチェック
    let health: Value = reqwest::get(format!("http://127.0.0.1:{port}/api/health"))
        .await
        .expect("health request failed")
        .json()
        .await
        .expect("invalid health JSON");
    assert_eq!(health["status"], "ok");

    // given (前提条件): 1人で待機中の指定ルームを作る
    let (mut alice, alice_id) = connect_client(port).await;
    send_event(&mut alice, json!({"type": "joinSpecificRoom", "roomId": "http-room"})).await;
    recv_event(&mut alice, "waitingInRoom").await;

    // when (操作): ルーム一覧と詳細を取得する
    let rooms: Value = reqwest::get(format!("http://127.0.0.1:{port}/api/rooms"))
        .await
        .expect("rooms request failed")
        .json()
        .await
        .expect("invalid rooms JSON");
    let detail = reqwest::get(format!("http://127.0.0.1:{port}/api/rooms/http-room"))
        .await
        .expect("room detail request failed");
    let missing = reqwest::get(format!("http://127.0.0.1:{port}/api/rooms/no-such-room"))
        .await
        .expect("room detail request failed");

    // then (期待する結果):
    assert_eq!(rooms[0]["id"], "http-room");
    assert_eq!(rooms[0]["users"][0], Value::String(alice_id));
    assert_eq!(detail.status(), reqwest::StatusCode::OK);
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
}
