//! End-to-end tests driving the server over real WebSocket connections.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;
use xiangqi_server::XiangqiServer;

type ClientWs =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn start_server() -> String {
    let server = XiangqiServer::builder()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("send");
}

async fn recv(ws: &mut ClientWs) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for message")
        .expect("stream ended")
        .expect("websocket error");
    serde_json::from_str(&msg.into_text().expect("text frame")).expect("valid JSON")
}

async fn set_username(ws: &mut ClientWs, username: &str) {
    send(ws, json!({"action": "set_username", "username": username})).await;
    let event = recv(ws).await;
    assert_eq!(event["type"], "username_set");
}

#[tokio::test]
async fn unknown_action_is_reported_by_name() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(&mut ws, json!({"action": "do_a_barrel_roll"})).await;
    let event = recv(&mut ws).await;
    assert_eq!(event["type"], "error");
    assert_eq!(event["message"], "Unknown action");
}

#[tokio::test]
async fn malformed_json_is_reported_distinctly() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::Text("not json at all".into()))
        .await
        .expect("send");
    let event = recv(&mut ws).await;
    assert_eq!(event["type"], "error");
    assert_eq!(event["message"], "Invalid JSON");
}

#[tokio::test]
async fn duplicate_username_across_connections_is_rejected() {
    let addr = start_server().await;
    let mut ws1 = connect(&addr).await;
    let mut ws2 = connect(&addr).await;

    set_username(&mut ws1, "alice").await;

    send(&mut ws2, json!({"action": "set_username", "username": "alice"})).await;
    let event = recv(&mut ws2).await;
    assert_eq!(event["type"], "error");
    assert!(event["message"].as_str().unwrap().contains("alice"));
}

#[tokio::test]
async fn create_and_join_room_round_trip() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    set_username(&mut ws, "alice").await;

    send(
        &mut ws,
        json!({"action": "create_room", "room_name": "alice's table"}),
    )
    .await;
    let created = recv(&mut ws).await;
    assert_eq!(created["type"], "room_created");
    assert_eq!(created["room_name"], "alice's table");
    assert_eq!(created["is_private"], false);

    let room_id = created["room_id"].as_str().unwrap().to_string();
    send(
        &mut ws,
        json!({"action": "join_room", "room_id": room_id, "join_as": "player"}),
    )
    .await;
    let joined = recv(&mut ws).await;
    assert_eq!(joined["type"], "joined_room");
    assert_eq!(joined["join_as"], "player");
}

#[tokio::test]
async fn private_room_rejects_wrong_password() {
    let addr = start_server().await;
    let mut ws1 = connect(&addr).await;
    set_username(&mut ws1, "alice").await;

    send(
        &mut ws1,
        json!({"action": "create_room", "password": "secret"}),
    )
    .await;
    let created = recv(&mut ws1).await;
    let room_id = created["room_id"].as_str().unwrap().to_string();

    let mut ws2 = connect(&addr).await;
    set_username(&mut ws2, "mallory").await;
    send(
        &mut ws2,
        json!({"action": "join_room", "room_id": room_id, "password": "wrong"}),
    )
    .await;
    let event = recv(&mut ws2).await;
    assert_eq!(event["type"], "error");
    assert_eq!(event["message"], "Incorrect password");
}

#[tokio::test]
async fn illegal_move_triggers_system_accusation_then_rejection() {
    let addr = start_server().await;
    let mut ws1 = connect(&addr).await;
    set_username(&mut ws1, "alice").await;
    send(&mut ws1, json!({"action": "create_room"})).await;
    let created = recv(&mut ws1).await;
    let room_id = created["room_id"].as_str().unwrap().to_string();

    send(
        &mut ws1,
        json!({"action": "join_room", "room_id": room_id, "join_as": "player"}),
    )
    .await;
    let _ = recv(&mut ws1).await; // joined_room

    let mut ws2 = connect(&addr).await;
    set_username(&mut ws2, "bob").await;
    send(
        &mut ws2,
        json!({"action": "join_room", "room_id": room_id, "join_as": "player"}),
    )
    .await;
    let _ = recv(&mut ws2).await; // joined_room to bob
    let _ = recv(&mut ws1).await; // user_joined broadcast to alice

    send(&mut ws1, json!({"action": "start_game"})).await;
    let _ = recv(&mut ws1).await; // game_started
    let _ = recv(&mut ws2).await;

    // Rook cannot move diagonally.
    send(
        &mut ws1,
        json!({"action": "make_move", "from_row": 0, "from_col": 0, "to_row": 1, "to_col": 1}),
    )
    .await;

    let accusation = recv(&mut ws1).await;
    assert_eq!(accusation["type"], "chat_message");
    assert_eq!(accusation["username"], "System");

    let rejection = recv(&mut ws1).await;
    assert_eq!(rejection["type"], "move_rejected");
}

#[tokio::test]
async fn private_message_delivers_to_target_and_acks_sender() {
    let addr = start_server().await;
    let mut ws1 = connect(&addr).await;
    set_username(&mut ws1, "alice").await;
    let mut ws2 = connect(&addr).await;
    set_username(&mut ws2, "bob").await;

    send(
        &mut ws1,
        json!({"action": "private_message", "target_username": "bob", "message": "hi"}),
    )
    .await;

    let received = recv(&mut ws2).await;
    assert_eq!(received["type"], "private_message");
    assert_eq!(received["message"], "hi");

    let ack = recv(&mut ws1).await;
    assert_eq!(ack["type"], "private_message_sent");
}

#[tokio::test]
async fn room_list_reflects_created_rooms() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    set_username(&mut ws, "alice").await;
    send(&mut ws, json!({"action": "create_room"})).await;
    let _ = recv(&mut ws).await;

    send(&mut ws, json!({"action": "get_room_list"})).await;
    let event = recv(&mut ws).await;
    assert_eq!(event["type"], "room_list");
    assert_eq!(event["rooms"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn owner_disconnecting_tears_down_the_room_for_the_other_player() {
    let addr = start_server().await;
    let mut ws1 = connect(&addr).await;
    set_username(&mut ws1, "alice").await;
    send(&mut ws1, json!({"action": "create_room"})).await;
    let created = recv(&mut ws1).await;
    let room_id = created["room_id"].as_str().unwrap().to_string();
    send(
        &mut ws1,
        json!({"action": "join_room", "room_id": room_id, "join_as": "player"}),
    )
    .await;
    let _ = recv(&mut ws1).await;

    let mut ws2 = connect(&addr).await;
    set_username(&mut ws2, "bob").await;
    send(
        &mut ws2,
        json!({"action": "join_room", "room_id": room_id, "join_as": "player"}),
    )
    .await;
    let _ = recv(&mut ws2).await;
    let _ = recv(&mut ws1).await; // user_joined to alice

    drop(ws1);

    let event = recv(&mut ws2).await;
    assert_eq!(event["type"], "room_deleted");
}
