//! End-to-end tests against a server bound to an ephemeral port.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use clubroom_server::{
    config::Liveness,
    domain::{Room, UserDirectory},
    infrastructure::{
        directory::InMemoryUserDirectory, message_pusher::WebSocketMessagePusher,
        repository::InMemoryRoomRepository,
    },
    ui::Server,
    usecase::{ChatRoomCoordinator, DirectoryAdapter, RoomEventLoop},
};
use clubroom_shared::time::SystemClock;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
    sync::Mutex,
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SEED: &str = r#"[
    {"_id": "u1", "name": "Alice", "email": "alice@example.com", "role": "member"},
    {"_id": "u2", "name": "Bob", "role": "member"},
    {"_id": "u3", "name": "Carol", "role": "admin", "isOnline": true}
]"#;

async fn start_server() -> SocketAddr {
    let clock = Arc::new(SystemClock);
    let repository = Arc::new(InMemoryRoomRepository::new(Arc::new(Mutex::new(Room::new()))));
    let directory: Arc<dyn UserDirectory> =
        Arc::new(InMemoryUserDirectory::from_json(SEED).expect("seed should parse"));
    let directory = Arc::new(DirectoryAdapter::new(
        directory,
        clock.clone(),
        Duration::from_secs(1),
    ));
    let pusher = Arc::new(WebSocketMessagePusher::default());
    let coordinator = Arc::new(ChatRoomCoordinator::new(
        repository, pusher, directory, clock,
    ));
    let (event_loop, events) = RoomEventLoop::new(coordinator.clone());
    event_loop.spawn();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::new(coordinator, events, Liveness::default());
    tokio::spawn(server.serve(listener, std::future::pending()));
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("websocket handshake should succeed");
    ws
}

async fn emit(ws: &mut Client, event: &str, data: Value) {
    let frame = json!({ "event": event, "data": data }).to_string();
    ws.send(Message::Text(frame.into())).await.unwrap();
}

/// Read frames until `event` arrives and return its payload.
async fn expect_event(ws: &mut Client, event: &str) -> Value {
    let read = async {
        while let Some(frame) = ws.next().await {
            if let Message::Text(text) = frame.unwrap() {
                let value: Value = serde_json::from_str(text.as_str()).unwrap();
                if value["event"] == event {
                    return value["data"].clone();
                }
            }
        }
        panic!("connection closed before '{}' arrived", event);
    };
    tokio::time::timeout(Duration::from_secs(5), read)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for '{}'", event))
}

fn names(active_users: &Value) -> Vec<String> {
    active_users
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect()
}

async fn join(ws: &mut Client, user_id: &str, name: &str) -> Value {
    emit(
        ws,
        "join-chat",
        json!({ "userId": user_id, "name": name, "role": "member" }),
    )
    .await;
    expect_event(ws, "init").await
}

#[tokio::test]
async fn test_two_users_chat_and_one_disconnects() {
    // given (preconditions):
    let addr = start_server().await;
    let mut alice = connect(addr).await;

    // when (operation): Alice joins
    let history = join(&mut alice, "u1", "Alice").await;

    // then (expected):
    assert_eq!(history, json!([]));
    assert_eq!(names(&expect_event(&mut alice, "active-users").await), vec!["Alice"]);

    // when (operation): Bob joins
    let mut bob = connect(addr).await;
    join(&mut bob, "u2", "Bob").await;

    // then (expected):
    assert_eq!(
        names(&expect_event(&mut bob, "active-users").await),
        vec!["Alice", "Bob"]
    );
    let joined = expect_event(&mut alice, "user-joined").await;
    assert_eq!(joined["user"]["name"], "Bob");
    assert_eq!(joined["user"]["role"], "member");
    assert_eq!(
        names(&expect_event(&mut alice, "active-users").await),
        vec!["Alice", "Bob"]
    );

    // when (operation): Alice says hi
    emit(&mut alice, "send-message", json!({ "text": "hi" })).await;

    // then (expected): both see it, sender included
    for ws in [&mut alice, &mut bob] {
        let message = expect_event(ws, "new-message").await;
        assert_eq!(message["text"], "hi");
        assert_eq!(message["user"], "Alice");
        assert_eq!(message["userId"], "u1");
    }

    // when (operation): Bob drops the connection
    bob.close(None).await.unwrap();

    // then (expected):
    let left = expect_event(&mut alice, "user-left").await;
    assert_eq!(left["user"]["name"], "Bob");
    assert_eq!(names(&expect_event(&mut alice, "active-users").await), vec!["Alice"]);
}

#[tokio::test]
async fn test_typing_is_relayed_to_the_rest_of_the_room() {
    // given (preconditions):
    let addr = start_server().await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    join(&mut alice, "u1", "Alice").await;
    join(&mut bob, "u2", "Bob").await;

    // when (operation):
    emit(&mut alice, "user-typing", json!({})).await;
    emit(&mut alice, "user-stop-typing", json!({})).await;

    // then (expected):
    assert_eq!(expect_event(&mut bob, "user-typing").await["userName"], "Alice");
    assert_eq!(
        expect_event(&mut bob, "user-stop-typing").await["userName"],
        "Alice"
    );
}

#[tokio::test]
async fn test_invalid_join_gets_an_error_message() {
    let addr = start_server().await;
    let mut ws = connect(addr).await;

    emit(&mut ws, "join-chat", json!({ "name": "Nobody" })).await;

    let error = expect_event(&mut ws, "error-message").await;
    assert!(error["message"].as_str().unwrap().contains("user id"));
}

#[tokio::test]
async fn test_join_with_both_id_keys_is_accepted() {
    let addr = start_server().await;
    let mut ws = connect(addr).await;

    emit(
        &mut ws,
        "join-chat",
        json!({ "_id": "u1", "userId": "u1", "name": "Alice", "role": "member" }),
    )
    .await;

    assert_eq!(expect_event(&mut ws, "init").await, json!([]));
    assert_eq!(names(&expect_event(&mut ws, "active-users").await), vec!["Alice"]);
}

#[tokio::test]
async fn test_undecodable_join_reports_the_cause() {
    let addr = start_server().await;
    let mut ws = connect(addr).await;

    emit(&mut ws, "join-chat", json!({ "userId": 7, "name": "Alice" })).await;

    let error = expect_event(&mut ws, "error-message").await;
    let message = error["message"].as_str().unwrap();
    assert!(message.starts_with("invalid join payload: invalid type"), "{}", message);
}

#[tokio::test]
async fn test_socket_error_is_reported_before_cleanup() {
    // given (preconditions): Alice and Bob in the room
    let addr = start_server().await;
    let mut alice = connect(addr).await;
    join(&mut alice, "u1", "Alice").await;
    let mut bob = connect(addr).await;
    join(&mut bob, "u2", "Bob").await;

    // when (operation): Alice's client writes an unmasked frame, which the
    // server must treat as a protocol error
    let MaybeTlsStream::Plain(stream) = alice.get_mut() else {
        panic!("expected a plain TCP stream");
    };
    stream.write_all(&[0x81, 0x02, b'h', b'i']).await.unwrap();

    // then (expected): the error notice still reaches Alice, then she leaves the room
    let error = expect_event(&mut alice, "error-message").await;
    assert_eq!(error["message"], "Connection error occurred");
    let left = expect_event(&mut bob, "user-left").await;
    assert_eq!(left["user"]["name"], "Alice");
    assert_eq!(names(&expect_event(&mut bob, "active-users").await), vec!["Bob"]);
}

#[tokio::test]
async fn test_unknown_events_are_dropped_without_closing() {
    // given (preconditions):
    let addr = start_server().await;
    let mut ws = connect(addr).await;

    // when (operation): garbage first, then a valid join
    ws.send(Message::Text("not json".into())).await.unwrap();
    emit(&mut ws, "shout", json!({})).await;
    let history = join(&mut ws, "u1", "Alice").await;

    // then (expected): the connection survived
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn test_http_endpoints() {
    // given (preconditions):
    let addr = start_server().await;
    let base = format!("http://{}", addr);
    let http = reqwest::Client::new();

    // when / then: root and health
    let root = http.get(&base).send().await.unwrap();
    assert_eq!(root.text().await.unwrap(), "Clubroom API is running");
    let health: Value = http
        .get(format!("{}/api/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({ "status": "ok" }));

    // when / then: posting without text is rejected
    let rejected = http
        .post(format!("{}/chat", base))
        .json(&json!({ "user": "Alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = rejected.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Message text required." }));

    // when / then: a valid post is stored as Anonymous
    let created = http
        .post(format!("{}/chat", base))
        .json(&json!({ "text": "  hello  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), reqwest::StatusCode::CREATED);
    let message: Value = created.json().await.unwrap();
    assert_eq!(message["text"], "hello");
    assert_eq!(message["user"], "Anonymous");
    assert_eq!(message["socketId"], Value::Null);

    let history: Value = http
        .get(format!("{}/chat", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["id"], message["id"]);
}

#[tokio::test]
async fn test_presence_endpoints_follow_the_room() {
    // given (preconditions):
    let addr = start_server().await;
    let base = format!("http://{}", addr);
    let http = reqwest::Client::new();
    let mut alice = connect(addr).await;

    // when (operation):
    join(&mut alice, "u1", "Alice").await;
    expect_event(&mut alice, "online-users-update").await;

    // then (expected): Alice is a participant and online next to seeded Carol
    let participants: Value = http
        .get(format!("{}/api/chat/participants", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(names(&participants), vec!["Alice"]);
    assert_eq!(participants[0]["email"], "alice@example.com");

    let online: Value = http
        .get(format!("{}/api/users/online", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(names(&online), vec!["Alice", "Carol"]);
    assert_eq!(online[0]["chatroomJoined"], true);

    // when (operation): Alice leaves the chat but keeps the socket
    emit(&mut alice, "leave-chat", json!({})).await;
    expect_event(&mut alice, "online-users-update").await;

    // then (expected):
    let online: Value = http
        .get(format!("{}/api/users/online", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(names(&online), vec!["Carol"]);
}

#[tokio::test]
async fn test_http_message_reaches_websocket_members() {
    // given (preconditions):
    let addr = start_server().await;
    let mut alice = connect(addr).await;
    join(&mut alice, "u1", "Alice").await;

    // when (operation):
    reqwest::Client::new()
        .post(format!("http://{}/chat", addr))
        .json(&json!({ "user": "Webhook", "text": "deploy finished" }))
        .send()
        .await
        .unwrap();

    // then (expected):
    let message = expect_event(&mut alice, "new-message").await;
    assert_eq!(message["user"], "Webhook");
    assert_eq!(message["text"], "deploy finished");
}
