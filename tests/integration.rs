//! End-to-end scenarios, driven over real loopback TCP connections against
//! an in-process server (bound to port 0 to avoid cross-test collisions),
//! using the counter demo tasks as the registered task set.

use std::collections::HashMap;
use std::io::Write;

use bgpy::endpoint::{Endpoint, Role};
use bgpy::message::{Message, MessageType};
use bgpy::{client, example_tasks, server::Server};
use serde_json::{json, Map, Value};
use tokio::net::TcpStream;

fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

async fn spawn_server(token: Option<String>) -> (String, u16) {
    let server = Server::bind("127.0.0.1", 0, example_tasks::registry(), token)
        .await
        .expect("bind should succeed on an ephemeral port");
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    (addr.ip().to_string(), addr.port())
}

#[tokio::test]
async fn init_then_two_execs_then_exit() {
    let (host, port) = spawn_server(None).await;

    client::initialize(
        example_tasks::INIT,
        example_tasks::EXEC,
        example_tasks::EXIT,
        None,
        &host,
        port,
    )
    .await
    .unwrap();

    client::execute(
        args(json!({"command": "increase", "value_change": 10})),
        false,
        None,
        &host,
        port,
    )
    .await
    .unwrap();

    client::execute(
        args(json!({"command": "decrease", "value_change": 100})),
        false,
        None,
        &host,
        port,
    )
    .await
    .unwrap();

    let response = client::terminate(Map::new(), true, None, &host, port)
        .await
        .unwrap()
        .expect("terminate should receive the exit task's second response");

    assert_eq!(response["request_count"], json!(3));
    assert_eq!(response["value"], json!(910));
    assert_eq!(response["status"], json!("Exited."));
}

#[tokio::test]
async fn double_init_is_rejected() {
    let (host, port) = spawn_server(None).await;

    let first = client::initialize(
        example_tasks::INIT,
        example_tasks::EXEC,
        example_tasks::EXIT,
        None,
        &host,
        port,
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(first["message"], "Initialization successful.");

    let second = client::initialize(
        example_tasks::INIT,
        example_tasks::EXEC,
        example_tasks::EXIT,
        None,
        &host,
        port,
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(second["message"], "Already initialized.");
}

#[tokio::test]
async fn exec_confirmation_literal_without_second_response() {
    let (host, port) = spawn_server(None).await;

    client::initialize(
        example_tasks::INIT,
        example_tasks::EXEC,
        example_tasks::EXIT,
        None,
        &host,
        port,
    )
    .await
    .unwrap();

    let response = client::execute(
        args(json!({"command": "increase", "value_change": 1})),
        false,
        None,
        &host,
        port,
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(response["message"], "Received 'EXEC'");
}

#[tokio::test]
async fn terminate_only_server_exits_cleanly() {
    let (host, port) = spawn_server(None).await;

    let response = client::terminate(Map::new(), false, None, &host, port)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response["message"], "Received 'EXIT'");
}

#[tokio::test]
async fn token_mismatch_is_rejected() {
    let (host, port) = spawn_server(Some("correct-horse".to_string())).await;

    // A raw AUTH with the wrong token, on its own connection, gets the
    // explicit error second response. Using `Endpoint` directly here
    // (rather than `initialize`, which always awaits a second response)
    // avoids sending a follow-up message that the server would silently
    // ignore post-auth-failure and block on forever.
    let stream = TcpStream::connect((host.as_str(), port)).await.unwrap();
    let mut endpoint = Endpoint::new(stream, Role::Client);
    let mut args = Map::new();
    args.insert("token".to_string(), json!("wrong-token"));
    let response = endpoint
        .send(Message::new(MessageType::Auth, args), true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.args["message"], "Invalid client authentication.");

    // A fresh connection with the right token succeeds normally.
    let response = client::initialize(
        example_tasks::INIT,
        example_tasks::EXEC,
        example_tasks::EXIT,
        Some("correct-horse"),
        &host,
        port,
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(response["message"], "Initialization successful.");
}

#[tokio::test]
async fn framed_giant_payload_round_trips_intact() {
    let (host, port) = spawn_server(None).await;

    client::initialize(
        example_tasks::INIT,
        example_tasks::EXEC,
        example_tasks::EXIT,
        None,
        &host,
        port,
    )
    .await
    .unwrap();

    let mut big = HashMap::new();
    big.insert("command".to_string(), json!("increase"));
    big.insert("value_change".to_string(), json!(1));
    big.insert("padding".to_string(), json!("x".repeat(5000)));
    let response = client::execute(args(json!(big)), false, None, &host, port)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(response["message"], "Received 'EXEC'");
}

#[tokio::test]
async fn pre_initialized_from_init_file_rejects_client_init() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"init_task = "{}"
exec_task = "{}"
exit_task = "{}"
"#,
        example_tasks::INIT,
        example_tasks::EXEC,
        example_tasks::EXIT,
    )
    .unwrap();

    let server = Server::bind("127.0.0.1", 0, example_tasks::registry(), None)
        .await
        .expect("bind should succeed on an ephemeral port")
        .with_init_file(file.path())
        .await
        .expect("init file should resolve against the registered counter tasks");
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    // The server already ran `init_task` before accepting any connection, so
    // a client's own INIT is rejected exactly as a second INIT would be.
    let response = client::initialize(
        example_tasks::INIT,
        example_tasks::EXEC,
        example_tasks::EXIT,
        None,
        &addr.ip().to_string(),
        addr.port(),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(response["message"], "Already initialized.");

    // But EXEC against the pre-seeded state works normally.
    let response = client::execute(
        args(json!({"command": "increase", "value_change": 5})),
        false,
        None,
        &addr.ip().to_string(),
        addr.port(),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(response["message"], "Received 'EXEC'");
}
