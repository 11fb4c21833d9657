//! Drives a `bgpy` server through a full counter-demo scenario:
//! `initialize`, two `execute`s, then `terminate`.
//!
//! Run with `cargo run --example counter_tasks`. The server and client both
//! run in this one process — the server on a background task, the client
//! on the main task — rather than via `Server::run_background`, so the
//! demo has no dependency on the compiled `bgpy` binary being on `PATH`.

use bgpy::{client, example_tasks, server::Server};
use serde_json::{json, Map, Value};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    let server = Server::bind("127.0.0.1", 0, example_tasks::registry(), None).await?;
    let addr = server.local_addr()?;
    tokio::spawn(server.run());

    let response = client::initialize(
        example_tasks::INIT,
        example_tasks::EXEC,
        example_tasks::EXIT,
        None,
        &addr.ip().to_string(),
        addr.port(),
    )
    .await?;
    println!("initialize -> {response:?}");

    let increase = as_args(json!({"command": "increase", "value_change": 10}));
    let response = client::execute(increase, false, None, &addr.ip().to_string(), addr.port()).await?;
    println!("execute(increase 10) -> {response:?}");

    let decrease = as_args(json!({"command": "decrease", "value_change": 100}));
    let response = client::execute(decrease, false, None, &addr.ip().to_string(), addr.port()).await?;
    println!("execute(decrease 100) -> {response:?}");

    let response = client::terminate(Map::new(), true, None, &addr.ip().to_string(), addr.port()).await?;
    println!("terminate -> {response:?}");

    Ok(())
}

fn as_args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => unreachable!("literal above is always an object"),
    }
}
