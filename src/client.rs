//! The client façade: `initialize`/`execute`/`terminate`.
//!
//! Every operation here opens a fresh connection, sends exactly one
//! message, and closes — there is no long-lived client object. When a
//! `token` is supplied, it is sent as the connection's first message,
//! ahead of the command the caller actually asked for: a protected server
//! requires `AUTH` to precede every other message.

use serde_json::{Map, Value};
use tokio::net::TcpStream;
use tokio::time::sleep;

use crate::endpoint::{Endpoint, Role};
use crate::environment::STARTUP_TIME;
use crate::error::{BgpyError, Result};
use crate::message::{Message, MessageType};

async fn connect(host: &str, port: u16) -> Result<Endpoint> {
    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|source| BgpyError::Connect {
            host: host.to_string(),
            port,
            source,
        })?;
    Ok(Endpoint::new(stream, Role::Client))
}

/// Sends `AUTH` on `endpoint` and awaits its explicit confirmation, when a
/// token is configured for this call. A `None` token sends nothing, for the
/// common case of an unprotected server.
async fn authenticate(endpoint: &mut Endpoint, token: Option<&str>) -> Result<()> {
    if let Some(token) = token {
        let mut args = Map::new();
        args.insert("token".to_string(), Value::String(token.to_string()));
        endpoint.send(Message::new(MessageType::Auth, args), true).await?;
    }
    Ok(())
}

/// Sends `INIT` naming the three registered task identifiers and awaits the
/// state machine's explicit confirmation. Returns `None` if the connection
/// closed before a response arrived.
pub async fn initialize(
    init_task: &str,
    exec_task: &str,
    exit_task: &str,
    token: Option<&str>,
    host: &str,
    port: u16,
) -> Result<Option<Map<String, Value>>> {
    let mut args = Map::new();
    args.insert("init_task".to_string(), Value::String(init_task.to_string()));
    args.insert("exec_task".to_string(), Value::String(exec_task.to_string()));
    args.insert("exit_task".to_string(), Value::String(exit_task.to_string()));

    let mut endpoint = connect(host, port).await?;
    authenticate(&mut endpoint, token).await?;
    let msg = Message::new(MessageType::Init, args);
    let response = endpoint.send(msg, true).await?;
    Ok(response.map(|m| m.args))
}

/// Sends `EXEC` with `args` and returns the confirmation (or the task's
/// second response, if `await_response` is set).
pub async fn execute(
    args: Map<String, Value>,
    await_response: bool,
    token: Option<&str>,
    host: &str,
    port: u16,
) -> Result<Option<Map<String, Value>>> {
    let mut endpoint = connect(host, port).await?;
    authenticate(&mut endpoint, token).await?;
    let msg = Message::new(MessageType::Exec, args);
    let response = endpoint.send(msg, await_response).await?;
    Ok(response.map(|m| m.args))
}

/// Sends `EXIT` with `args`, then sleeps [`STARTUP_TIME`] to give the
/// server time to release its listening port before returning.
pub async fn terminate(
    args: Map<String, Value>,
    await_response: bool,
    token: Option<&str>,
    host: &str,
    port: u16,
) -> Result<Option<Map<String, Value>>> {
    let mut endpoint = connect(host, port).await?;
    authenticate(&mut endpoint, token).await?;
    let msg = Message::new(MessageType::Exit, args);
    let response = endpoint.send(msg, await_response).await?;
    sleep(STARTUP_TIME).await;
    Ok(response.map(|m| m.args))
}

/// Emits an explicit second response on an already-dispatched endpoint,
/// the capability an `exec`/`exit` task uses to answer a caller that set
/// `await_response=true`.
pub async fn respond(
    endpoint: &mut Endpoint,
    response: Map<String, Value>,
) -> Result<Option<Map<String, Value>>> {
    let msg = Message::new(MessageType::Ok, response);
    let ack = endpoint.respond(msg).await?;
    Ok(ack.map(|m| m.args))
}
