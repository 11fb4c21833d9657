//! The stream endpoint: whole-message send/recv with the confirmation and
//! optional-second-response handshake.
//!
//! Both the client façade and the server's per-connection session loop use
//! this type to talk over an accepted or connected `TcpStream`; only the
//! framing (`wire.rs`) is generic over `AsyncRead + AsyncWrite`, since a
//! connection concretely wraps a single stream type per role rather than
//! parameterizing call sites over it.

use serde_json::Value;
use tokio::net::TcpStream;
use tracing::info;

use crate::message::{Message, MessageType};
use crate::serialize::{deserialize, serialize};
use crate::wire::{recv_frame, send_frame};

/// Which side of a connection this endpoint represents, used only for
/// tagging log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

/// A connected stream plus the send/recv handshake logic. Closes its
/// underlying socket on drop, which on a `TcpStream` shuts down both
/// directions.
pub struct Endpoint {
    stream: TcpStream,
    role: Role,
}

impl Endpoint {
    pub fn new(stream: TcpStream, role: Role) -> Self {
        Endpoint { stream, role }
    }

    fn tag(&self) -> &'static str {
        match self.role {
            Role::Client => "Client",
            Role::Server => "Server",
        }
    }

    /// Initiator side of the protocol: send one message, wait for its
    /// confirmation, and optionally wait for a second response.
    ///
    /// Augments `msg.args` with `await_response`, frame-sends the message,
    /// frame-receives the confirmation, and — if `await_second` — recurses
    /// into [`Endpoint::recv`] for a second message. Recursing into `recv`
    /// rather than doing a raw read is load-bearing: it is why the second
    /// response gets its own confirmation sent back to whoever emitted it.
    pub async fn send(&mut self, mut msg: Message, await_second: bool) -> crate::error::Result<Option<Message>> {
        msg.args
            .insert("await_response".to_string(), Value::Bool(await_second));
        info!(tag = self.tag(), "sending {}", msg.type_);

        let payload = serialize(&msg)?;
        send_frame(&mut self.stream, &payload).await?;

        let confirmation_payload = match recv_frame(&mut self.stream).await? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let confirmation = deserialize(&confirmation_payload)?;
        info!(tag = self.tag(), "received {}", confirmation.type_);

        if await_second {
            info!(tag = self.tag(), "awaiting second response");
            return self.recv().await;
        }
        Ok(Some(confirmation))
    }

    /// Responder side of the protocol.
    ///
    /// Frame-receives a message, builds the automatic `OK` confirmation
    /// (`"Received '<TYPE>'"`), frame-sends it, and returns the received
    /// message to the caller for dispatch.
    pub async fn recv(&mut self) -> crate::error::Result<Option<Message>> {
        let payload = match recv_frame(&mut self.stream).await? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let msg = deserialize(&payload)?;
        info!(tag = self.tag(), "received {}", msg.type_);

        let confirmation = Message::received_confirmation(msg.type_);
        info!(tag = self.tag(), "responding {}", confirmation.type_);
        let confirmation_payload = serialize(&confirmation)?;
        send_frame(&mut self.stream, &confirmation_payload).await?;

        Ok(Some(msg))
    }

    /// Emits an explicit second response on this endpoint, the capability a
    /// dispatched `exec`/`exit` task uses to answer an initiator that set
    /// `await_response=true`.
    pub async fn respond(&mut self, response: Message) -> crate::error::Result<Option<Message>> {
        self.send(response, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageType;
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn connected_pair() -> (Endpoint, Endpoint) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client_fut = TcpStream::connect(addr);
        let (server_stream, client_stream) =
            tokio::try_join!(async { listener.accept().await.map(|(s, _)| s) }, client_fut)
                .unwrap();
        (
            Endpoint::new(client_stream, Role::Client),
            Endpoint::new(server_stream, Role::Server),
        )
    }

    #[tokio::test]
    async fn recv_emits_exactly_one_confirmation() {
        let (mut client, mut server) = connected_pair().await;

        let send_task = tokio::spawn(async move {
            let mut msg = Message::empty(MessageType::Exec);
            msg.args.insert("command".to_string(), json!("increase"));
            client.send(msg, false).await.unwrap()
        });

        let received = server.recv().await.unwrap().unwrap();
        assert_eq!(received.type_, MessageType::Exec);

        let confirmation = send_task.await.unwrap().unwrap();
        assert_eq!(confirmation.type_, MessageType::Ok);
        assert_eq!(
            confirmation.args["message"],
            Value::String("Received 'EXEC'".to_string())
        );
    }

    #[tokio::test]
    async fn await_response_delivers_second_message() {
        let (mut client, mut server) = connected_pair().await;

        let send_task = tokio::spawn(async move {
            let msg = Message::empty(MessageType::Exec);
            client.send(msg, true).await.unwrap()
        });

        let _ = server.recv().await.unwrap().unwrap();
        server
            .respond(Message::ok("Initialization successful."))
            .await
            .unwrap();

        let second = send_task.await.unwrap().unwrap();
        assert_eq!(second.args["message"], "Initialization successful.");
    }
}
