//! The message model: tagged variants and their argument maps.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The six message tags the wire protocol carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Auth,
    Init,
    Exec,
    Exit,
    Ok,
    Error,
}

impl MessageType {
    /// The upper-case tag name used in wire-visible strings such as
    /// `"Received 'EXEC'"`.
    pub fn name(&self) -> &'static str {
        match self {
            MessageType::Auth => "AUTH",
            MessageType::Init => "INIT",
            MessageType::Exec => "EXEC",
            MessageType::Exit => "EXIT",
            MessageType::Ok => "OK",
            MessageType::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A message exchanged over a connection: a fixed tag plus an open-ended
/// argument map. Built once per send and never mutated in place after that
/// (the original's `set_args` is just "construct a new `Message`" here).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub type_: MessageType,
    pub args: Map<String, Value>,
}

impl Message {
    /// Builds a message with the given tag and arguments.
    pub fn new(type_: MessageType, args: Map<String, Value>) -> Self {
        Message { type_, args }
    }

    /// Builds a message with no arguments.
    pub fn empty(type_: MessageType) -> Self {
        Message::new(type_, Map::new())
    }

    /// Builds an `OK` message whose `args` has a single `"message"` entry,
    /// the shape every confirmation and most second responses take.
    pub fn ok(message: impl Into<String>) -> Self {
        let mut args = Map::new();
        args.insert("message".to_string(), Value::String(message.into()));
        Message::new(MessageType::Ok, args)
    }

    /// Builds an `ERROR` message whose `args` has a single `"message"` entry.
    pub fn error(message: impl Into<String>) -> Self {
        let mut args = Map::new();
        args.insert("message".to_string(), Value::String(message.into()));
        Message::new(MessageType::Error, args)
    }

    /// The confirmation `recv()` automatically emits for any well-formed
    /// message it receives: `{"message": "Received '<TYPE>'"}`.
    pub fn received_confirmation(of: MessageType) -> Self {
        Message::ok(format!("Received '{}'", of.name()))
    }
}
