//! Error kinds for the wire protocol and process lifecycle.

use std::io;
use thiserror::Error;

/// Errors surfaced by the library. Binaries convert these into
/// `anyhow::Error` at the CLI boundary.
#[derive(Debug, Error)]
pub enum BgpyError {
    /// The listener failed to bind the requested address.
    #[error("failed to bind {host}:{port}: {source}")]
    Bind {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// The client failed to connect to a server.
    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// The length header of a frame could not be parsed as a decimal integer.
    #[error("malformed frame header: {0:?}")]
    Framing(String),

    /// An I/O error occurred while reading or writing a frame.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A message could not be encoded or decoded.
    #[error("failed to (de)serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A payload's base64 wrapping was malformed.
    #[error("malformed message payload: {0}")]
    Encoding(String),

    /// An INIT message named a task identifier absent from the registry.
    #[error("unknown task: {0}")]
    UnknownTask(String),

    /// A second INIT was received on an already-initialized server.
    #[error("already initialized")]
    AlreadyInitialized,

    /// A configured token did not match the one supplied by a client.
    #[error("invalid client authentication")]
    InvalidAuthentication,

    /// A registered task returned an application-level error. The session
    /// this occurred on is torn down; the listener keeps accepting.
    #[error("task failed: {0}")]
    Task(String),

    /// An init-file descriptor could not be read or parsed.
    #[error("invalid init file: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BgpyError>;
