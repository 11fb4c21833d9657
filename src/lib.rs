//! `bgpy`: a supervised background-process container.
//!
//! A long-lived background process a client program launches, initializes
//! with caller-supplied task procedures, drives with request/response
//! commands, and terminates cleanly — all over a local TCP connection. See
//! `demos/counter_tasks.rs` for a worked example of the task registry this
//! crate dispatches through.

pub mod cli;
pub mod client;
pub mod endpoint;
pub mod environment;
pub mod error;
pub mod example_tasks;
pub mod listener;
pub mod log;
pub mod message;
pub mod serialize;
pub mod server;
pub mod session;
pub mod task;
pub mod token;
pub mod wire;

pub use client::{execute, initialize, respond, terminate};
pub use error::{BgpyError, Result};
pub use message::{Message, MessageType};
pub use server::Server;
pub use task::TaskRegistry;
