//! Symbolic dispatch for caller-supplied task procedures.
//!
//! Shipping a closure's code across a process boundary isn't something
//! Rust can do safely, so an `INIT` message instead carries three string
//! identifiers naming procedures the server already knows about. This
//! module is the registry those identifiers resolve against, built by the
//! binary embedding this crate (see `demos/counter_tasks.rs` for a worked
//! trio) and optionally loaded from an init-file descriptor.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::endpoint::Endpoint;
use crate::error::{BgpyError, Result};

/// A registered `init` procedure: takes no arguments, returns the initial
/// `user_state`.
#[async_trait]
pub trait InitTask: Send + Sync {
    async fn call(&self) -> Value;
}

/// A registered `exec` or `exit` procedure: receives the live endpoint (so it
/// can emit a second response via [`Endpoint::respond`]), the current
/// `user_state`, and the message's arguments; returns the state that
/// replaces `user_state`.
#[async_trait]
pub trait ExecTask: Send + Sync {
    async fn call(&self, endpoint: &mut Endpoint, state: Value, args: &Map<String, Value>)
        -> Value;
}

/// Blanket impl so a plain async closure/fn can be registered as an `init`
/// task without defining a new type for it. `exec`/`exit` tasks take a
/// borrowed endpoint and args alongside an owned `Fut`, which a generic
/// closure type cannot express without per-call boxing; those are
/// registered by implementing [`ExecTask`] on a named struct instead (see
/// `demos/counter_tasks.rs`).
pub struct FnInitTask<F>(pub F);

#[async_trait]
impl<F, Fut> InitTask for FnInitTask<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Value> + Send,
{
    async fn call(&self) -> Value {
        (self.0)().await
    }
}

/// Three resolved task identifiers, fixed for a connection's lifetime once
/// `INIT` succeeds and immutable for the server process's lifetime from
/// then on.
#[derive(Debug, Clone)]
pub struct TaskSet {
    pub init: String,
    pub exec: String,
    pub exit: String,
}

/// The compiled-in symbolic dispatch table. Construction happens once, in
/// the binary that embeds this crate (see `demos/counter_tasks.rs`); the
/// registry itself never changes after the server is built.
#[derive(Default, Clone)]
pub struct TaskRegistry {
    init: HashMap<String, Arc<dyn InitTask>>,
    exec: HashMap<String, Arc<dyn ExecTask>>,
    exit: HashMap<String, Arc<dyn ExecTask>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_init(&mut self, name: impl Into<String>, task: impl InitTask + 'static) {
        self.init.insert(name.into(), Arc::new(task));
    }

    pub fn register_exec(&mut self, name: impl Into<String>, task: impl ExecTask + 'static) {
        self.exec.insert(name.into(), Arc::new(task));
    }

    pub fn register_exit(&mut self, name: impl Into<String>, task: impl ExecTask + 'static) {
        self.exit.insert(name.into(), Arc::new(task));
    }

    /// Resolves the three identifiers carried by an `INIT` message.
    /// Out-of-table identifiers produce `ERROR` with message `"unknown
    /// task"`.
    pub fn resolve(&self, set: &TaskSet) -> Result<ResolvedTasks> {
        let init = self
            .init
            .get(&set.init)
            .cloned()
            .ok_or_else(|| BgpyError::UnknownTask(set.init.clone()))?;
        let exec = self
            .exec
            .get(&set.exec)
            .cloned()
            .ok_or_else(|| BgpyError::UnknownTask(set.exec.clone()))?;
        let exit = self
            .exit
            .get(&set.exit)
            .cloned()
            .ok_or_else(|| BgpyError::UnknownTask(set.exit.clone()))?;
        Ok(ResolvedTasks { init, exec, exit })
    }
}

/// The three task handles a session holds once `INIT` has resolved them
/// against the registry.
#[derive(Clone)]
pub struct ResolvedTasks {
    pub init: Arc<dyn InitTask>,
    pub exec: Arc<dyn ExecTask>,
    pub exit: Arc<dyn ExecTask>,
}

/// An init-file descriptor: three registry identifiers loaded from disk so
/// a server can pre-initialize before its accept loop starts. A small TOML
/// shape a deployment would hand-write.
#[derive(Debug, Deserialize)]
pub struct InitFile {
    pub init_task: String,
    pub exec_task: String,
    pub exit_task: String,
}

impl InitFile {
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| BgpyError::Config(e.to_string()))
    }

    pub fn into_task_set(self) -> TaskSet {
        TaskSet {
            init: self.init_task,
            exec: self.exec_task,
            exit: self.exit_task,
        }
    }
}
