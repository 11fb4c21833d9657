//! The counter demo tasks shipped with this crate, registered as `"init"`,
//! `"exec"`, and `"exit"` in [`registry`].
//!
//! `init_task` seeds `{request_count: 0, value: 1000}`; `exec_task` bumps
//! `request_count` and applies an `increase`/`decrease` command to `value`;
//! `exit_task` bumps `request_count` once more, sets `status`, and emits it
//! as a second response via [`crate::client::respond`] before returning.
//! This is what `bgpy server` registers by default (the CLI binary has no
//! other source of application tasks to run), and what
//! `demos/counter_tasks.rs` drives end to end.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::endpoint::Endpoint;
use crate::task::{ExecTask, FnInitTask, TaskRegistry};

pub const INIT: &str = "init";
pub const EXEC: &str = "exec";
pub const EXIT: &str = "exit";

async fn init_task() -> Value {
    json!({"request_count": 0, "value": 1000})
}

struct CounterExec;

#[async_trait]
impl ExecTask for CounterExec {
    async fn call(&self, _endpoint: &mut Endpoint, mut state: Value, args: &Map<String, Value>) -> Value {
        let count = state["request_count"].as_i64().unwrap_or(0) + 1;
        state["request_count"] = json!(count);

        let change = args
            .get("value_change")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        let value = state["value"].as_i64().unwrap_or(0);
        let value = match args.get("command").and_then(Value::as_str) {
            Some("increase") => value + change,
            Some("decrease") => value - change,
            _ => value,
        };
        state["value"] = json!(value);
        state
    }
}

struct CounterExit;

#[async_trait]
impl ExecTask for CounterExit {
    async fn call(&self, endpoint: &mut Endpoint, mut state: Value, _args: &Map<String, Value>) -> Value {
        let count = state["request_count"].as_i64().unwrap_or(0) + 1;
        state["request_count"] = json!(count);
        state["status"] = json!("Exited.");

        if let Value::Object(ref map) = state {
            let _ = crate::client::respond(endpoint, map.clone()).await;
        }
        state
    }
}

/// Builds a registry containing this module's `init`/`exec`/`exit` trio
/// under the identifiers [`INIT`], [`EXEC`], [`EXIT`].
pub fn registry() -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    registry.register_init(INIT, FnInitTask(init_task));
    registry.register_exec(EXEC, CounterExec);
    registry.register_exit(EXIT, CounterExit);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskSet;

    #[tokio::test]
    async fn init_task_seeds_counter_state() {
        let registry = registry();
        let resolved = registry
            .resolve(&TaskSet {
                init: INIT.to_string(),
                exec: EXEC.to_string(),
                exit: EXIT.to_string(),
            })
            .unwrap();
        assert_eq!(
            resolved.init.call().await,
            json!({"request_count": 0, "value": 1000})
        );
    }
}
