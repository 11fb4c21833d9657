//! The server façade: the accept loop, optional file-based
//! pre-initialization, and the background-spawn helper.

use std::path::Path;

use tokio::process::Command;
use tokio::time::sleep;
use tracing::{error, info};

use crate::environment::STARTUP_TIME;
use crate::error::Result;
use crate::listener::Listener;
use crate::session::{handle_connection, ServerState};
use crate::task::{InitFile, TaskRegistry};

/// Owns the listening socket, the compiled-in task registry, and the
/// lifetime state (`initialized`/`should_exit`) that persists across
/// successive accepted connections.
pub struct Server {
    listener: Listener,
    registry: TaskRegistry,
    token: Option<String>,
    state: ServerState,
}

impl Server {
    /// Binds `host:port`. Bind failure is fatal and propagates to the caller.
    pub async fn bind(
        host: &str,
        port: u16,
        registry: TaskRegistry,
        token: Option<String>,
    ) -> Result<Self> {
        let listener = Listener::bind(host, port).await?;
        Ok(Server {
            listener,
            registry,
            token,
            state: ServerState::new(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Loads an init-file descriptor naming three already-registered task
    /// identifiers and runs its `init_task` once, marking the server
    /// initialized before the accept loop starts. A subsequent client
    /// `INIT` is then rejected as "Already initialized."
    pub async fn with_init_file(mut self, path: &Path) -> Result<Self> {
        let set = InitFile::load(path)?.into_task_set();
        let resolved = self.registry.resolve(&set)?;
        let initial_state = resolved.init.call().await;
        self.state.preinitialize(resolved, initial_state);
        info!("pre-initialized from {}", path.display());
        Ok(self)
    }

    /// Runs the accept loop until `EXIT` is dispatched. Each accepted
    /// connection is driven to completion before the next `accept()` call,
    /// so there is never more than one live session. A session-level error
    /// (a framing error, a mid-session I/O error) closes that connection and
    /// is logged; it does not stop the server from accepting the next one.
    pub async fn run(mut self) -> Result<()> {
        loop {
            let stream = self.listener.accept().await?;
            match handle_connection(
                stream,
                &mut self.state,
                &self.registry,
                self.token.as_deref(),
            )
            .await
            {
                Ok(()) => {}
                Err(e) => error!("session ended in error: {e}"),
            }
            if self.state.should_exit {
                info!("EXIT dispatched, leaving accept loop");
                break;
            }
        }
        Ok(())
    }

    /// Spawns a fresh `bgpy server HOST PORT [flags]` child process with the
    /// same host/port/log configuration, then sleeps [`STARTUP_TIME`] to
    /// give it time to bind before returning. Used by test harnesses so one
    /// program can both host and drive a server.
    pub async fn run_background(
        host: &str,
        port: u16,
        log_level: Option<&str>,
        log_file: Option<&Path>,
        init_file: Option<&Path>,
    ) -> Result<()> {
        let exe = std::env::current_exe()?;
        let mut command = Command::new(exe);
        command.arg("server").arg(host).arg(port.to_string());
        if let Some(level) = log_level {
            command.arg("--log-level").arg(level);
        }
        if let Some(file) = log_file {
            command.arg("--log-file").arg(file);
        }
        if let Some(file) = init_file {
            command.arg("--init-file").arg(file);
        }
        command.spawn()?;
        sleep(STARTUP_TIME).await;
        Ok(())
    }
}
