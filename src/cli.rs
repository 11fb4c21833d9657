//! The `bgpy` command-line front-end: `server`, `terminate`, and `version`
//! subcommands.

use std::path::PathBuf;
use structopt::StructOpt;

/// A supervised background-process container: launch it, hand it task
/// procedures, drive it with request/response commands, and terminate it.
#[derive(Debug, StructOpt)]
#[structopt(name = "bgpy")]
pub enum Cli {
    /// Run a bgpy server, listening for client connections.
    ///
    /// Before a client calls `initialize()`, the server will warn and
    /// ignore any `EXEC`/`EXIT` it receives, unless `--init-file` was given.
    Server(Server),

    /// Send `EXIT` to a running bgpy server.
    Terminate(Terminate),

    /// Print the package version and exit.
    Version,
}

#[derive(Debug, StructOpt)]
#[non_exhaustive]
pub struct Server {
    /// Address the server listens on.
    #[structopt(default_value = "127.0.0.1")]
    pub host: String,

    /// Port the server listens on.
    #[structopt(default_value = "54321")]
    pub port: u16,

    /// `tracing` filter directive, e.g. "info" or "debug". Defaults to
    /// `environment::LOG_LEVEL` when not given.
    #[structopt(long)]
    pub log_level: Option<String>,

    /// Append logs to this file in addition to stdout/stderr. Defaults to
    /// `environment::default_log_file()` when not given, since a
    /// backgrounded server has no terminal to observe.
    #[structopt(long)]
    pub log_file: Option<PathBuf>,

    /// Pre-initialize from a TOML file naming three registered task
    /// identifiers (`init_task`, `exec_task`, `exit_task`), before the
    /// accept loop starts.
    #[structopt(long)]
    pub init_file: Option<PathBuf>,

    /// Prompt for a shared-secret token on stdin, rather than reading
    /// `BGPY_TOKEN` from the environment.
    #[structopt(short = "t", long = "token")]
    pub prompt_token: bool,
}

#[derive(Debug, StructOpt)]
#[non_exhaustive]
pub struct Terminate {
    /// Address of the server to terminate.
    #[structopt(default_value = "127.0.0.1")]
    pub host: String,

    /// Port of the server to terminate.
    #[structopt(default_value = "54321")]
    pub port: u16,

    /// `tracing` filter directive, e.g. "info" or "debug". Defaults to
    /// `environment::LOG_LEVEL` when not given.
    #[structopt(long)]
    pub log_level: Option<String>,

    /// Append logs to this file in addition to stdout/stderr.
    #[structopt(long)]
    pub log_file: Option<PathBuf>,

    /// Prompt for a shared-secret token on stdin, rather than reading
    /// `BGPY_TOKEN` from the environment.
    #[structopt(short = "t", long = "token")]
    pub prompt_token: bool,
}

/// Resolves a `-t`/`BGPY_TOKEN` pair into the token a connection should
/// authenticate with, if any.
pub fn resolve_token(prompt_token: bool) -> std::io::Result<Option<String>> {
    if prompt_token {
        Ok(Some(crate::token::prompt()?))
    } else {
        Ok(crate::token::from_env())
    }
}
