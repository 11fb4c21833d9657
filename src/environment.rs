//! Named constants shared by the client, server and wire codec: paths
//! under a per-user home directory, socket defaults, and network buffer
//! sizing.

use directories::ProjectDirs;
use std::path::PathBuf;
use std::time::Duration;

/// Address a server listens on by default.
pub const HOST: &str = "127.0.0.1";

/// Port a server listens on by default.
pub const PORT: u16 = 54321;

/// Size of the kernel backlog/queue of pending connections.
pub const BACKLOG_SIZE: u32 = 3;

/// Time to sleep after sending a message, so a slow receiver finishes its read
/// before the next send lands on the wire. Part of the wire contract, not an
/// implementation detail: removing it changes observable framing behavior.
pub const SEND_DELAY: Duration = Duration::from_millis(100);

/// Time a client waits after `terminate()`/`run_background()` for the server
/// to release its port or finish binding.
pub const STARTUP_TIME: Duration = Duration::from_secs(1);

/// Width of the length header prefixing every frame.
pub const HEADER_SIZE: usize = 16;

/// Maximum chunk size read from the network buffer at a time.
pub const BUFFER_SIZE: usize = 2048;

/// Default `tracing` filter directive when `--log-level` is not given.
pub const LOG_LEVEL: &str = "INFO";

/// Environment variable carrying the shared-secret auth token.
pub const ENV_TOKEN: &str = "BGPY_TOKEN";

/// The organization/application pair used to resolve a per-user state
/// directory (`~/.bgpy` on most platforms).
const ORGANIZATION: &str = "";
const APPLICATION: &str = "bgpy";

/// Default directory for log files and other process-local state.
pub fn home_dir() -> Option<PathBuf> {
    ProjectDirs::from(ORGANIZATION, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Default log file path (`<home>/bgpy.log`), used when `--log-file` is not
/// given but the caller still wants persistent logs (e.g. `run_background`,
/// which has no terminal to observe).
pub fn default_log_file() -> Option<PathBuf> {
    home_dir().map(|dir| dir.join("bgpy.log"))
}
