//! Shared-secret auth token helpers.

use rand::Rng;

use crate::environment::ENV_TOKEN;

/// Generates a new URL-safe random token of `length` bytes of entropy
/// (base64-encoded, so the string is somewhat longer than `length`).
pub fn create(length: usize) -> String {
    let bytes: Vec<u8> = (0..length).map(|_| rand::thread_rng().gen()).collect();
    base64::encode_config(bytes, base64::URL_SAFE_NO_PAD)
}

/// Reads the shared token from the `BGPY_TOKEN` environment variable, if set.
pub fn from_env() -> Option<String> {
    std::env::var(ENV_TOKEN).ok()
}

/// Sets `BGPY_TOKEN` in this process's environment, for child processes
/// spawned afterwards (e.g. by `Server::run_background`) to inherit.
pub fn set_env(token: &str) {
    std::env::set_var(ENV_TOKEN, token);
}

/// Removes `BGPY_TOKEN` from this process's environment.
pub fn clear_env() {
    std::env::remove_var(ENV_TOKEN);
}

/// Constant-time comparison of a client-supplied token against the
/// server's configured secret. Ordinary `==` on `&str` short-circuits on
/// the first differing byte, which leaks timing information about how much
/// of the secret the client guessed correctly; a shared-secret handshake
/// should not do that.
pub fn verify(configured: &str, supplied: &str) -> bool {
    let configured = configured.as_bytes();
    let supplied = supplied.as_bytes();
    if configured.len() != supplied.len() {
        return false;
    }
    let mut diff = 0u8;
    for (a, b) in configured.iter().zip(supplied.iter()) {
        diff |= a ^ b;
    }
    diff == 0
}

/// Prompts for a token on stdin (used by the `-t` CLI flag), echoing input
/// since this crate has no interactive-terminal dependency in its stack.
pub fn prompt() -> std::io::Result<String> {
    use std::io::Write;
    print!("Token: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
