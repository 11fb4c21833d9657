//! Binding and sequential accept: bind with address reuse, listen with a
//! small backlog, accept one connection at a time.
//!
//! The real bound on concurrency is that the accept loop (`server.rs`)
//! awaits one session to completion before calling [`Listener::accept`]
//! again; the backlog (`environment::BACKLOG_SIZE`) only governs how many
//! pending connections the kernel queues while a session is in flight.

use std::net::SocketAddr;

use tokio::net::{lookup_host, TcpListener, TcpSocket, TcpStream};
use tracing::info;

use crate::environment::BACKLOG_SIZE;
use crate::error::{BgpyError, Result};

pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Binds `host:port`. Bind failure is fatal and propagates to the
    /// caller.
    pub async fn bind(host: &str, port: u16) -> Result<Self> {
        let addr = format!("{host}:{port}");
        let to_bind_err = |source: std::io::Error| BgpyError::Bind {
            host: host.to_string(),
            port,
            source,
        };

        let resolved: SocketAddr = lookup_host(&addr)
            .await
            .map_err(to_bind_err)?
            .next()
            .ok_or_else(|| {
                to_bind_err(std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "address resolved to no candidates",
                ))
            })?;

        let socket = if resolved.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(to_bind_err)?;
        socket.set_reuseaddr(true).map_err(to_bind_err)?;
        socket.bind(resolved).map_err(to_bind_err)?;
        let inner = socket.listen(BACKLOG_SIZE).map_err(to_bind_err)?;

        info!("listening on {addr}");
        Ok(Listener { inner })
    }

    /// The bound address, useful when binding to port 0 for tests.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.inner.local_addr()
    }

    /// Accepts the next connection. There is no concurrent accept: callers
    /// must finish dispatching one connection before calling this again.
    pub async fn accept(&self) -> Result<TcpStream> {
        let (stream, addr) = self.inner.accept().await?;
        info!("accepted connection from {addr}");
        Ok(stream)
    }
}
