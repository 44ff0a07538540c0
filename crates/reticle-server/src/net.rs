// SPDX-License-Identifier: Apache-2.0
//! TCP transport: newline-delimited JSON-RPC over a listener socket.
//!
//! Lines are pulled out of a growing receive buffer; a line that outgrows
//! the configured cap closes the connection. One client holds the session
//! at a time, and session state survives disconnects, so a client can
//! build a layout, drop the link, and query it from a fresh connection.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

use crate::service::{handle_line, Session};

/// Listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind.
    pub listen: SocketAddr,
    /// Close the connection when a single line grows past this many bytes.
    pub max_line_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 7878)),
            max_line_bytes: 1024 * 1024,
        }
    }
}

/// Accepting server: one shared session, one client at a time.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    session: Arc<Mutex<Session>>,
    max_line_bytes: usize,
    gate: Arc<Semaphore>,
}

impl Server {
    /// Binds the listener. The session starts with no layout.
    ///
    /// # Errors
    /// Propagates the bind failure.
    pub async fn bind(config: &ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(config.listen).await?;
        Ok(Self {
            listener,
            session: Arc::new(Mutex::new(Session::new())),
            max_line_bytes: config.max_line_bytes,
            gate: Arc::new(Semaphore::new(1)),
        })
    }

    /// The bound address. Useful after binding port 0 in tests.
    ///
    /// # Errors
    /// Propagates the socket query failure.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts and serves clients until the task is cancelled or the
    /// listener fails.
    ///
    /// # Errors
    /// Propagates accept failures; per-connection I/O errors only end that
    /// connection.
    pub async fn run(&self) -> io::Result<()> {
        info!(addr = %self.local_addr()?, "listening");
        loop {
            let (stream, peer) = self.listener.accept().await?;
            match Arc::clone(&self.gate).try_acquire_owned() {
                Ok(permit) => {
                    info!(%peer, "client connected");
                    let session = Arc::clone(&self.session);
                    let max_line_bytes = self.max_line_bytes;
                    tokio::spawn(async move {
                        if let Err(e) = serve_client(stream, session, max_line_bytes).await {
                            debug!(%peer, error = %e, "connection error");
                        }
                        info!(%peer, "client disconnected");
                        drop(permit);
                    });
                }
                Err(_) => {
                    warn!(%peer, "another client holds the session, closing");
                    drop(stream);
                }
            }
        }
    }
}

/// Reads lines, dispatches them, writes responses. Returns on clean EOF,
/// on an oversized line, or with the socket error.
async fn serve_client(
    stream: TcpStream,
    session: Arc<Mutex<Session>>,
    max_line_bytes: usize,
) -> io::Result<()> {
    let (mut reader, mut writer) = stream.into_split();
    let mut acc: Vec<u8> = Vec::new();
    let mut buf = vec![0_u8; 16 * 1024];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        acc.extend_from_slice(&buf[..n]);

        while let Some(pos) = acc.iter().position(|&b| b == b'\n') {
            if pos >= max_line_bytes {
                warn!(bytes = pos, "line exceeds the size cap, closing");
                return Ok(());
            }
            let raw: Vec<u8> = acc.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw);
            let line = text.trim();
            if line.is_empty() {
                continue;
            }
            // Lock held for dispatch only, never across socket writes.
            let reply = {
                let mut session = session.lock().await;
                handle_line(&mut session, line)
            };
            if let Some(reply) = reply {
                writer.write_all(reply.as_bytes()).await?;
                writer.write_all(b"\n").await?;
            }
        }

        if acc.len() > max_line_bytes {
            warn!(bytes = acc.len(), "line exceeds the size cap, closing");
            return Ok(());
        }
    }
}
