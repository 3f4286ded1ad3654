// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loopback server for connection-level assertions.
//!
//! `LoopbackServer` binds 127.0.0.1 on an ephemeral port, counts every TCP
//! connection it accepts and answers each with a fixed `200 ok` response, so
//! tests can assert both that a request landed and that a dial never did.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::debug;

const RESPONSE: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\nok";

/// A minimal HTTP responder on the loopback interface.
pub struct LoopbackServer {
    addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl LoopbackServer {
    /// Bind and start accepting in the background.
    pub async fn start() -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);

        let handle = tokio::spawn(async move {
            while let Ok((mut stream, peer)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                debug!(%peer, "loopback server accepted connection");
                tokio::spawn(async move {
                    let mut buf = [0u8; 2048];
                    let _ = stream.read(&mut buf).await;
                    let _ = stream.write_all(RESPONSE).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Ok(Self {
            addr,
            accepted,
            handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// `http://<host>:<port>` for the given host name or literal.
    pub fn url_for(&self, host: &str) -> String {
        format!("http://{host}:{}/", self.port())
    }

    /// Number of TCP connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

impl Drop for LoopbackServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
