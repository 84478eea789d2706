// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::time::Duration;

use tokio::net::UnixStream;
use tracing::{debug, info};

use crate::connection::Connection;
use crate::dialer::{bounded_dial, Dial};
use crate::handshake::hybrid_handshake;
use crate::vsock;
use vmconn_common::address::{parse, DialString, Scheme};
use vmconn_common::error::{Result, TransportError};
use vmconn_common::resolve::{resolve_hybrid, resolve_unix, resolve_vsock};

#[derive(Debug, Clone)]
pub struct UnixDialer {
    pub path: PathBuf,
}

impl Dial for UnixDialer {
    type Conn = Connection;

    async fn attempt(&self) -> Result<Connection> {
        Ok(UnixStream::connect(&self.path).await?.into())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VsockDialer {
    pub cid: u32,
    pub port: u32,
}

impl Dial for VsockDialer {
    type Conn = Connection;

    async fn attempt(&self) -> Result<Connection> {
        Ok(Connection::Vsock(vsock::dial(self.cid, self.port).await?))
    }
}

/// UNIX connect to the proxy followed by the `CONNECT` handshake, as one
/// attempt: a failed handshake means the next attempt starts from a fresh socket.
#[derive(Debug, Clone)]
pub struct HybridVsockDialer {
    pub path: PathBuf,
    pub port: u32,
}

impl Dial for HybridVsockDialer {
    type Conn = Connection;

    async fn attempt(&self) -> Result<Connection> {
        let stream = UnixStream::connect(&self.path).await?;
        let stream = hybrid_handshake(stream, self.port).await?;
        Ok(stream.into())
    }
}

/// Dial whatever `dial` points to, retrying until `timeout`.
///
/// Hybrid vsock dial strings without `:<port>` use the port captured when
/// the address was parsed.
///
/// # Errors
/// * `InvalidArgument` if the dial string cannot be resolved
/// * `DeadlineExceeded` if no connection was made in time
/// * `Unimplemented` for vsock on platforms without it
pub async fn dial(dial: &DialString, timeout: Duration) -> Result<Connection> {
    debug!("Dialing {dial} with timeout {timeout:?}");
    let conn = match dial.scheme() {
        Scheme::Unix => {
            let path = resolve_unix(dial.as_str());
            let msg = format!("timed out connecting to unix socket {}", path.display());
            bounded_dial(timeout, UnixDialer { path }, msg).await?
        }
        Scheme::Vsock => {
            let (cid, port) = resolve_vsock(dial.as_str())?;
            let msg = format!("timed out connecting to vsock {cid}:{port}");
            bounded_dial(timeout, VsockDialer { cid, port }, msg).await?
        }
        Scheme::HybridVsock => {
            let (path, port) = resolve_hybrid(dial.as_str())?;
            let port = port.or(dial.hybrid_port()).ok_or_else(|| {
                TransportError::InvalidArgument(format!("Missing hybrid vsock port: {dial}"))
            })?;
            let msg = format!("timed out connecting to hybrid vsocket {dial}");
            bounded_dial(timeout, HybridVsockDialer { path, port }, msg).await?
        }
    };
    info!("Connected to {dial}");
    Ok(conn)
}

/// Parse `address` and [`dial`] it
///
/// # Errors
/// Same as [`parse`] and [`dial`]
pub async fn connect(address: &str, timeout: Duration) -> Result<Connection> {
    let (dial_string, _) = parse(address)?;
    dial(&dial_string, timeout).await
}
