// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Largest acknowledgement the proxy sends back after `CONNECT`
pub const ACK_MAX_LEN: usize = 32;

/// Ask a hybrid vsock proxy to forward this UNIX connection to guest `port`.
///
/// The proxy multiplexes every guest port over one socket, so `CONNECT <port>\n`
/// MUST be the first thing sent. It answers with a short acknowledgement
/// (`OK <host port>\n` on Firecracker) whose content is not inspected.
/// On failure the stream is dropped, which closes it; there is no retry here.
///
/// # Errors
/// Fails if the write fails, the read fails, or the proxy hangs up instead of acknowledging
pub async fn hybrid_handshake<S>(mut stream: S, port: u32) -> io::Result<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(format!("CONNECT {port}\n").as_bytes())
        .await?;

    let mut ack = [0u8; ACK_MAX_LEN];
    let len = stream.read(&mut ack).await?;
    if len == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("hybrid vsock proxy closed connection before acknowledging port {port}"),
        ));
    }
    debug!(
        "Hybrid vsock port {port} acknowledged: {ack:?}",
        ack = String::from_utf8_lossy(&ack[..len])
    );
    Ok(stream)
}
