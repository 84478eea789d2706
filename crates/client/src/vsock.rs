// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

//! Platform VM socket facility. Everywhere but Linux all entry points fail
//! with `Unimplemented`.

use std::time::Duration;

use vmconn_common::error::{Result, TransportError};

pub const VMADDR_CID_ANY: u32 = u32::MAX;
pub const VMADDR_CID_HYPERVISOR: u32 = 0;
pub const VMADDR_CID_LOCAL: u32 = 1;
pub const VMADDR_CID_HOST: u32 = 2;
pub const VMADDR_PORT_ANY: u32 = u32::MAX;

pub use platform::{VsockListener, VsockStream};

/// Listen on `port` of any local CID, `VMADDR_PORT_ANY` picks an ephemeral port
///
/// # Errors
/// Fails if bind fails, or on platforms without vsock
pub fn listen(port: u32) -> Result<VsockListener> {
    platform::listen(port)
}

/// # Errors
/// Fails if connect fails, or on platforms without vsock
pub async fn dial(cid: u32, port: u32) -> Result<VsockStream> {
    platform::dial(cid, port).await
}

/// # Errors
/// Fails if connect fails or does not finish within `timeout`, or on platforms without vsock
pub async fn dial_with_timeout(cid: u32, port: u32, timeout: Duration) -> Result<VsockStream> {
    match tokio::time::timeout(timeout, dial(cid, port)).await {
        Ok(res) => res,
        Err(_) => Err(TransportError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            format!("vsock connect to {cid}:{port} timed out"),
        ))),
    }
}

#[cfg(target_os = "linux")]
mod platform {
    use tokio_vsock::VsockAddr;
    use tracing::debug;

    use super::{Result, VMADDR_CID_ANY};

    pub use tokio_vsock::VsockStream;

    pub struct VsockListener {
        inner: tokio_vsock::VsockListener,
        port: u32,
    }

    impl VsockListener {
        #[must_use]
        pub fn port(&self) -> u32 {
            self.port
        }

        /// # Errors
        /// Fails if `accept(2)` fails
        pub async fn accept(&mut self) -> Result<VsockStream> {
            let (stream, peer) = self.inner.accept().await?;
            debug!("Accepted vsock connection from {}:{}", peer.cid(), peer.port());
            Ok(stream)
        }
    }

    pub(super) fn listen(port: u32) -> Result<VsockListener> {
        let inner = tokio_vsock::VsockListener::bind(VsockAddr::new(VMADDR_CID_ANY, port))?;
        let port = inner.local_addr()?.port();
        Ok(VsockListener { inner, port })
    }

    pub(super) async fn dial(cid: u32, port: u32) -> Result<VsockStream> {
        Ok(VsockStream::connect(VsockAddr::new(cid, port)).await?)
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

    use super::{Result, TransportError};

    fn unimplemented() -> TransportError {
        TransportError::Unimplemented(format!(
            "vsock: not implemented on {}/{}",
            std::env::consts::OS,
            std::env::consts::ARCH
        ))
    }

    /// Never constructed on this platform
    #[derive(Debug)]
    pub enum VsockStream {}

    pub enum VsockListener {}

    impl VsockListener {
        #[must_use]
        pub fn port(&self) -> u32 {
            match *self {}
        }

        /// # Errors
        /// Never returns
        pub async fn accept(&mut self) -> Result<VsockStream> {
            match *self {}
        }
    }

    impl AsyncRead for VsockStream {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match *self {}
        }
    }

    impl AsyncWrite for VsockStream {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            match *self {}
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            match *self {}
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            match *self {}
        }
    }

    pub(super) fn listen(_port: u32) -> Result<VsockListener> {
        Err(unimplemented())
    }

    pub(super) async fn dial(_cid: u32, _port: u32) -> Result<VsockStream> {
        Err(unimplemented())
    }
}
