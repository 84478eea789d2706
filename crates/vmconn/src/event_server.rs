// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::{bail, Context};
use async_channel::{Receiver, Sender};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tonic::transport::server::Connected;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::{debug, error, info};

use crate::pb::event::event_service_server::{self, EventServiceServer};
use crate::pb::Empty;
use vmconn_client::vsock::{self, VMADDR_PORT_ANY};
use vmconn_client::Connection;

pub const READY_EVENT: &str = "Ready";

#[derive(Debug, Clone)]
struct EventService {
    events: Sender<String>,
}

#[tonic::async_trait]
impl event_service_server::EventService for EventService {
    async fn ready(&self, _request: Request<Empty>) -> Result<Response<Empty>, Status> {
        debug!("Peer reported {READY_EVENT}");
        // Capacity one: the call completes only once the previous event was taken
        self.events
            .send(READY_EVENT.to_owned())
            .await
            .map_err(|_| Status::unavailable("nobody is waiting for events"))?;
        Ok(Response::new(Empty {}))
    }
}

/// Receives `Ready` notifications from a peer on an ephemeral vsock port.
pub struct EventServer {
    pub port: u32,
    pub events: Receiver<String>,
    serving: JoinHandle<()>,
}

impl EventServer {
    /// Listen on an ephemeral vsock port and start serving in background.
    /// Must be called within tokio runtime.
    /// # Errors
    /// Fails if vsock is unavailable or no usable port was bound
    pub fn start() -> anyhow::Result<Self> {
        let mut listener = vsock::listen(VMADDR_PORT_ANY).context("Listening on vsock")?;
        let port = listener.port();
        if port == 0 {
            // listener dropped here, releasing the socket
            bail!("vsock listener bound to invalid port 0");
        }
        info!("Event server listening on vsock port {port}");

        let incoming = async_stream::stream! {
            loop {
                yield listener.accept().await.map(Connection::Vsock);
            }
        };
        Ok(Self::serve_on(port, incoming))
    }

    /// Serve the event service on an arbitrary stream of connections,
    /// reporting `port` as the bound port
    pub fn serve_on<I, IO, IE>(port: u32, incoming: I) -> Self
    where
        I: Stream<Item = Result<IO, IE>> + Send + 'static,
        IO: AsyncRead + AsyncWrite + Connected + Unpin + Send + 'static,
        IO::ConnectInfo: Clone + Send + Sync + 'static,
        IE: Into<Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
    {
        let (tx, rx) = async_channel::bounded(1);
        let service = EventServiceServer::new(EventService { events: tx });
        let serving = tokio::spawn(async move {
            if let Err(e) = Server::builder()
                .add_service(service)
                .serve_with_incoming(incoming)
                .await
            {
                error!("Event server failed: {e}");
            }
        });
        Self {
            port,
            events: rx,
            serving,
        }
    }

    /// Stop serving, in-flight `Ready` calls are dropped
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for EventServer {
    fn drop(&mut self) {
        self.serving.abort();
    }
}
