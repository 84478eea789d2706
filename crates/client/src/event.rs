// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use tonic::transport::Channel;
use tracing::debug;

use crate::endpoint::{EndpointConfig, DEFAULT_DIAL_TIMEOUT};
use vmconn_common::pb::event::event_service_client::EventServiceClient;
use vmconn_common::pb::Empty;

type Client = EventServiceClient<Channel>;

/// Client side of the agent event service, reachable over any supported socket.
#[derive(Debug, Clone)]
pub struct EventClient {
    client: Client,
}

impl EventClient {
    /// Connect to the event server at `address`, see [`vmconn_common::address::parse`]
    /// # Errors
    /// Fails if address is invalid or unable to connect within 3 seconds
    pub async fn connect(address: &str) -> anyhow::Result<Self> {
        Self::connect_with_timeout(address, DEFAULT_DIAL_TIMEOUT).await
    }

    /// # Errors
    /// Fails if address is invalid or unable to connect within `timeout`
    pub async fn connect_with_timeout(address: &str, timeout: Duration) -> anyhow::Result<Self> {
        let endpoint = EndpointConfig::new(address)?.with_timeout(timeout);
        let channel = endpoint.connect().await?;
        Ok(Self {
            client: Client::new(channel),
        })
    }

    /// Tell the event server that we finished initialization
    /// # Errors
    /// Fails on RPC error
    pub async fn ready(&mut self) -> anyhow::Result<()> {
        debug!("Sending Ready");
        self.client.ready(Empty {}).await?;
        Ok(())
    }

    /// Close the underlying channel
    pub fn close(self) {
        drop(self.client);
    }
}
