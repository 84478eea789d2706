// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use anyhow::Context;
use hyper_util::rt::TokioIo;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;
use tracing::info;

use crate::transport;
use vmconn_common::address::{parse, Address, DialString};
use vmconn_common::error::{Result, TransportError};

pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(3);

// Bogus url, to make tonic connector happy. Real destination is in the dial string
const PLACEHOLDER_URL: &str = "http://[::]:50051";

#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub address: Address,
    pub dial: DialString,
    pub timeout: Duration,
}

impl EndpointConfig {
    /// # Errors
    /// `InvalidArgument` if `address` does not parse
    pub fn new(address: &str) -> Result<Self> {
        let (dial, address) = parse(address)?;
        Ok(Self {
            address,
            dial,
            timeout: DEFAULT_DIAL_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Open a gRPC channel through our own dialer instead of tonic's.
    ///
    /// Blocks until the first connection is up or `timeout` runs out.
    ///
    /// # Errors
    /// Fails if no connection could be made within `timeout`
    pub async fn connect(&self) -> anyhow::Result<Channel> {
        info!("Connecting to {} via {}", self.address, self.dial);
        let endpoint = Endpoint::try_from(PLACEHOLDER_URL)?
            .connect_timeout(self.timeout)
            .concurrency_limit(30);

        let dial = self.dial.clone();
        let timeout = self.timeout;
        let connecting = endpoint.connect_with_connector(service_fn(move |_: Uri| {
            let dial = dial.clone();
            async move { transport::dial(&dial, timeout).await.map(TokioIo::new) }
        }));

        let channel = tokio::time::timeout(self.timeout, connecting)
            .await
            .map_err(|_| {
                TransportError::DeadlineExceeded(format!(
                    "timed out connecting to {}",
                    self.address
                ))
            })?
            .with_context(|| format!("Connecting to {}", self.address))?;
        Ok(channel)
    }
}
