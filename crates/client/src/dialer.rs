// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

//! Retry-until-deadline connect.
//!
//! This bypasses tonic's own reconnect backoff: there are few concurrent
//! dialers, and exponential backoff would only stretch sandbox boot time.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

use vmconn_common::error::{Result, TransportError};

/// One way of producing a connection, tried over and over by [`bounded_dial`].
pub trait Dial: Send + Sync + 'static {
    type Conn: Send + 'static;

    /// A single connect attempt. Transient failures are `TransportError::Io`;
    /// fatal ones (see [`TransportError::is_fatal`]) stop the retry loop.
    fn attempt(&self) -> impl Future<Output = Result<Self::Conn>> + Send;
}

/// Call `dialer.attempt()` back to back until one succeeds or `timeout` elapses.
///
/// Each attempt is itself cut at the deadline, and the attempting task is
/// aborted when the caller gives up, so a stuck `connect(2)` never outlives
/// the call. At most one connection reaches the caller; one that shows up
/// after the deadline is dropped (closed).
///
/// # Errors
/// * `DeadlineExceeded(timeout_msg)` if nothing connected in time
/// * fatal attempt errors, returned as soon as they occur
pub async fn bounded_dial<D: Dial>(
    timeout: Duration,
    dialer: D,
    timeout_msg: impl Into<String>,
) -> Result<D::Conn> {
    let deadline = Instant::now() + timeout;
    let (tx, mut rx) = oneshot::channel();

    let attempts = task::spawn(async move {
        let mut tries: u64 = 0;
        let outcome = loop {
            tries += 1;
            match time::timeout_at(deadline, dialer.attempt()).await {
                Ok(Ok(conn)) => break Ok(conn),
                Ok(Err(err)) if err.is_fatal() => break Err(err),
                Ok(Err(err)) => trace!("Dial attempt {tries} failed: {err}"),
                Err(_) => {
                    debug!("Dial attempt {tries} cut by deadline");
                    return;
                }
            }
            if tx.is_closed() {
                return;
            }
            task::yield_now().await;
        };
        if outcome.is_ok() && Instant::now() >= deadline {
            warn!("Connected after {tries} attempts, but past deadline; closing");
            return;
        }
        debug!("Dial finished after {tries} attempts");
        // Receiver gone means caller timed out meanwhile, connection drops here
        let _ = tx.send(outcome);
    });

    tokio::select! {
        biased;
        outcome = &mut rx => match outcome {
            Ok(outcome) => outcome,
            Err(_) => Err(TransportError::DeadlineExceeded(timeout_msg.into())),
        },
        () = time::sleep_until(deadline) => {
            attempts.abort();
            Err(TransportError::DeadlineExceeded(timeout_msg.into()))
        }
    }
}
