// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

pub mod event_server;

pub mod pb {
    pub use vmconn_common::pb::*;
}
pub use vmconn_client::endpoint;
pub use vmconn_common::address;

const LOG_ENV: &str = "VMCONN_LOG";

/// Filter from `VMCONN_LOG`, falls back to `info` if unset or malformed
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Init logging: stderr always, plus journald when stderr is wired to the journal
///
/// # Errors
///
/// Will return `Err` if logging was already initialized
pub fn trace_init() -> anyhow::Result<()> {
    let filter = log_filter();
    let verbose = filter
        .max_level_hint()
        .is_some_and(|level| level >= Level::DEBUG);

    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_file(verbose)
        .with_line_number(verbose);
    let stderr = if verbose {
        stderr.pretty().boxed()
    } else {
        stderr.compact().boxed()
    };

    // systemd sets JOURNAL_STREAM for services whose stderr goes to the journal
    let journald = std::env::var_os("JOURNAL_STREAM")
        .and_then(|_| tracing_journald::layer().ok())
        .map(|layer| layer.with_syslog_identifier("vmconn".to_owned()));

    tracing_subscriber::registry()
        .with(journald.with_filter(LevelFilter::INFO))
        .with(stderr.with_filter(filter))
        .try_init()
        .context("logging is already initialized")
}
