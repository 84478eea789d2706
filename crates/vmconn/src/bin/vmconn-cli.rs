// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use vmconn::address::parse;
use vmconn::event_server::EventServer;
use vmconn_client::{transport, EventClient};

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "vmconn-cli")]
#[command(about = "Reach RPC servers inside VM sandboxes over unix, vsock or hybrid vsock", long_about = None)]
struct Cli {
    #[arg(
        long,
        env = "VMCONN_TIMEOUT_MS",
        default_value_t = 3000,
        help = "Give up connecting after this many milliseconds"
    )]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check that a raw connection can be made
    Probe {
        #[arg(
            long,
            env = "VMCONN_ADDR",
            help = "unix://<path>, vsock://<cid>:<port>, hvsock://<path>:<port> or <path>"
        )]
        addr: String,
    },
    /// Notify the event server that we are ready
    Ready {
        #[arg(long, env = "VMCONN_ADDR")]
        addr: String,
    },
    /// Run an event server on an ephemeral vsock port
    Listen,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vmconn::trace_init()?;

    let cli = Cli::parse();
    debug!("CLI is {:#?}", cli);
    let timeout = Duration::from_millis(cli.timeout_ms);

    match cli.command {
        Commands::Probe { addr } => {
            let (dial, address) = parse(&addr)?;
            let conn = transport::dial(&dial, timeout)
                .await
                .with_context(|| format!("Probing {address}"))?;
            println!("{}: connected ({})", address.scheme(), conn.scheme());
        }
        Commands::Ready { addr } => {
            let mut client = EventClient::connect_with_timeout(&addr, timeout).await?;
            client.ready().await?;
            client.close();
        }
        Commands::Listen => {
            let server = EventServer::start()?;
            println!("{}", server.port);
            loop {
                tokio::select! {
                    event = server.events.recv() => {
                        info!("Received event: {}", event?);
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted, shutting down");
                        break;
                    }
                }
            }
            server.shutdown();
        }
    }
    Ok(())
}
