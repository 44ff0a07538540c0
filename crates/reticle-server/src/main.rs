// SPDX-License-Identifier: Apache-2.0
//! reticled: newline-delimited JSON-RPC server for layout queries.

use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reticle_server::{Server, ServerConfig};

/// Layout query daemon.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:7878")]
    listen: SocketAddr,

    /// Close a connection when one request line exceeds this many bytes.
    #[arg(long, default_value_t = 1024 * 1024)]
    max_line_bytes: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let args = Args::parse();
    let server = Server::bind(&ServerConfig {
        listen: args.listen,
        max_line_bytes: args.max_line_bytes,
    })
    .await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received, shutting down");
        }
    }
    Ok(())
}
