//! Stdio sidecar that runs the autolink engine for a host editor.
//!
//! The host writes newline-delimited JSON-RPC 2.0 to stdin and reads
//! responses and notifications from stdout. Logs go to stderr.

mod rpc;
mod server;
mod vault_loader;

use anyhow::{Context, Result};
use autolink_core::{DocumentSet, Settings};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::server::Server;

#[derive(Parser, Debug)]
#[command(name = "autolink")]
#[command(about = "Turns typed document titles into wikilinks for a host editor")]
struct Args {
    /// Vault directory whose markdown files are linkable
    #[arg(long, env = "AUTOLINK_VAULT", value_name = "DIR")]
    vault: Option<PathBuf>,

    /// Settings file (TOML). Missing files fall back to defaults
    #[arg(long, env = "AUTOLINK_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "AUTOLINK_LOG", default_value = "info")]
    log_level: String,

    /// Override the configured debounce delay
    #[arg(long, env = "AUTOLINK_DEBOUNCE_MS")]
    debounce_ms: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    let documents = match &args.vault {
        Some(root) => vault_loader::load_vault(root)?,
        None => DocumentSet::new(),
    };

    let server =
        Server::new(documents, settings, args.debounce_ms).with_config_path(args.config);
    info!("autolink {} ready", env!("CARGO_PKG_VERSION"));
    serve(&server).await
}

/// Read requests from stdin until EOF or Ctrl-C, firing debounced
/// evaluations as their deadlines pass.
async fn serve(server: &Server) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let deadline = server.sessions().next_deadline();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    info!("stdin closed, shutting down");
                    break;
                };
                if let Some(response) = rpc::handle_line(server, &line) {
                    write_message(&mut stdout, &response).await?;
                }
            }
            _ = wait_until(deadline) => {
                server.sessions().fire_due(Instant::now());
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
        }

        for notification in server.sessions().drain_notifications() {
            write_message(&mut stdout, &notification).await?;
        }
    }
    info!("Served {} editor sessions", server.sessions().len());
    Ok(())
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn write_message<T: Serialize>(stdout: &mut Stdout, message: &T) -> Result<()> {
    let mut encoded = serde_json::to_vec(message)?;
    encoded.push(b'\n');
    stdout.write_all(&encoded).await?;
    stdout.flush().await?;
    Ok(())
}
