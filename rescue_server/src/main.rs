//! Standalone replay server binary.
//!
//! Usage:
//!   cargo run -p rescue_server -- [--addr 127.0.0.1:5000] [--script run.json] [--config replay.json]
//!
//! Plays back a recorded session (or the built-in demo) on the simulation
//! server's routes until interrupted.

use std::env;

use anyhow::Context;
use rescue_server::server::ReplayServer;
use rescue_shared::config::ReplayConfig;
use tracing::info;

fn parse_args() -> anyhow::Result<ReplayConfig> {
    let args: Vec<String> = env::args().collect();

    let mut cfg = match args.iter().position(|a| a == "--config") {
        Some(i) if i + 1 < args.len() => {
            let path = &args[i + 1];
            let text =
                std::fs::read_to_string(path).with_context(|| format!("read config {path}"))?;
            ReplayConfig::from_json_str(&text).with_context(|| format!("parse config {path}"))?
        }
        _ => ReplayConfig::default(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                cfg.listen_addr = args[i + 1].clone();
                i += 2;
            }
            "--script" if i + 1 < args.len() => {
                cfg.script = Some(args[i + 1].clone());
                i += 2;
            }
            _ => i += 1,
        }
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args()?;
    info!(
        addr = %cfg.listen_addr,
        script = cfg.script.as_deref().unwrap_or("<demo>"),
        "Starting replay server"
    );

    let mut server = ReplayServer::bind(&cfg).await.context("create server")?;
    let local = server.local_addr()?;
    info!(%local, snapshots = server.script_len(), "Server listening");

    tokio::select! {
        res = server.run() => res,
        _ = tokio::signal::ctrl_c() => {
            info!(requests = server.requests(), "Server shutting down");
            Ok(())
        }
    }
}
