//! Standalone visualizer client.
//!
//! Usage:
//!   cargo run -p rescue_client -- [--url http://localhost:5000] [--config viz.json]
//!                                 [--interval-ms 500] [--max-steps 100] [--rebuild]
//!
//! Starts a session on the simulation server, mirrors every snapshot into a
//! headless scene and steps the simulation until it finishes. Ctrl-C stops
//! the loop between requests.

use std::env;

use anyhow::Context;
use rescue_client::{
    backend::{LogDisplay, TracingBackend},
    sync::{StopReason, SyncLoop},
    transport::HttpTransport,
};
use rescue_shared::config::{ReconcilePolicy, VizConfig};
use tracing::{info, warn};

fn parse_args() -> anyhow::Result<VizConfig> {
    let args: Vec<String> = env::args().collect();

    // The config file is the base; other flags override it.
    let mut cfg = match args.iter().position(|a| a == "--config") {
        Some(i) if i + 1 < args.len() => {
            let path = &args[i + 1];
            let text =
                std::fs::read_to_string(path).with_context(|| format!("read config {path}"))?;
            VizConfig::from_json_str(&text).with_context(|| format!("parse config {path}"))?
        }
        _ => VizConfig::default(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--url" if i + 1 < args.len() => {
                cfg.server_url = args[i + 1].clone();
                i += 2;
            }
            "--interval-ms" if i + 1 < args.len() => {
                cfg.poll_interval_ms = args[i + 1].parse().context("--interval-ms")?;
                i += 2;
            }
            "--max-steps" if i + 1 < args.len() => {
                cfg.max_steps = Some(args[i + 1].parse().context("--max-steps")?);
                i += 2;
            }
            "--rebuild" => {
                cfg.policy = ReconcilePolicy::Rebuild;
                i += 1;
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
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args()?;
    info!(
        server = %cfg.server_url,
        rows = cfg.rows,
        cols = cfg.cols,
        policy = ?cfg.policy,
        "Starting visualizer"
    );

    let missing = cfg.prefabs.missing();
    if !missing.is_empty() {
        warn!(?missing, "Prefab catalog is incomplete");
    }

    let transport =
        HttpTransport::from_url(&cfg.server_url, cfg.request_timeout()).context("server url")?;
    let mut sync = SyncLoop::new(&cfg, transport, TracingBackend::new(), LogDisplay::default());

    let reason = tokio::select! {
        reason = sync.run() => reason,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            return Ok(());
        }
    };

    info!(
        %reason,
        live = sync.reconciler().registry().len(),
        steps = sync.steps_requested(),
        "Visualizer stopped"
    );
    match reason {
        StopReason::Finished | StopReason::StepLimit => Ok(()),
        StopReason::TransportFailed | StopReason::DecodeFailed => {
            anyhow::bail!("sync loop stopped: {reason}")
        }
    }
}
