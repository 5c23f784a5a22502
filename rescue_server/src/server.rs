//! Replay server.
//!
//! Serves a fixed sequence of snapshots on the routes the simulation server
//! exposes, so the visualizer can run without the simulation. It supports:
//! - `POST /start_game`: (re)starts the session at the first snapshot
//! - `POST /step`: advances one snapshot, holding at the last one
//! - `GET /game_state`: the current snapshot
//!
//! Connections are handled one at a time on a single task, one request per
//! connection.

use std::{net::SocketAddr, path::Path};

use anyhow::Context;
use rescue_shared::{
    config::ReplayConfig,
    net::{
        read_request, write_response, HttpRequest, Method, START_PATH, STATE_PATH, STEP_PATH,
    },
    snapshot::GameSnapshot,
};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::demo::demo_script;

/// Loads a script file: a JSON array of snapshots.
pub fn load_script(path: impl AsRef<Path>) -> anyhow::Result<Vec<GameSnapshot>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read script {}", path.display()))?;
    let script: Vec<GameSnapshot> = serde_json::from_str(&text)
        .with_context(|| format!("parse script {}", path.display()))?;
    normalize_script(script)
}

/// Rejects empty scripts and marks the last snapshot as finished.
pub fn normalize_script(mut script: Vec<GameSnapshot>) -> anyhow::Result<Vec<GameSnapshot>> {
    let last = script.last_mut().context("script has no snapshots")?;
    last.running = false;
    Ok(script)
}

/// Replay server.
pub struct ReplayServer {
    listener: TcpListener,
    script: Vec<GameSnapshot>,
    /// Index of the current snapshot; `None` until a session is started.
    cursor: Option<usize>,
    requests: u64,
}

impl ReplayServer {
    /// Binds `cfg.listen_addr` and loads the configured script, or the demo.
    pub async fn bind(cfg: &ReplayConfig) -> anyhow::Result<Self> {
        let script = match &cfg.script {
            Some(path) => load_script(path)?,
            None => demo_script(cfg.rows, cfg.cols),
        };
        let listener = TcpListener::bind(&cfg.listen_addr)
            .await
            .with_context(|| format!("bind {}", cfg.listen_addr))?;
        Self::with_listener(listener, script)
    }

    pub fn with_listener(
        listener: TcpListener,
        script: Vec<GameSnapshot>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            listener,
            script: normalize_script(script)?,
            cursor: None,
            requests: 0,
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Base url clients should use.
    pub fn url(&self) -> anyhow::Result<String> {
        Ok(format!("http://{}", self.local_addr()?))
    }

    pub fn script_len(&self) -> usize {
        self.script.len()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Routes one request to a status and JSON body.
    pub fn handle(&mut self, req: &HttpRequest) -> (u16, Vec<u8>) {
        let path = req.path.split('?').next().unwrap_or_default();
        let (status, body) = match (req.method, path) {
            (Method::Post, START_PATH) => {
                self.cursor = Some(0);
                info!(snapshots = self.script.len(), "Session started");
                (200, json!({"message": "Game started successfully"}))
            }
            (Method::Post, STEP_PATH) => match self.cursor {
                Some(i) => {
                    let next = (i + 1).min(self.script.len() - 1);
                    self.cursor = Some(next);
                    debug!(step = next, "Advanced");
                    (200, json!({"message": "Simulation advanced by one step"}))
                }
                None => no_game(),
            },
            (Method::Get, STATE_PATH) => match self.cursor.and_then(|i| self.script.get(i)) {
                Some(snapshot) => match serde_json::to_value(snapshot) {
                    Ok(value) => (200, value),
                    Err(err) => (
                        500,
                        json!({"error": format!("Failed to retrieve game state: {err}")}),
                    ),
                },
                None => no_game(),
            },
            (_, START_PATH | STEP_PATH | STATE_PATH) => {
                (405, json!({"error": "Method not allowed"}))
            }
            _ => (404, json!({"error": "Not found"})),
        };
        (status, body.to_string().into_bytes())
    }

    /// Accepts one connection and answers its request.
    pub async fn serve_one(&mut self) -> anyhow::Result<()> {
        let (mut stream, peer) = self.listener.accept().await.context("accept")?;
        let req = read_request(&mut stream)
            .await
            .with_context(|| format!("read request from {peer}"))?;
        self.requests += 1;
        let (status, body) = self.handle(&req);
        debug!(%peer, method = req.method.as_str(), path = %req.path, status, "Request");
        write_response(&mut stream, status, &body)
            .await
            .with_context(|| format!("write response to {peer}"))
    }

    /// Serves forever. Per-connection failures are logged and skipped.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            if let Err(err) = self.serve_one().await {
                warn!(error = %format!("{err:#}"), "Connection failed");
            }
        }
    }
}

fn no_game() -> (u16, serde_json::Value) {
    (400, json!({"error": "No game in progress"}))
}

/// Helper for tests: bind to an ephemeral port.
pub async fn bind_ephemeral(script: Vec<GameSnapshot>) -> anyhow::Result<(ReplayServer, String)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let server = ReplayServer::with_listener(listener, script)?;
    let url = server.url()?;
    Ok((server, url))
}
