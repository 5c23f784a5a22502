//! Shared helpers for the socket-level tests.

use rescue_client::{
    reconcile::SceneKey,
    sync::{StopReason, SyncLoop},
    transport::HttpTransport,
};
use rescue_server::ReplayServer;
use rescue_shared::{
    config::VizConfig,
    scene::{LastCounters, RecordingBackend},
    snapshot::GameSnapshot,
};
use tokio::task::JoinHandle;

pub type TestLoop = SyncLoop<HttpTransport, RecordingBackend, LastCounters>;

/// Installs a test-writer subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

/// Serves exactly `requests` requests in the background, then hands the
/// server back.
pub fn spawn_server(
    mut server: ReplayServer,
    requests: usize,
) -> JoinHandle<anyhow::Result<ReplayServer>> {
    tokio::spawn(async move {
        for _ in 0..requests {
            server.serve_one().await?;
        }
        Ok(server)
    })
}

/// Requests a full session over a script of `len` snapshots takes: start,
/// one state fetch per snapshot and one step between each pair.
pub fn session_requests(len: usize) -> usize {
    1 + len + len.saturating_sub(1)
}

/// Client config pointed at `url`, no poll delay.
pub fn viz_config(url: &str) -> VizConfig {
    VizConfig {
        server_url: url.to_string(),
        poll_interval_ms: 0,
        request_timeout_ms: 2_000,
        ..Default::default()
    }
}

/// A sync loop over HTTP into a recording backend.
pub fn http_loop(cfg: &VizConfig) -> anyhow::Result<TestLoop> {
    let transport = HttpTransport::from_url(&cfg.server_url, cfg.request_timeout())?;
    Ok(SyncLoop::new(
        cfg,
        transport,
        RecordingBackend::new(),
        LastCounters::default(),
    ))
}

/// Runs `script` through a fresh replay server and client.
pub async fn run_script(
    script: Vec<GameSnapshot>,
    cfg: impl FnOnce(&str) -> VizConfig,
) -> anyhow::Result<(StopReason, TestLoop, ReplayServer)> {
    let len = script.len();
    let (server, url) = rescue_server::server::bind_ephemeral(script).await?;
    let handle = spawn_server(server, session_requests(len));
    let mut sync = http_loop(&cfg(&url))?;
    let reason = sync.run().await;
    let server = handle.await??;
    Ok((reason, sync, server))
}

/// Snapshot with the given fire cells and one wall/door pair at `(1, 1)`.
pub fn snapshot(step: u64, running: bool, fire: &[[i32; 2]]) -> GameSnapshot {
    let mut s = GameSnapshot {
        step,
        running,
        fire_locations: fire.to_vec(),
        ..Default::default()
    };
    s.grid_structure.insert(
        "(1, 1)".to_string(),
        vec![serde_json::json!([[2, 1], 5]), serde_json::json!([[1, 2], 2])],
    );
    s
}

/// Registry keys of a finished loop.
pub fn registry_keys(sync: &TestLoop) -> Vec<SceneKey> {
    sync.reconciler().registry().keys().copied().collect()
}
