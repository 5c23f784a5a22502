//! Configuration system.
//!
//! Loads visualizer configuration from JSON strings (file IO left to app).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{layout::LayoutConfig, resources::PrefabCatalog};

/// How the reconciler brings the scene up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReconcilePolicy {
    /// Destroy and create only what changed.
    #[default]
    Diff,
    /// Tear down everything and recreate it on every snapshot.
    Rebuild,
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizConfig {
    /// Simulation server base url, e.g. `http://localhost:5000`.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Delay before each step request while the simulation runs.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Per-request timeout.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Inner grid rows.
    #[serde(default = "default_rows")]
    pub rows: i32,
    /// Inner grid columns.
    #[serde(default = "default_cols")]
    pub cols: i32,
    /// Stop after this many step requests.
    #[serde(default)]
    pub max_steps: Option<u64>,
    #[serde(default)]
    pub policy: ReconcilePolicy,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub prefabs: PrefabCatalog,
}

fn default_server_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_rows() -> i32 {
    6
}

fn default_cols() -> i32 {
    8
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            rows: default_rows(),
            cols: default_cols(),
            max_steps: None,
            policy: ReconcilePolicy::default(),
            layout: LayoutConfig::default(),
            prefabs: PrefabCatalog::default(),
        }
    }
}

impl VizConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Replay server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Listen address, e.g. `127.0.0.1:5000`.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// JSON file holding an array of snapshots. `None` plays the built-in demo.
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default = "default_rows")]
    pub rows: i32,
    #[serde(default = "default_cols")]
    pub cols: i32,
}

fn default_listen_addr() -> String {
    "127.0.0.1:5000".to_string()
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            script: None,
            rows: default_rows(),
            cols: default_cols(),
        }
    }
}

impl ReplayConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}
