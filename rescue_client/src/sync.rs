//! Polling state machine.
//!
//! ```text
//! Idle -> Starting -> AwaitingState -> Reconciling -> Stepping -> AwaitingState ...
//!                                          |
//!                                          +-> Stopped(reason)
//! ```
//!
//! Each call to [`SyncLoop::advance`] performs exactly one transition, with at
//! most one network round-trip. Failures stop the loop; nothing is retried.

use std::fmt;
use std::time::Duration;

use rescue_shared::{
    config::VizConfig,
    error::FetchError,
    layout::LayoutPlanner,
    net::Transport,
    scene::{CounterDisplay, SceneBackend},
    snapshot::{decode_snapshot, DecodedSnapshot},
};
use tracing::{debug, info, warn};

use crate::reconcile::{DesiredScene, ReconcileReport, SceneReconciler};

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The simulation reported `running: false`.
    Finished,
    /// The configured step limit was reached.
    StepLimit,
    TransportFailed,
    DecodeFailed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::Finished => "finished",
            StopReason::StepLimit => "step limit reached",
            StopReason::TransportFailed => "transport failed",
            StopReason::DecodeFailed => "decode failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Starting,
    AwaitingState,
    Reconciling,
    Stepping,
    Stopped(StopReason),
}

impl SyncState {
    pub fn is_stopped(&self) -> bool {
        matches!(self, SyncState::Stopped(_))
    }
}

/// Drives a simulation session and mirrors each snapshot into the scene.
pub struct SyncLoop<T, B, D> {
    transport: T,
    backend: B,
    display: D,
    reconciler: SceneReconciler,
    planner: LayoutPlanner,
    rows: i32,
    cols: i32,
    poll_interval: Duration,
    max_steps: Option<u64>,

    state: SyncState,
    steps_requested: u64,
    snapshots_applied: u64,
    last: Option<DecodedSnapshot>,
    last_report: Option<ReconcileReport>,
}

impl<T, B, D> SyncLoop<T, B, D>
where
    T: Transport,
    B: SceneBackend,
    D: CounterDisplay,
{
    pub fn new(cfg: &VizConfig, transport: T, backend: B, display: D) -> Self {
        Self {
            transport,
            backend,
            display,
            reconciler: SceneReconciler::new(cfg.prefabs.clone(), cfg.policy),
            planner: LayoutPlanner::new(cfg.layout, cfg.rows, cfg.cols),
            rows: cfg.rows,
            cols: cfg.cols,
            poll_interval: cfg.poll_interval(),
            max_steps: cfg.max_steps,
            state: SyncState::Idle,
            steps_requested: 0,
            snapshots_applied: 0,
            last: None,
            last_report: None,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn steps_requested(&self) -> u64 {
        self.steps_requested
    }

    pub fn snapshots_applied(&self) -> u64 {
        self.snapshots_applied
    }

    /// Last snapshot that was reconciled into the scene.
    pub fn last_snapshot(&self) -> Option<&DecodedSnapshot> {
        self.last.as_ref()
    }

    pub fn last_report(&self) -> Option<ReconcileReport> {
        self.last_report
    }

    pub fn reconciler(&self) -> &SceneReconciler {
        &self.reconciler
    }

    pub fn planner(&self) -> &LayoutPlanner {
        &self.planner
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Runs until the loop stops.
    pub async fn run(&mut self) -> StopReason {
        loop {
            if let SyncState::Stopped(reason) = self.advance().await {
                info!(
                    %reason,
                    steps = self.steps_requested,
                    snapshots = self.snapshots_applied,
                    "Sync loop stopped"
                );
                return reason;
            }
        }
    }

    /// Performs one transition and returns the new state.
    pub async fn advance(&mut self) -> SyncState {
        self.state = match self.state {
            SyncState::Idle => SyncState::Starting,
            SyncState::Starting => self.start().await,
            SyncState::AwaitingState => self.fetch_and_apply().await,
            SyncState::Reconciling => self.after_reconcile(),
            SyncState::Stepping => self.step().await,
            stopped @ SyncState::Stopped(_) => stopped,
        };
        self.state
    }

    async fn start(&mut self) -> SyncState {
        match self.transport.start_session().await {
            Ok(ack) => {
                info!(ack = %ack.trim(), "Session started");
                SyncState::AwaitingState
            }
            Err(err) => {
                warn!(error = %err, "Start request failed");
                SyncState::Stopped(StopReason::TransportFailed)
            }
        }
    }

    async fn fetch_and_apply(&mut self) -> SyncState {
        let snapshot = match self.transport.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(FetchError::Transport(err)) => {
                warn!(error = %err, "State request failed");
                return SyncState::Stopped(StopReason::TransportFailed);
            }
            Err(FetchError::Decode(err)) => {
                warn!(error = %err, "Snapshot dropped");
                return SyncState::Stopped(StopReason::DecodeFailed);
            }
        };

        let decoded = decode_snapshot(&snapshot, self.rows, self.cols);
        let desired = DesiredScene::from_snapshot(&decoded, &self.planner);
        let report = self.reconciler.reconcile(&desired, &mut self.backend);
        self.display.update(decoded.counters);

        info!(
            step = decoded.step,
            running = decoded.running,
            created = report.created,
            destroyed = report.destroyed,
            warnings = decoded.warnings.len(),
            "Snapshot applied"
        );

        self.snapshots_applied += 1;
        self.last = Some(decoded);
        self.last_report = Some(report);
        SyncState::Reconciling
    }

    fn after_reconcile(&mut self) -> SyncState {
        let running = self.last.as_ref().is_some_and(|s| s.running);
        if !running {
            return SyncState::Stopped(StopReason::Finished);
        }
        if self.max_steps.is_some_and(|max| self.steps_requested >= max) {
            return SyncState::Stopped(StopReason::StepLimit);
        }
        SyncState::Stepping
    }

    async fn step(&mut self) -> SyncState {
        tokio::time::sleep(self.poll_interval).await;
        self.steps_requested += 1;
        match self.transport.advance_step().await {
            Ok(body) => {
                debug!(step = self.steps_requested, body = %body.trim(), "Step acknowledged");
                SyncState::AwaitingState
            }
            Err(err) => {
                warn!(error = %err, "Step request failed");
                SyncState::Stopped(StopReason::TransportFailed)
            }
        }
    }
}
