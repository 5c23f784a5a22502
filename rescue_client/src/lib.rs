//! `rescue_client`
//!
//! Client-side systems:
//! - Scene reconciliation (sole owner of the scene registry)
//! - Polling state machine against the simulation server
//! - HTTP transport
//! - Log-backed scene backend and counter display for headless runs

pub mod backend;
pub mod reconcile;
pub mod sync;
pub mod transport;

pub use reconcile::SceneReconciler;
pub use sync::{StopReason, SyncLoop, SyncState};
pub use transport::HttpTransport;
