//! `rescue_server`
//!
//! Replay server for the visualizer:
//! - Serves a scripted snapshot sequence over the simulation's HTTP routes
//! - Built-in demo session when no script is given
//!
//! No game rules run here; snapshots are played back as recorded.

pub mod demo;
pub mod server;

pub use server::ReplayServer;
